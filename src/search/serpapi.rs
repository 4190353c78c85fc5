//! SerpAPI Client
//!
//! Product search through SerpAPI's Google Shopping engine. This is the most
//! reliable shopping source when a key is configured: SerpAPI handles the
//! blocking and returns structured JSON, so no selectors are involved.

use serde_json::Value;
use serpapi_search_rust::serp_api_search::SerpApiSearch;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::extract::{extract_price, format_rupees};
use crate::models::Listing;
use crate::scrapers::google_shopping::normalize_merchant;
use crate::scrapers::Source;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("No results found for query")]
    NoResults,
}

/// SerpAPI client for product search
pub struct SerpApiClient {
    api_key: String,
    max_results: usize,
}

impl SerpApiClient {
    /// `None` when no key is configured
    pub fn from_config(config: &SearchConfig) -> Option<Self> {
        let key = config.serpapi_key.as_ref()?;
        Some(Self {
            api_key: key.clone(),
            max_results: config.max_results,
        })
    }

    /// Search Google Shopping (India) for `query`
    pub async fn search_shopping(&self, query: &str) -> Result<Vec<Listing>, SearchError> {
        info!(query = %query, "Searching Google Shopping via SerpAPI");

        let mut params = HashMap::<String, String>::new();
        params.insert("engine".to_string(), "google_shopping".to_string());
        params.insert("q".to_string(), query.to_string());
        params.insert("hl".to_string(), "en".to_string());
        params.insert("gl".to_string(), "in".to_string());
        params.insert("num".to_string(), self.max_results.to_string());

        let search = SerpApiSearch::google(params, self.api_key.clone());

        let results = search
            .json()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        debug!("Raw shopping response received");

        let listings = parse_shopping_results(&results, self.max_results)?;
        info!(count = listings.len(), "SerpAPI shopping search completed");
        Ok(listings)
    }
}

/// Convert a `google_shopping` response into listings. Entries without a
/// title, link or positive price are skipped.
pub fn parse_shopping_results(results: &Value, max: usize) -> Result<Vec<Listing>, SearchError> {
    if let Some(error) = results.get("error").and_then(|v| v.as_str()) {
        return Err(SearchError::RequestFailed(error.to_string()));
    }

    let shopping_results = results
        .get("shopping_results")
        .ok_or(SearchError::NoResults)?;

    let results_array = shopping_results
        .as_array()
        .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

    let mut listings = Vec::new();
    for result in results_array.iter() {
        if listings.len() >= max {
            break;
        }

        let Some(title) = result.get("title").and_then(|v| v.as_str()) else {
            continue;
        };

        let link = result
            .get("product_link")
            .or_else(|| result.get("link"))
            .and_then(|v| v.as_str());
        let Some(link) = link else {
            continue;
        };

        let price = result
            .get("extracted_price")
            .and_then(|v| v.as_f64())
            .or_else(|| {
                result
                    .get("price")
                    .and_then(|v| v.as_str())
                    .map(extract_price)
            })
            .filter(|p| p.is_finite() && *p > 0.0);
        let Some(price) = price else {
            continue;
        };

        let merchant = result
            .get("source")
            .and_then(|v| v.as_str())
            .map(normalize_merchant)
            .unwrap_or_else(|| "Online Store".to_string());

        listings.push(Listing {
            source: Source::GoogleShopping,
            title: title.trim().to_string(),
            company: Some(merchant),
            location: None,
            price_text: format_rupees(price),
            price,
            link: link.to_string(),
            snippet: None,
            duration: None,
        });
    }

    Ok(listings)
}
