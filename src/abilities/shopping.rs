//! AI Shopping Assistant
//!
//! Collects product listings from SerpAPI (when a key is configured) and the
//! Google Shopping, Amazon and Flipkart scrapers, then ranks them by price.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{info, warn};

use super::{AbilityContext, AbilityOutput, AbilityResult};
use crate::extract::{squash_whitespace, truncate_chars};
use crate::models::Listing;
use crate::scrapers::{
    scrape, AmazonScraper, FlipkartScraper, GoogleShoppingScraper, SearchQuery, SiteScraper,
};
use crate::types::AppResult;

const TOP_N: usize = 3;

static COMMAND_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(find|search|buy|order|get|purchase|best|top)\b").expect("valid command regex")
});

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingReport {
    pub query: String,
    pub best_deal: Listing,
    pub top_products: Vec<Listing>,
    pub total_products: usize,
}

/// Lowercase the task and drop shopping verbs: `"Buy the best mouse"` → `"the mouse"`
pub fn clean_query(task: &str) -> String {
    squash_whitespace(&COMMAND_WORDS.replace_all(&task.to_lowercase(), " "))
}

/// Keep listings with a usable price, cheapest first. Equal prices keep
/// their source order.
pub fn rank_products(mut listings: Vec<Listing>) -> Vec<Listing> {
    listings.retain(|l| l.price.is_finite() && l.price > 0.0);
    listings.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));
    listings
}

pub async fn run(task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let query = clean_query(task);
    if query.is_empty() {
        return Ok(AbilityResult::error(
            "Please tell me what to shop for. Example: 'buy wireless earbuds under 2000'",
        ));
    }
    info!(query = %query, "Shopping search");

    let mut listings = Vec::new();

    if let Some(serpapi) = &ctx.services.serpapi {
        ctx.progress.update("Searching Google Shopping (SerpAPI)...");
        match serpapi.search_shopping(&query).await {
            Ok(found) => listings.extend(found),
            Err(e) => warn!(error = %e, "SerpAPI shopping search failed, continuing with scrapers"),
        }
    }

    let search = SearchQuery::new(query.clone());
    let scrapers: [&dyn SiteScraper; 3] = [&GoogleShoppingScraper, &AmazonScraper, &FlipkartScraper];
    for scraper in scrapers {
        ctx.progress.update(format!("Checking {}...", scraper.source()));
        listings.extend(scrape(ctx.services.fetcher.as_ref(), scraper, &search).await);
    }

    let ranked = rank_products(listings);
    let Some(best_deal) = ranked.first().cloned() else {
        return Ok(AbilityResult::error(format!(
            "No products found for '{}'. Try a more specific product name.",
            query
        )));
    };

    let message = format!(
        "Best deal: {} for {} on {}",
        truncate_chars(&best_deal.title, 50),
        best_deal.price_text,
        best_deal.source
    );
    info!(total = ranked.len(), best_price = best_deal.price, "Shopping completed");

    Ok(AbilityResult::success(message).with_output(AbilityOutput::Shopping(ShoppingReport {
        query,
        total_products: ranked.len(),
        top_products: ranked.into_iter().take(TOP_N).collect(),
        best_deal,
    })))
}
