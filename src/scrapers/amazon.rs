//! Amazon India search results

use scraper::Html;
use tracing::debug;
use url::Url;

use super::{absolutize, first_attr, first_text, first_text_where, select_cards, SearchQuery, SiteScraper, Source};
use crate::extract::{extract_price, format_rupees};
use crate::models::Listing;

const BASE: &str = "https://www.amazon.in";

const CARD_SELECTORS: &[&str] = &[
    "div[data-component-type='s-search-result']",
    "div.s-result-item[data-asin]",
];
const TITLE_SELECTORS: &[&str] = &["h2 a span", "h2 span", "h2"];
const PRICE_SELECTORS: &[&str] = &[".a-price .a-offscreen", ".a-price-whole", ".a-color-price"];
const LINK_SELECTORS: &[&str] = &["h2 a", "a.a-link-normal.s-no-outline", "a.a-link-normal"];

pub struct AmazonScraper;

impl SiteScraper for AmazonScraper {
    fn source(&self) -> Source {
        Source::Amazon
    }

    fn max_results(&self) -> usize {
        8
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        Url::parse_with_params(&format!("{}/s", BASE), &[("k", query.term.as_str())])
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/s", BASE))
    }

    fn parse(&self, html: &str, _query: &SearchQuery) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let mut listings = Vec::new();

        for (idx, card) in select_cards(&document, CARD_SELECTORS).into_iter().enumerate() {
            let Some(title) = first_text(card, TITLE_SELECTORS) else {
                debug!(card = idx, "Skipping card without title");
                continue;
            };

            let price = first_text_where(card, PRICE_SELECTORS, |t| t.chars().any(|c| c.is_ascii_digit()))
                .map(|t| extract_price(&t))
                .filter(|p| p.is_finite() && *p > 0.0);
            let Some(price) = price else {
                debug!(card = idx, title = %title, "Skipping card without price");
                continue;
            };

            let Some(link) = first_attr(card, LINK_SELECTORS, "href").and_then(|h| absolutize(BASE, &h)) else {
                debug!(card = idx, "Skipping card without link");
                continue;
            };

            listings.push(Listing {
                source: Source::Amazon,
                title,
                company: Some("Amazon".to_string()),
                location: None,
                price_text: format_rupees(price),
                price,
                link,
                snippet: None,
                duration: None,
            });
        }

        listings
    }
}
