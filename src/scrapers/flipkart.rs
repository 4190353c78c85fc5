//! Flipkart search results
//!
//! Flipkart ships obfuscated class names that rotate every few months; the
//! selector lists carry both the grid and the list layouts seen so far.

use scraper::Html;
use tracing::debug;
use url::Url;

use super::{absolutize, first_attr, first_text, first_text_where, select_cards, SearchQuery, SiteScraper, Source};
use crate::extract::{extract_price, format_rupees};
use crate::models::Listing;

const BASE: &str = "https://www.flipkart.com";

const CARD_SELECTORS: &[&str] = &["div[data-id]", "div._1AtVbE", "div.cPHDOP"];
const TITLE_SELECTORS: &[&str] = &["div.KzDlHZ", "a.wjcEIp", "div._4rR01T", "a.s1Q9rs", "a.IRpwTa", "a[title]"];
const PRICE_SELECTORS: &[&str] = &["div.Nx9bqj", "div._30jeq3"];
const LINK_SELECTORS: &[&str] = &["a.CGtC98", "a._1fQZEK", "a[href*='/p/']", "a"];

pub struct FlipkartScraper;

impl SiteScraper for FlipkartScraper {
    fn source(&self) -> Source {
        Source::Flipkart
    }

    fn max_results(&self) -> usize {
        8
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        Url::parse_with_params(&format!("{}/search", BASE), &[("q", query.term.as_str())])
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/search", BASE))
    }

    fn parse(&self, html: &str, _query: &SearchQuery) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let mut listings = Vec::new();

        for (idx, card) in select_cards(&document, CARD_SELECTORS).into_iter().enumerate() {
            // Grid cards keep the full name in the title attribute
            let title = first_attr(card, &["a[title]"], "title").or_else(|| first_text(card, TITLE_SELECTORS));
            let Some(title) = title else {
                debug!(card = idx, "Skipping card without title");
                continue;
            };

            let price = first_text_where(card, PRICE_SELECTORS, |t| t.chars().any(|c| c.is_ascii_digit()))
                .map(|t| extract_price(&t))
                .filter(|p| p.is_finite() && *p > 0.0);
            let Some(price) = price else {
                debug!(card = idx, "Skipping card without price");
                continue;
            };

            let Some(link) = first_attr(card, LINK_SELECTORS, "href").and_then(|h| absolutize(BASE, &h)) else {
                debug!(card = idx, "Skipping card without link");
                continue;
            };

            listings.push(Listing {
                source: Source::Flipkart,
                title,
                company: Some("Flipkart".to_string()),
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
