//! Site Scrapers
//!
//! Every target site is a [`SiteScraper`]: it knows how to build a search URL
//! and how to parse a results page into [`Listing`]s. How the page is fetched
//! (plain HTTP, scraping proxy, headless browser) is a separate concern behind
//! [`PageFetcher`], chosen by configuration.
//!
//! Parsing is per card: a card missing a required field is skipped, never the
//! whole page. A page with no cards is an empty result, not an error. Fetch
//! errors are logged and degrade to an empty result in [`scrape`].

pub mod fetch;
pub mod amazon;
pub mod flipkart;
pub mod google;
pub mod google_shopping;
pub mod indeed;
pub mod internshala;
pub mod linkedin;
pub mod naukri;

pub use fetch::{build_fetcher, DirectFetcher, PageFetcher, ProxyFetcher, RenderedFetcher};
pub use amazon::AmazonScraper;
pub use flipkart::FlipkartScraper;
pub use google_shopping::GoogleShoppingScraper;
pub use indeed::IndeedScraper;
pub use internshala::InternshalaScraper;
pub use linkedin::LinkedInScraper;
pub use naukri::NaukriScraper;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::{squash_whitespace, truncate_chars};
use crate::models::Listing;

/// Where a listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    Amazon,
    Flipkart,
    #[serde(rename = "Google Shopping")]
    GoogleShopping,
    Indeed,
    Naukri,
    LinkedIn,
    Internshala,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Source::Amazon => "Amazon",
            Source::Flipkart => "Flipkart",
            Source::GoogleShopping => "Google Shopping",
            Source::Indeed => "Indeed",
            Source::Naukri => "Naukri",
            Source::LinkedIn => "LinkedIn",
            Source::Internshala => "Internshala",
        };
        f.write_str(name)
    }
}

/// What to search for, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub location: Option<String>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// `"python developer"` → `"python-developer"`
    pub fn slug(text: &str) -> String {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join("-")
    }
}

pub trait SiteScraper: Send + Sync {
    fn source(&self) -> Source;

    /// Maximum listings returned from one page
    fn max_results(&self) -> usize;

    fn search_url(&self, query: &SearchQuery) -> String;

    /// Parse a results page. Must not fail: unparseable cards are skipped.
    fn parse(&self, html: &str, query: &SearchQuery) -> Vec<Listing>;
}

/// Fetch and parse one source. Network and parse failures are logged and
/// yield an empty list.
pub async fn scrape(
    fetcher: &dyn PageFetcher,
    scraper: &dyn SiteScraper,
    query: &SearchQuery,
) -> Vec<Listing> {
    let url = scraper.search_url(query);
    info!(source = %scraper.source(), url = %url, "Scraping search results");

    let html = match fetcher.fetch(&url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(source = %scraper.source(), error = %e, "Fetch failed, no results from source");
            return Vec::new();
        }
    };

    let mut listings = scraper.parse(&html, query);
    listings.truncate(scraper.max_results());
    info!(source = %scraper.source(), count = listings.len(), "Parsed listings");
    listings
}

pub(crate) fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = css, error = ?e, "Invalid CSS selector");
            None
        }
    }
}

/// Cards from the first selector that matches anything. Trying selectors in
/// order (instead of a selector group) avoids double-counting nested cards.
pub(crate) fn select_cards<'a>(document: &'a Html, selectors: &[&str]) -> Vec<ElementRef<'a>> {
    for css in selectors {
        if let Some(selector) = parse_selector(css) {
            let cards: Vec<_> = document.select(&selector).collect();
            if !cards.is_empty() {
                debug!(selector = css, count = cards.len(), "Matched result cards");
                return cards;
            }
        }
    }
    Vec::new()
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    squash_whitespace(&element.text().collect::<String>())
}

/// First non-empty text under `card` that satisfies `accept`
pub(crate) fn first_text_where(
    card: ElementRef<'_>,
    selectors: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    selectors
        .iter()
        .filter_map(|css| parse_selector(css))
        .flat_map(|selector| card.select(&selector).map(element_text).collect::<Vec<_>>())
        .find(|text| !text.is_empty() && accept(text))
}

pub(crate) fn first_text(card: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    first_text_where(card, selectors, |_| true)
}

pub(crate) fn first_attr(card: ElementRef<'_>, selectors: &[&str], attr: &str) -> Option<String> {
    selectors
        .iter()
        .filter_map(|css| parse_selector(css))
        .flat_map(|selector| {
            card.select(&selector)
                .filter_map(|el| el.value().attr(attr).map(str::to_string))
                .collect::<Vec<_>>()
        })
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Resolve `href` against `base`; `None` for javascript/fragment links
pub(crate) fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .ok()
}

pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    truncate_chars(text, max_chars).trim().to_string()
}
