//! Google web search and Google News pages

use scraper::Html;
use url::Url;

use super::{element_text, select_cards};

pub const GOOGLE_HOME: &str = "https://www.google.com";
pub const GOOGLE_NEWS_URL: &str = "https://news.google.com/";

const SNIPPET_SELECTORS: &[&str] = &[".VwiC3b", "div[data-sncf]", ".IsZvec"];
const HEADLINE_SELECTORS: &[&str] = &["h3", "a.gPFEn", "a.JtKRv", "h4"];

pub fn search_url(query: &str) -> String {
    Url::parse_with_params(&format!("{}/search", GOOGLE_HOME), &[("q", query), ("hl", "en")])
        .map(|u| u.to_string())
        .unwrap_or_else(|_| GOOGLE_HOME.to_string())
}

fn texts(html: &str, selectors: &[&str], max: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    select_cards(&document, selectors)
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .take(max)
        .collect()
}

/// Result description snippets from a search results page
pub fn parse_result_snippets(html: &str, max: usize) -> Vec<String> {
    texts(html, SNIPPET_SELECTORS, max)
}

/// Headline texts from the Google News front page
pub fn parse_headlines(html: &str, max: usize) -> Vec<String> {
    texts(html, HEADLINE_SELECTORS, max)
}
