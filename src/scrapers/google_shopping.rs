//! Google Shopping results (`tbm=shop`)

use scraper::Html;
use tracing::debug;
use url::Url;

use super::{absolutize, first_attr, first_text_where, select_cards, SearchQuery, SiteScraper, Source};
use crate::extract::{extract_price, format_rupees};
use crate::models::Listing;

const BASE: &str = "https://www.google.com";

const CARD_SELECTORS: &[&str] = &["div.sh-dgr__grid-result", "div[data-docid]", ".sh-dlr__list-result"];
const TITLE_SELECTORS: &[&str] = &["h3", "h4", ".tAxDx", "span[role='heading']", ".Xjkr3b", "a"];
const PRICE_SELECTORS: &[&str] = &["span.a8Pemb", "div.a8Pemb", ".T14wmb", "span[aria-label*='₹']", "b"];
const MERCHANT_SELECTORS: &[&str] = &["div.aULzUe", ".IuHnof", ".E5ocAb"];

/// Titles shorter than this are icons or badges, not product names
const MIN_TITLE_CHARS: usize = 5;

pub struct GoogleShoppingScraper;

/// Google wraps outbound links as `/url?url=<target>&...`
pub(crate) fn unwrap_redirect(href: &str) -> Option<String> {
    if !href.starts_with("/url?") {
        return None;
    }
    let parsed = Url::parse(&format!("{}{}", BASE, href)).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "url" || k == "q")
        .map(|(_, v)| v.into_owned())
}

/// Merchant label, collapsing marketplace variants ("Amazon.in - Seller") to the marketplace
pub(crate) fn normalize_merchant(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.contains("amazon") {
        "Amazon".to_string()
    } else if lower.contains("flipkart") {
        "Flipkart".to_string()
    } else {
        raw.trim().to_string()
    }
}

impl SiteScraper for GoogleShoppingScraper {
    fn source(&self) -> Source {
        Source::GoogleShopping
    }

    fn max_results(&self) -> usize {
        10
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        Url::parse_with_params(
            &format!("{}/search", BASE),
            &[("q", query.term.as_str()), ("tbm", "shop"), ("hl", "en-IN"), ("gl", "IN")],
        )
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/search?tbm=shop", BASE))
    }

    fn parse(&self, html: &str, _query: &SearchQuery) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let mut listings = Vec::new();

        for (idx, card) in select_cards(&document, CARD_SELECTORS).into_iter().enumerate() {
            let Some(title) = first_text_where(card, TITLE_SELECTORS, |t| t.chars().count() >= MIN_TITLE_CHARS)
            else {
                debug!(card = idx, "Skipping card without title");
                continue;
            };

            let price_text = first_text_where(card, PRICE_SELECTORS, |t| t.chars().any(|c| c.is_ascii_digit()));
            let price = price_text.as_deref().map(extract_price).unwrap_or(f64::INFINITY);
            if !price.is_finite() || price == 0.0 {
                debug!(card = idx, "Skipping card without price");
                continue;
            }

            let Some(href) = first_attr(card, &["a"], "href") else {
                debug!(card = idx, "Skipping card without link");
                continue;
            };
            let Some(link) = unwrap_redirect(&href).or_else(|| absolutize(BASE, &href)) else {
                continue;
            };

            let merchant = first_text_where(card, MERCHANT_SELECTORS, |_| true)
                .map(|m| normalize_merchant(&m))
                .unwrap_or_else(|| "Online Store".to_string());

            listings.push(Listing {
                source: Source::GoogleShopping,
                title,
                company: Some(merchant),
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

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <html><body>
      <div class="sh-dgr__grid-result">
        <h3>Sony WH-1000XM5 Wireless Headphones</h3>
        <span class="a8Pemb">₹26,990</span>
        <div class="aULzUe">Amazon.in - Appario</div>
        <a href="/url?url=https://www.amazon.in/dp/B0TEST&amp;sa=U">View</a>
      </div>
      <div class="sh-dgr__grid-result">
        <h3>Boat Rockerz 450</h3>
        <span class="a8Pemb">₹1,499</span>
        <div class="aULzUe">Croma</div>
        <a href="/shopping/product/123">View</a>
      </div>
      <div class="sh-dgr__grid-result">
        <h3>Price on request</h3>
        <span class="a8Pemb">Call store</span>
        <a href="/shopping/product/999">View</a>
      </div>
      <div class="sh-dgr__grid-result">
        <h3>JBL</h3>
        <span class="a8Pemb">₹999</span>
        <a href="/shopping/product/5">x</a>
      </div>
    </body></html>"#;

    #[test]
    fn test_parse_google_shopping_cards() {
        let listings = GoogleShoppingScraper.parse(FIXTURE, &SearchQuery::new("headphones"));
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].title, "Sony WH-1000XM5 Wireless Headphones");
        assert_eq!(listings[0].price, 26990.0);
        assert_eq!(listings[0].price_text, "₹26,990");
        assert_eq!(listings[0].company.as_deref(), Some("Amazon"));
        assert_eq!(listings[0].link, "https://www.amazon.in/dp/B0TEST");

        assert_eq!(listings[1].company.as_deref(), Some("Croma"));
        assert_eq!(listings[1].link, "https://www.google.com/shopping/product/123");
    }

    #[test]
    fn test_empty_page_is_empty_result() {
        assert!(GoogleShoppingScraper
            .parse("<html><body>captcha</body></html>", &SearchQuery::new("x"))
            .is_empty());
    }

    #[test]
    fn test_search_url_encodes_query() {
        let url = GoogleShoppingScraper.search_url(&SearchQuery::new("usb c cable"));
        assert!(url.starts_with("https://www.google.com/search?q=usb+c+cable&tbm=shop"));
    }

    #[test]
    fn test_normalize_merchant() {
        assert_eq!(normalize_merchant("Flipkart.com"), "Flipkart");
        assert_eq!(normalize_merchant(" Reliance Digital "), "Reliance Digital");
    }
}
