//! Internshala internship listings

use scraper::Html;
use tracing::debug;

use super::{absolutize, first_attr, first_text, select_cards, snippet, SearchQuery, SiteScraper, Source};
use crate::extract::{extract_price, UNPARSEABLE};
use crate::models::Listing;

const BASE: &str = "https://internshala.com";

pub const UNPAID: &str = "Unpaid";

const CARD_SELECTORS: &[&str] = &[".individual_internship", ".internship_meta"];
const TITLE_SELECTORS: &[&str] = &[".profile", "h3", "h4", ".job-internship-name"];
const COMPANY_SELECTORS: &[&str] = &[".company-name", ".company_name", ".link_display_like_text"];
const LOCATION_SELECTORS: &[&str] = &[".location_link", ".locations", ".location"];
const STIPEND_SELECTORS: &[&str] = &[".stipend", ".stipend-text"];
const DURATION_SELECTORS: &[&str] = &[".duration", ".duration-text"];
const DETAIL_SELECTORS: &[&str] = &[".internship_other_details_container", ".other_detail_item_link"];

pub struct InternshalaScraper;

impl SiteScraper for InternshalaScraper {
    fn source(&self) -> Source {
        Source::Internshala
    }

    fn max_results(&self) -> usize {
        10
    }

    /// `"web development"` → `/internships/web-development-internship`
    fn search_url(&self, query: &SearchQuery) -> String {
        format!("{}/internships/{}-internship", BASE, SearchQuery::slug(&query.term))
    }

    fn parse(&self, html: &str, _query: &SearchQuery) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let mut listings = Vec::new();

        for (idx, card) in select_cards(&document, CARD_SELECTORS).into_iter().enumerate() {
            let Some(title) = first_text(card, TITLE_SELECTORS) else {
                debug!(card = idx, "Skipping internship without title");
                continue;
            };
            let Some(link) = first_attr(card, &["a[href*='detail']"], "href").and_then(|h| absolutize(BASE, &h))
            else {
                debug!(card = idx, title = %title, "Skipping internship without link");
                continue;
            };

            let stipend = first_text(card, STIPEND_SELECTORS).unwrap_or_else(|| UNPAID.to_string());
            let amount = extract_price(&stipend);

            listings.push(Listing {
                source: Source::Internshala,
                title,
                company: first_text(card, COMPANY_SELECTORS),
                location: first_text(card, LOCATION_SELECTORS),
                price: if amount > 0.0 { amount } else { UNPARSEABLE },
                price_text: stipend,
                link,
                snippet: first_text(card, DETAIL_SELECTORS).map(|s| snippet(&s, 150)),
                duration: first_text(card, DURATION_SELECTORS),
            });
        }

        listings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <div id="internship_list_container">
      <div class="individual_internship">
        <div class="internship_meta">
          <h3 class="profile"><a href="/internship/detail/web-development-internship-in-pune-at-acme1">Web Development</a></h3>
          <p class="company-name">Acme Labs</p>
          <div class="locations"><a class="location_link">Pune</a></div>
          <span class="stipend">₹ 10,000 /month</span>
          <span class="duration">3 Months</span>
        </div>
      </div>
      <div class="individual_internship">
        <div class="internship_meta">
          <h3 class="profile"><a href="/internship/detail/frontend-internship-at-beta2">Frontend Developer</a></h3>
          <p class="company-name">Beta Studio</p>
          <span class="location">Work From Home</span>
        </div>
      </div>
      <div class="individual_internship">
        <h3 class="profile">Listing without a detail page</h3>
      </div>
    </div>"#;

    #[test]
    fn test_parse_internshala_cards() {
        let items = InternshalaScraper.parse(FIXTURE, &SearchQuery::new("web development"));
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Web Development");
        assert_eq!(items[0].company.as_deref(), Some("Acme Labs"));
        assert_eq!(items[0].location.as_deref(), Some("Pune"));
        assert_eq!(items[0].price_text, "₹ 10,000 /month");
        assert_eq!(items[0].price, 10_000.0);
        assert_eq!(items[0].duration.as_deref(), Some("3 Months"));
        assert_eq!(
            items[0].link,
            "https://internshala.com/internship/detail/web-development-internship-in-pune-at-acme1"
        );

        assert_eq!(items[1].price_text, UNPAID);
        assert!(items[1].price.is_infinite());
        assert_eq!(items[1].location.as_deref(), Some("Work From Home"));
    }

    #[test]
    fn test_internshala_search_url() {
        assert_eq!(
            InternshalaScraper.search_url(&SearchQuery::new("Web Development")),
            "https://internshala.com/internships/web-development-internship"
        );
    }
}
