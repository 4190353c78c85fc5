//! Indeed India job search

use scraper::Html;
use tracing::debug;
use url::Url;

use super::{absolutize, first_attr, first_text, select_cards, snippet, SearchQuery, SiteScraper, Source};
use crate::extract::{parse_salary, UNPARSEABLE};
use crate::models::Listing;

const BASE: &str = "https://in.indeed.com";

const CARD_SELECTORS: &[&str] = &[".job_seen_beacon", ".resultContent", "div.cardOutline"];
const TITLE_SELECTORS: &[&str] = &["h2 a span", ".jobTitle span", "h2"];
const COMPANY_SELECTORS: &[&str] = &["[data-testid='company-name']", ".companyName"];
const LOCATION_SELECTORS: &[&str] = &["[data-testid='text-location']", ".companyLocation"];
const SALARY_SELECTORS: &[&str] = &[".salary-snippet", ".salaryOnly", "[data-testid='attribute_snippet_testid']"];
const SNIPPET_SELECTORS: &[&str] = &[".job-snippet", ".underShelfFooter"];

pub const NOT_DISCLOSED: &str = "Not disclosed";

pub struct IndeedScraper;

impl SiteScraper for IndeedScraper {
    fn source(&self) -> Source {
        Source::Indeed
    }

    fn max_results(&self) -> usize {
        10
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        let location = query.location.as_deref().unwrap_or("India");
        Url::parse_with_params(
            &format!("{}/jobs", BASE),
            &[("q", query.term.as_str()), ("l", location)],
        )
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/jobs", BASE))
    }

    fn parse(&self, html: &str, query: &SearchQuery) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let mut listings = Vec::new();

        for (idx, card) in select_cards(&document, CARD_SELECTORS).into_iter().enumerate() {
            let Some(title) = first_text(card, TITLE_SELECTORS) else {
                debug!(card = idx, "Skipping job without title");
                continue;
            };
            let Some(company) = first_text(card, COMPANY_SELECTORS) else {
                debug!(card = idx, title = %title, "Skipping job without company");
                continue;
            };
            let Some(link) = first_attr(card, &["h2 a", "a.jcs-JobTitle"], "href").and_then(|h| absolutize(BASE, &h))
            else {
                debug!(card = idx, title = %title, "Skipping job without link");
                continue;
            };

            let salary = first_text(card, SALARY_SELECTORS).unwrap_or_else(|| NOT_DISCLOSED.to_string());
            let location = first_text(card, LOCATION_SELECTORS).or_else(|| query.location.clone());

            listings.push(Listing {
                source: Source::Indeed,
                title,
                company: Some(company),
                location,
                price: parse_salary(&salary).unwrap_or(UNPARSEABLE),
                price_text: salary,
                link,
                snippet: first_text(card, SNIPPET_SELECTORS).map(|s| snippet(&s, 200)),
                duration: None,
            });
        }

        listings
    }
}
