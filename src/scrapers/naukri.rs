//! Naukri job search

use scraper::Html;
use tracing::debug;

use super::indeed::NOT_DISCLOSED;
use super::{absolutize, first_attr, first_text, select_cards, snippet, SearchQuery, SiteScraper, Source};
use crate::extract::{parse_salary, UNPARSEABLE};
use crate::models::Listing;

const BASE: &str = "https://www.naukri.com";

const CARD_SELECTORS: &[&str] = &["div.srp-jobtuple-wrapper", "article.jobTuple", "div.cust-job-tuple"];
const TITLE_SELECTORS: &[&str] = &["a.title", ".row1 a"];
const COMPANY_SELECTORS: &[&str] = &["a.comp-name", "a.subTitle", ".comp-dtls-wrap a"];
const LOCATION_SELECTORS: &[&str] = &["span.locWdth", "li.location span", ".loc-wrap span"];
const SALARY_SELECTORS: &[&str] = &["span.sal", "li.salary span", ".sal-wrap span"];
const SNIPPET_SELECTORS: &[&str] = &["span.job-desc", ".job-description"];

pub struct NaukriScraper;

impl SiteScraper for NaukriScraper {
    fn source(&self) -> Source {
        Source::Naukri
    }

    fn max_results(&self) -> usize {
        10
    }

    /// Naukri routes searches by path: `/python-developer-jobs-in-bangalore`
    fn search_url(&self, query: &SearchQuery) -> String {
        let role = SearchQuery::slug(&query.term);
        match query.location.as_deref().map(SearchQuery::slug) {
            Some(loc) if !loc.is_empty() && loc != "india" => format!("{}/{}-jobs-in-{}", BASE, role, loc),
            _ => format!("{}/{}-jobs", BASE, role),
        }
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
            let Some(link) = first_attr(card, TITLE_SELECTORS, "href").and_then(|h| absolutize(BASE, &h)) else {
                debug!(card = idx, title = %title, "Skipping job without link");
                continue;
            };

            let salary = first_text(card, SALARY_SELECTORS).unwrap_or_else(|| NOT_DISCLOSED.to_string());

            listings.push(Listing {
                source: Source::Naukri,
                title,
                company: Some(company),
                location: first_text(card, LOCATION_SELECTORS).or_else(|| query.location.clone()),
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

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <div class="styles_jlc__main">
      <div class="srp-jobtuple-wrapper">
        <div class="row1"><a class="title" href="https://www.naukri.com/job-listings-data-analyst-tcs-1">Data Analyst</a></div>
        <a class="comp-name">TCS</a>
        <span class="locWdth">Pune</span>
        <span class="sal">3.5-6 Lacs PA</span>
        <span class="job-desc">SQL, Power BI, stakeholder reporting</span>
      </div>
      <div class="srp-jobtuple-wrapper">
        <a class="title" href="/job-listings-lead-analyst-2">Lead Data Analyst</a>
        <a class="comp-name">Quantify Labs</a>
        <span class="sal">Not disclosed</span>
      </div>
      <div class="srp-jobtuple-wrapper">
        <a class="comp-name">Orphan Co</a>
      </div>
    </div>"#;

    #[test]
    fn test_parse_naukri_cards() {
        let query = SearchQuery::new("data analyst").with_location("pune");
        let jobs = NaukriScraper.parse(FIXTURE, &query);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].company.as_deref(), Some("TCS"));
        assert_eq!(jobs[0].price, 600_000.0);
        assert_eq!(jobs[0].price_text, "3.5-6 Lacs PA");
        assert_eq!(jobs[1].link, "https://www.naukri.com/job-listings-lead-analyst-2");
        assert!(jobs[1].price.is_infinite());
        assert_eq!(jobs[1].location.as_deref(), Some("pune"));
    }

    #[test]
    fn test_naukri_search_url() {
        let q = SearchQuery::new("Python Developer").with_location("Bangalore");
        assert_eq!(NaukriScraper.search_url(&q), "https://www.naukri.com/python-developer-jobs-in-bangalore");
        let q = SearchQuery::new("python developer").with_location("India");
        assert_eq!(NaukriScraper.search_url(&q), "https://www.naukri.com/python-developer-jobs");
    }
}
