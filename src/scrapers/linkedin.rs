//! LinkedIn public (guest) job search

use scraper::Html;
use tracing::debug;
use url::Url;

use super::indeed::NOT_DISCLOSED;
use super::{first_attr, first_text, select_cards, SearchQuery, SiteScraper, Source};
use crate::extract::{parse_salary, UNPARSEABLE};
use crate::models::Listing;

const BASE: &str = "https://www.linkedin.com";

const CARD_SELECTORS: &[&str] = &["div.base-search-card", "div.base-card", "li.jobs-search-results__list-item"];
const TITLE_SELECTORS: &[&str] = &["h3.base-search-card__title", ".job-card-list__title", "h3"];
const COMPANY_SELECTORS: &[&str] = &["h4.base-search-card__subtitle", ".job-card-container__company-name", "h4"];
const LOCATION_SELECTORS: &[&str] = &["span.job-search-card__location", ".job-card-container__metadata-item"];
const SALARY_SELECTORS: &[&str] = &["span.job-search-card__salary-info"];
const LINK_SELECTORS: &[&str] = &["a.base-card__full-link", "a.job-card-list__title", "a"];

pub struct LinkedInScraper;

impl SiteScraper for LinkedInScraper {
    fn source(&self) -> Source {
        Source::LinkedIn
    }

    fn max_results(&self) -> usize {
        10
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        let location = query.location.as_deref().unwrap_or("India");
        Url::parse_with_params(
            &format!("{}/jobs/search", BASE),
            &[("keywords", query.term.as_str()), ("location", location)],
        )
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/jobs/search", BASE))
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
            // Guest links carry tracking parameters; the path alone identifies the job
            let link = first_attr(card, LINK_SELECTORS, "href").and_then(|h| {
                let mut url = Url::parse(BASE).ok()?.join(&h).ok()?;
                url.set_query(None);
                Some(url.to_string())
            });
            let Some(link) = link else {
                debug!(card = idx, title = %title, "Skipping job without link");
                continue;
            };

            let salary = first_text(card, SALARY_SELECTORS).unwrap_or_else(|| NOT_DISCLOSED.to_string());

            listings.push(Listing {
                source: Source::LinkedIn,
                title,
                company: Some(company),
                location: first_text(card, LOCATION_SELECTORS).or_else(|| query.location.clone()),
                price: parse_salary(&salary).unwrap_or(UNPARSEABLE),
                price_text: salary,
                link,
                snippet: None,
                duration: None,
            });
        }

        listings
    }
}
