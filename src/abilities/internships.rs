//! AI Career Agent: internship search
//!
//! Internshala is the primary source. When it yields fewer than three
//! internships the search is widened to LinkedIn. Paid internships are
//! preferred when there are enough of them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use super::{AbilityContext, AbilityOutput, AbilityResult};
use crate::extract::squash_whitespace;
use crate::models::Listing;
use crate::scrapers::{scrape, InternshalaScraper, LinkedInScraper, SearchQuery};
use crate::types::AppResult;

const TOP_N: usize = 3;

static ROLE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(looking for|find|search|get|show|me|a|an|the|internships|internship|interns|intern|for|in|on|internshala|linkedin)\b",
    )
    .expect("valid role regex")
});

#[derive(Debug, Clone, Serialize)]
pub struct InternshipReport {
    pub role: String,
    pub internships: Vec<Listing>,
    pub total_found: usize,
    pub paid_found: usize,
}

/// `"find a marketing internship"` → `"marketing"`
pub fn extract_role(task: &str) -> String {
    squash_whitespace(&ROLE_NOISE.replace_all(&task.to_lowercase(), " "))
}

pub fn is_paid(listing: &Listing) -> bool {
    !listing.price_text.to_lowercase().contains("unpaid")
}

/// The first three paid internships if there are at least three, otherwise
/// the first three of any kind
pub fn select_internships(items: &[Listing]) -> Vec<Listing> {
    let paid: Vec<_> = items.iter().filter(|i| is_paid(i)).take(TOP_N).cloned().collect();
    if paid.len() >= TOP_N {
        paid
    } else {
        items.iter().take(TOP_N).cloned().collect()
    }
}

pub async fn run(task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let mut role = extract_role(task);
    if role.chars().count() < 2 {
        if let Some(skill) = ctx.profile.as_ref().and_then(|p| p.first_skill()) {
            role = skill;
        }
    }
    if role.chars().count() < 2 {
        return Ok(AbilityResult::error(
            "Please specify an internship role. Example: 'find web development internship'",
        ));
    }
    info!(role = %role, "Internship search");

    let fetcher = ctx.services.fetcher.as_ref();
    ctx.progress.update("Searching Internshala...");
    let mut found = scrape(fetcher, &InternshalaScraper, &SearchQuery::new(role.clone())).await;

    if found.len() < TOP_N {
        ctx.progress.update("Few results, widening search to LinkedIn...");
        let location = ctx
            .profile
            .as_ref()
            .and_then(|p| p.preferred_location.clone())
            .unwrap_or_else(|| "India".to_string());
        let query = SearchQuery::new(format!("{} internship", role)).with_location(location);
        found.extend(scrape(fetcher, &LinkedInScraper, &query).await);
    }

    if found.is_empty() {
        return Ok(AbilityResult::error(format!(
            "No internships found for '{}'. Try different keywords.",
            role
        )));
    }

    let internships = select_internships(&found);
    let paid_found = found.iter().filter(|i| is_paid(i)).count();
    let message = format!(
        "Found {} internships ({} paid). Showing the top {}!",
        found.len(),
        paid_found,
        internships.len()
    );

    Ok(AbilityResult::success(message).with_output(AbilityOutput::Internships(InternshipReport {
        role,
        total_found: found.len(),
        paid_found,
        internships,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testing::Harness;
    use crate::abilities::Outcome;
    use crate::extract::UNPARSEABLE;
    use crate::models::UserProfile;
    use crate::scrapers::fetch::fake::FakeFetcher;
    use crate::scrapers::Source;

    fn internship(title: &str, stipend: &str) -> Listing {
        Listing {
            source: Source::Internshala,
            title: title.to_string(),
            company: None,
            location: None,
            price_text: stipend.to_string(),
            price: UNPARSEABLE,
            link: format!("https://internshala.com/internship/detail/{}", title),
            snippet: None,
            duration: None,
        }
    }

    fn card(title: &str, stipend: Option<&str>) -> String {
        let stipend = stipend
            .map(|s| format!(r#"<span class="stipend">{}</span>"#, s))
            .unwrap_or_default();
        format!(
            r#"<div class="individual_internship">
                 <h3 class="profile"><a href="/internship/detail/{slug}">{title}</a></h3>
                 <p class="company-name">Acme</p>
                 {stipend}
               </div>"#,
            slug = title.to_lowercase().replace(' ', "-"),
            title = title,
            stipend = stipend
        )
    }

    #[test]
    fn test_extract_role() {
        assert_eq!(extract_role("find a marketing internship"), "marketing");
        assert_eq!(extract_role("Search Internshala for web development internships"), "web development");
        assert_eq!(extract_role("find internship"), "");
    }

    #[test]
    fn test_prefers_three_paid() {
        let items = vec![
            internship("a", "Unpaid"),
            internship("b", "₹5,000 /month"),
            internship("c", "₹8,000 /month"),
            internship("d", "unpaid"),
            internship("e", "Performance based"),
        ];
        let titles: Vec<_> = select_internships(&items).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["b", "c", "e"]);
    }

    #[test]
    fn test_falls_back_to_first_three() {
        let items = vec![
            internship("a", "Unpaid"),
            internship("b", "₹5,000 /month"),
            internship("c", "Unpaid"),
            internship("d", "Unpaid"),
        ];
        let titles: Vec<_> = select_internships(&items).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);

        assert_eq!(select_internships(&items[..2]).len(), 2);
        assert!(select_internships(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_internshala_only_when_enough_results() {
        let page = [
            card("Marketing Intern", Some("₹ 10,000 /month")),
            card("Content Marketing", None),
            card("Digital Marketing", Some("₹ 7,500 /month")),
            card("Brand Marketing", Some("₹ 12,000 /month")),
        ]
        .concat();
        let harness = Harness::new(FakeFetcher::new().with_page("internshala.com", &page));

        let result = run("find a marketing internship", &harness.context()).await.unwrap();
        assert_eq!(result.status, Outcome::Success);
        let Some(AbilityOutput::Internships(report)) = result.output else {
            panic!("expected internship report");
        };
        assert_eq!(report.role, "marketing");
        assert_eq!(report.total_found, 4);
        assert_eq!(report.paid_found, 3);
        let titles: Vec<_> = report.internships.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Marketing Intern", "Digital Marketing", "Brand Marketing"]);

        let requested = harness.fetcher.requested();
        assert_eq!(requested.len(), 1);
        assert!(requested[0].ends_with("/internships/marketing-internship"));
    }

    #[tokio::test]
    async fn test_widens_to_linkedin_and_uses_profile_skill() {
        let harness = Harness::new(FakeFetcher::new());
        let profile = UserProfile {
            skills: Some("graphic design, figma".to_string()),
            ..Default::default()
        };
        let ctx = harness.context().with_profile(Some(profile));

        let result = run("find internship", &ctx).await.unwrap();
        assert_eq!(result.status, Outcome::Error);
        assert!(result.message.contains("'graphic design'"));

        let requested = harness.fetcher.requested();
        assert_eq!(requested.len(), 2);
        assert!(requested[0].contains("graphic-design-internship"));
        assert!(requested[1].contains("linkedin.com"));
        assert!(requested[1].contains("keywords=graphic+design+internship"));
    }

    #[tokio::test]
    async fn test_missing_role_without_profile() {
        let harness = Harness::new(FakeFetcher::new());
        let result = run("find internship", &harness.context()).await.unwrap();
        assert_eq!(result.status, Outcome::Error);
        assert!(result.message.contains("find web development internship"));
        assert!(harness.fetcher.requested().is_empty());
    }
}
