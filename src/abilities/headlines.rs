//! Top Google News headlines

use serde::Serialize;

use super::{AbilityContext, AbilityOutput, AbilityResult};
use crate::scrapers::google::{parse_headlines, GOOGLE_NEWS_URL};
use crate::types::{AppError, AppResult};

const MAX_HEADLINES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct HeadlinesReport {
    pub headlines: Vec<String>,
}

pub async fn run(ctx: &AbilityContext) -> AppResult<AbilityResult> {
    ctx.progress.update("Opening Google News...");
    let html = ctx
        .services
        .fetcher
        .fetch(GOOGLE_NEWS_URL)
        .await
        .map_err(AppError::from)?;

    let headlines = parse_headlines(&html, MAX_HEADLINES);
    if headlines.is_empty() {
        return Ok(AbilityResult::error("No headlines found"));
    }

    let message = headlines
        .iter()
        .map(|h| format!("• {}", h))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(AbilityResult::success(message).with_output(AbilityOutput::Headlines(HeadlinesReport { headlines })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testing::Harness;
    use crate::abilities::Outcome;
    use crate::scrapers::fetch::fake::FakeFetcher;

    #[tokio::test]
    async fn test_headlines_top_five() {
        let page: String = (1..=7).map(|i| format!("<h3>Story {}</h3>", i)).collect();
        let harness = Harness::new(FakeFetcher::new().with_page("news.google.com", &page));

        let result = run(&harness.context()).await.unwrap();
        assert_eq!(result.status, Outcome::Success);
        assert!(result.message.starts_with("• Story 1\n• Story 2"));
        let Some(AbilityOutput::Headlines(report)) = result.output else {
            panic!("expected headlines");
        };
        assert_eq!(report.headlines.len(), 5);
    }

    #[tokio::test]
    async fn test_no_headlines() {
        let harness = Harness::new(FakeFetcher::new().with_page("news.google.com", "<p>consent</p>"));
        let result = run(&harness.context()).await.unwrap();
        assert_eq!(result.status, Outcome::Error);
        assert_eq!(result.message, "No headlines found");
    }
}
