//! Web research: the first few Google result descriptions as bullets

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use super::{AbilityContext, AbilityOutput, AbilityResult};
use crate::extract::squash_whitespace;
use crate::scrapers::google;
use crate::types::{AppError, AppResult};

const MAX_BULLETS: usize = 4;
const DEFAULT_KEYWORD: &str = "latest technology";
const NOTHING_FOUND: &str = "No research details found.";

static NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(research|about)\b").expect("valid research regex"));

#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub keyword: String,
    pub title: String,
    pub bullets: Vec<String>,
}

pub fn research_keyword(task: &str) -> String {
    let keyword = squash_whitespace(&NOISE.replace_all(&task.to_lowercase(), " "));
    if keyword.is_empty() {
        DEFAULT_KEYWORD.to_string()
    } else {
        keyword
    }
}

pub async fn run(task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let keyword = research_keyword(task);
    info!(keyword = %keyword, "Research");

    let html = ctx
        .services
        .fetcher
        .fetch(&google::search_url(&keyword))
        .await
        .map_err(AppError::from)?;

    let mut bullets: Vec<String> = google::parse_result_snippets(&html, MAX_BULLETS)
        .into_iter()
        .map(|snippet| format!("• {}", snippet))
        .collect();
    if bullets.is_empty() {
        bullets.push(NOTHING_FOUND.to_string());
    }

    let title = format!("Research Summary for: {}", keyword);
    Ok(AbilityResult::success(title.clone()).with_output(AbilityOutput::Research(ResearchReport {
        keyword,
        title,
        bullets,
    })))
}
