//! AI Job Finder
//!
//! Searches Indeed, Naukri and LinkedIn for a title/location pair pulled out
//! of the task text, then scores every job and keeps the best three.
//!
//! Scoring (not exposed in the report):
//!
//! | signal                                  | points       |
//! |-----------------------------------------|--------------|
//! | annual salary ≥20L / ≥15L / ≥10L / ≥5L  | 100/80/60/40 |
//! | any other disclosed salary              | 20           |
//! | well-known employer                     | 50           |
//! | senior/lead/principal/architect/manager | 30           |
//! | otherwise mid/intermediate              | 15           |
//!
//! Free accounts get a fixed number of job searches per day.

use chrono::{NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use super::{AbilityContext, AbilityOutput, AbilityResult};
use crate::brain::Ability;
use crate::extract::squash_whitespace;
use crate::models::{Listing, Subscription};
use crate::scrapers::{scrape, IndeedScraper, LinkedInScraper, NaukriScraper, SearchQuery, SiteScraper};
use crate::types::AppResult;

const TOP_N: usize = 3;
const DEFAULT_LOCATION: &str = "India";

const KNOWN_COMPANIES: &[&str] = &[
    "google", "microsoft", "amazon", "facebook", "meta", "apple", "netflix", "uber", "airbnb",
    "linkedin", "twitter", "adobe", "salesforce", "oracle", "ibm", "intel", "nvidia", "cisco",
    "infosys", "tcs", "wipro", "hcl", "tech mahindra", "cognizant", "accenture", "deloitte", "pwc",
    "ey", "kpmg", "flipkart", "paytm", "zomato", "swiggy", "ola", "byju", "razorpay",
];

const SENIOR_WORDS: &[&str] = &["senior", "lead", "principal", "architect", "manager"];
const MID_WORDS: &[&str] = &["mid", "intermediate"];

const LAKH: f64 = 100_000.0;

static LOCATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["in", "at", "location"]
        .iter()
        .map(|keyword| {
            Regex::new(&format!(
                r"\b{}\s+([a-z][a-z ]*?)(?:\s+(?:for|with|paying|under|above|salary)\b|\s*$)",
                keyword
            ))
            .expect("valid location regex")
        })
        .collect()
});

static TITLE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(looking for|find|search|get|show|me|jobs|job|positions|position|openings|vacancies|careers|career|in|at|for|on|indeed|naukri|linkedin)\b",
    )
    .expect("valid title regex")
});

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub title: String,
    pub location: String,
    pub jobs: Vec<Listing>,
    pub total_found: usize,
    pub searches_used: i64,
    /// `None` for unlimited plans
    pub searches_remaining: Option<i64>,
}

/// Split a task into a job title and an optional location:
/// `"find python developer jobs in bangalore"` → `("python developer", Some("bangalore"))`
pub fn extract_job_query(task: &str) -> (String, Option<String>) {
    let lower = squash_whitespace(&task.to_lowercase());
    let lower = lower.trim_end_matches(['.', '!', '?']).to_string();

    let mut location = None;
    let mut remainder = lower.clone();
    for pattern in LOCATION_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&lower) {
            if let (Some(whole), Some(place)) = (caps.get(0), caps.get(1)) {
                location = Some(place.as_str().trim().to_string());
                remainder = format!("{} {}", &lower[..whole.start()], &lower[place.end()..]);
                break;
            }
        }
    }

    let title = squash_whitespace(&TITLE_NOISE.replace_all(&remainder, " "));
    (title, location.filter(|l| !l.is_empty()))
}

fn salary_points(annual: f64) -> u32 {
    if !annual.is_finite() || annual <= 0.0 {
        0
    } else if annual >= 20.0 * LAKH {
        100
    } else if annual >= 15.0 * LAKH {
        80
    } else if annual >= 10.0 * LAKH {
        60
    } else if annual >= 5.0 * LAKH {
        40
    } else {
        20
    }
}

pub fn is_known_company(company: &str) -> bool {
    let company = company.to_lowercase();
    KNOWN_COMPANIES.iter().any(|known| company.contains(known))
}

pub fn score_job(job: &Listing) -> u32 {
    let mut score = salary_points(job.price);

    if job.company.as_deref().is_some_and(is_known_company) {
        score += 50;
    }

    let title = job.title.to_lowercase();
    if SENIOR_WORDS.iter().any(|w| title.contains(w)) {
        score += 30;
    } else if MID_WORDS.iter().any(|w| title.contains(w)) {
        score += 15;
    }

    score
}

/// Best three by score. Equal scores keep source order.
pub fn rank_jobs(jobs: Vec<Listing>) -> Vec<Listing> {
    let mut scored: Vec<_> = jobs.into_iter().map(|job| (score_job(&job), job)).collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(TOP_N).map(|(_, job)| job).collect()
}

/// Today's usage for the daily job-search allowance
struct Allowance {
    allowed: bool,
    used: i64,
    remaining: Option<i64>,
}

async fn daily_allowance(ctx: &AbilityContext) -> Allowance {
    let subscription = ctx.profile.as_ref().map(|p| p.subscription).unwrap_or_default();
    let limit = ctx.config().limits.free_daily_job_searches;
    let start_of_day = Utc.from_utc_datetime(&Utc::now().date_naive().and_time(NaiveTime::MIN));

    let used = match ctx
        .services
        .store
        .count_tasks_since(ctx.user_id, start_of_day, Some(Ability::JobSearch))
        .await
    {
        Ok(count) => count,
        Err(e) => {
            warn!(user_id = ctx.user_id, error = %e, "Could not count job searches, allowing search");
            return Allowance {
                allowed: true,
                used: 0,
                remaining: None,
            };
        }
    };

    if subscription == Subscription::Pro {
        return Allowance {
            allowed: true,
            used,
            remaining: None,
        };
    }

    // `used` already includes the task being run
    if used > limit {
        Allowance {
            allowed: false,
            used: limit,
            remaining: Some(0),
        }
    } else {
        Allowance {
            allowed: true,
            used,
            remaining: Some(limit - used),
        }
    }
}

pub async fn run(task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let (mut title, mut location) = extract_job_query(task);
    let profile = ctx.profile.as_ref();

    if title.chars().count() < 3 {
        if let Some(preferred) = profile.and_then(|p| p.preferred_job_title.clone()) {
            title = preferred.trim().to_string();
        }
    }
    if title.chars().count() < 2 {
        return Ok(AbilityResult::error(
            "Please specify a job title. Example: 'find python developer jobs'",
        ));
    }
    if location.is_none() {
        location = profile.and_then(|p| p.preferred_location.clone());
    }
    let location = location.unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let allowance = daily_allowance(ctx).await;
    if !allowance.allowed {
        let limit = ctx.config().limits.free_daily_job_searches;
        info!(user_id = ctx.user_id, limit, "Daily job-search limit reached");
        return Ok(AbilityResult::error(format!(
            "Daily limit reached! You've used all {} free job searches today. Upgrade to Pro for unlimited searches!",
            limit
        ))
        .with_output(AbilityOutput::Jobs(JobReport {
            title,
            location,
            jobs: Vec::new(),
            total_found: 0,
            searches_used: allowance.used,
            searches_remaining: allowance.remaining,
        })));
    }

    info!(title = %title, location = %location, "Job search");
    let query = SearchQuery::new(title.clone()).with_location(location.clone());
    let scrapers: [&dyn SiteScraper; 3] = [&IndeedScraper, &NaukriScraper, &LinkedInScraper];

    let mut found = Vec::new();
    for scraper in scrapers {
        ctx.progress.update(format!("Searching {}...", scraper.source()));
        found.extend(scrape(ctx.services.fetcher.as_ref(), scraper, &query).await);
    }

    if found.is_empty() {
        return Ok(AbilityResult::error(format!(
            "No jobs found for '{}' in {}. Try different keywords.",
            title, location
        )));
    }

    let total_found = found.len();
    let jobs = rank_jobs(found);
    let message = format!("Found {} jobs. Showing the top {} matches!", total_found, jobs.len());

    Ok(AbilityResult::success(message).with_output(AbilityOutput::Jobs(JobReport {
        title,
        location,
        jobs,
        total_found,
        searches_used: allowance.used,
        searches_remaining: allowance.remaining,
    })))
}
