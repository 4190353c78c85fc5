//! Browser-driven searches: open-and-scroll, and click-and-type on Google

use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::{AbilityContext, AbilityOutput, AbilityResult};
use crate::browser::BrowserSession;
use crate::scrapers::google::{self, GOOGLE_HOME};
use crate::types::AppResult;

const SCROLL_STEP: i64 = 500;
const SCROLL_PAUSE: Duration = Duration::from_secs(1);
const SEARCH_BOX: &str = "textarea[name=q], input[name=q]";

#[derive(Debug, Clone, Serialize)]
pub struct BrowseReport {
    pub action: String,
    pub final_url: String,
    pub page_title: String,
}

async fn report(session: &dyn BrowserSession, action: &str) -> AppResult<AbilityResult> {
    let final_url = session.current_url().await?;
    let page_title = session.title().await?;
    info!(action, url = %final_url, "Browser action completed");
    Ok(AbilityResult::success(format!("{}: {}", action, page_title)).with_output(AbilityOutput::Browse(
        BrowseReport {
            action: action.to_string(),
            final_url,
            page_title,
        },
    )))
}

async fn scroll_results(session: &dyn BrowserSession, query: &str, settle: Duration) -> AppResult<AbilityResult> {
    session.goto(&google::search_url(query)).await?;
    sleep(settle).await;
    session.scroll_by(SCROLL_STEP).await?;
    sleep(SCROLL_PAUSE.min(settle)).await;
    session.scroll_by(SCROLL_STEP).await?;
    report(session, "Searched and scrolled").await
}

async fn type_search(session: &dyn BrowserSession, text: &str, settle: Duration) -> AppResult<AbilityResult> {
    session.goto(GOOGLE_HOME).await?;
    sleep(settle).await;
    session.type_into(SEARCH_BOX, text, true).await?;
    sleep(settle).await;
    report(session, "Typed on Google").await
}

/// Open a Google search for the task and scroll through the results
pub async fn browse(task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let mut session = ctx.services.launcher.launch().await?;
    let outcome = scroll_results(session.as_ref(), task.trim(), ctx.config().browser.settle()).await;
    if let Err(e) = session.close().await {
        debug!(error = %e, "Browser close failed after browse");
    }
    outcome
}

/// Type the task into Google's search box and submit it
pub async fn click_and_type(task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let mut session = ctx.services.launcher.launch().await?;
    let outcome = type_search(session.as_ref(), task.trim(), ctx.config().browser.settle()).await;
    if let Err(e) = session.close().await {
        debug!(error = %e, "Browser close failed after click and type");
    }
    outcome
}
