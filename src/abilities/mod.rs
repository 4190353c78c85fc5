//! Abilities
//!
//! One handler per [`Ability`]. Every handler receives the raw task text and
//! an [`AbilityContext`] and produces an [`AbilityResult`]; errors never
//! escape to the caller. Internally handlers return `AppResult` and
//! [`execute`] folds any error into an `error` result.
//!
//! ```text
//! task text ──► brain::plan ──► execute ──┬─► shopping / jobs / internships ──► scrapers
//!                                         ├─► summarize ──► reqwest + LLM
//!                                         ├─► research / headlines ──► scrapers::google
//!                                         └─► forms / browse ──► BrowserSession
//! ```
//!
//! [`execute`] races the handler against the task deadline and the task's
//! cancellation token. Whichever finishes first wins; the losing future is
//! dropped, which also kills any browser session it owned.

pub mod browse;
pub mod forms;
pub mod headlines;
pub mod internships;
pub mod jobs;
pub mod research;
pub mod shopping;
pub mod summarize;

pub use forms::SubmitGate;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::brain::Ability;
use crate::browser::{BrowserLauncher, ChromeLauncher};
use crate::config::Config;
use crate::db::TaskStore;
use crate::llm::LLM;
use crate::models::{ProgressEvent, TaskStatus, UserProfile};
use crate::scrapers::{build_fetcher, fetch::http_client, PageFetcher};
use crate::search::SerpApiClient;
use crate::types::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
    Cancelled,
}

/// What an ability hands back: an outcome, a human-readable message and,
/// on success, a typed report
#[derive(Debug, Clone, Serialize)]
pub struct AbilityResult {
    pub status: Outcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<AbilityOutput>,
}

impl AbilityResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Outcome::Success,
            message: message.into(),
            output: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Outcome::Error,
            message: message.into(),
            output: None,
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            status: Outcome::Cancelled,
            message: message.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: AbilityOutput) -> Self {
        self.output = Some(output);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Outcome::Success
    }

    /// Stored task status. A cancelled task still completed: the user chose
    /// not to go ahead.
    pub fn task_status(&self) -> TaskStatus {
        match self.status {
            Outcome::Error => TaskStatus::Failed,
            Outcome::Success | Outcome::Cancelled => TaskStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityOutput {
    Shopping(shopping::ShoppingReport),
    Jobs(jobs::JobReport),
    Internships(internships::InternshipReport),
    Summary(summarize::SummaryReport),
    Form(forms::FormReport),
    Research(research::ResearchReport),
    Headlines(headlines::HeadlinesReport),
    Browse(browse::BrowseReport),
}

/// Long-lived collaborators shared by every task
#[derive(Clone)]
pub struct Services {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn PageFetcher>,
    /// Plain client for pages fetched outside the scraping strategy
    pub http: reqwest::Client,
    pub llm: Option<Arc<LLM>>,
    pub serpapi: Option<Arc<SerpApiClient>>,
    pub launcher: Arc<dyn BrowserLauncher>,
    pub store: Arc<dyn TaskStore>,
}

impl Services {
    /// Wire up from configuration. Missing LLM or SerpAPI keys only disable
    /// the abilities that need them, as does a proxy strategy without a key.
    pub fn from_config(config: Arc<Config>, store: Arc<dyn TaskStore>) -> Self {
        let launcher: Arc<dyn BrowserLauncher> = Arc::new(ChromeLauncher::new(config.browser.clone()));
        let fetcher = build_fetcher(&config, launcher.clone());

        let llm = match LLM::from_config(&config.llm) {
            Ok(llm) => {
                info!(provider = %llm.provider(), model = %llm.model(), "LLM ready");
                Some(Arc::new(llm))
            }
            Err(e) => {
                warn!(error = %e, "LLM not configured, text summarization disabled");
                None
            }
        };

        let serpapi = SerpApiClient::from_config(&config.search).map(Arc::new);
        if serpapi.is_none() {
            info!("SERPAPI_KEY not set, shopping uses site scrapers only");
        }

        Self {
            http: http_client(config.scraping.http_timeout()),
            config,
            fetcher,
            llm,
            serpapi,
            launcher,
            store,
        }
    }
}

/// Advisory progress messages for one task
#[derive(Clone)]
pub struct Progress {
    sender: Option<broadcast::Sender<ProgressEvent>>,
    task_id: i64,
    user_id: i64,
}

impl Progress {
    pub fn new(sender: broadcast::Sender<ProgressEvent>, task_id: i64, user_id: i64) -> Self {
        Self {
            sender: Some(sender),
            task_id,
            user_id,
        }
    }

    pub fn silent() -> Self {
        Self {
            sender: None,
            task_id: 0,
            user_id: 0,
        }
    }

    pub fn update(&self, message: impl Into<String>) {
        let message = message.into();
        info!(task_id = self.task_id, "{}", message);
        if let Some(sender) = &self.sender {
            // No subscribers is fine
            let _ = sender.send(ProgressEvent::TaskUpdate {
                task_id: self.task_id,
                user_id: self.user_id,
                message,
            });
        }
    }
}

/// Everything one task execution may touch
#[derive(Clone)]
pub struct AbilityContext {
    pub services: Services,
    pub user_id: i64,
    pub profile: Option<UserProfile>,
    pub submit_gate: SubmitGate,
    pub cancel: CancellationToken,
    pub progress: Progress,
}

impl AbilityContext {
    pub fn new(services: Services, user_id: i64) -> Self {
        Self {
            services,
            user_id,
            profile: None,
            submit_gate: SubmitGate::Ask,
            cancel: CancellationToken::new(),
            progress: Progress::silent(),
        }
    }

    pub fn with_profile(mut self, profile: Option<UserProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_submit_gate(mut self, gate: SubmitGate) -> Self {
        self.submit_gate = gate;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.services.config
    }
}

/// Run `ability` on `task` under the configured deadline. Never fails.
pub async fn execute(ability: Ability, task: &str, ctx: &AbilityContext) -> AbilityResult {
    let deadline = ctx.config().limits.task_deadline();
    ctx.progress.update(ability.start_message());

    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => {
            warn!(ability = %ability, "Task cancelled");
            AbilityResult::cancelled(format!("{} was cancelled", ability.name()))
        }
        outcome = tokio::time::timeout(deadline, dispatch(ability, task, ctx)) => match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(ability = %ability, error = %e, "Ability failed");
                AbilityResult::error(e.to_string())
            }
            Err(_) => {
                warn!(ability = %ability, deadline_secs = deadline.as_secs(), "Ability timed out");
                AbilityResult::error(format!(
                    "{} timed out after {}s",
                    ability.name(),
                    deadline.as_secs()
                ))
            }
        },
    }
}

async fn dispatch(ability: Ability, task: &str, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    match ability {
        Ability::Shopping => shopping::run(task, ctx).await,
        Ability::JobSearch => jobs::run(task, ctx).await,
        Ability::Internship => internships::run(task, ctx).await,
        Ability::TextExtract => summarize::run(task, ctx).await,
        Ability::FormFill => forms::run(task, forms::FillMode::Blind, ctx).await,
        Ability::UniversalForm => forms::run(task, forms::FillMode::Smart, ctx).await,
        Ability::Research => research::run(task, ctx).await,
        Ability::Headlines => headlines::run(ctx).await,
        Ability::Browse => browse::browse(task, ctx).await,
        Ability::ClickType => browse::click_and_type(task, ctx).await,
    }
}

/// First whitespace-separated token that looks like a URL
pub(crate) fn find_url(task: &str) -> Option<&str> {
    task.split_whitespace().find(|word| word.starts_with("http"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::browser::fake::{FakeLauncher, FakePage};
    use crate::db::MemoryTaskStore;
    use crate::llm::provider::fake::FakeAdapter;
    use crate::scrapers::fetch::fake::FakeFetcher;
    use crate::types::LLMProvider;

    pub struct Harness {
        pub fetcher: Arc<FakeFetcher>,
        pub launcher: FakeLauncher,
        pub store: Arc<MemoryTaskStore>,
        pub services: Services,
    }

    impl Harness {
        pub fn new(fetcher: FakeFetcher) -> Self {
            Self::with_page(fetcher, FakePage::default())
        }

        pub fn with_page(fetcher: FakeFetcher, page: FakePage) -> Self {
            let fetcher = Arc::new(fetcher);
            let launcher = FakeLauncher::new(page);
            let store = Arc::new(MemoryTaskStore::new());
            let services = Services {
                config: Arc::new(Config::for_tests()),
                fetcher: fetcher.clone(),
                http: reqwest::Client::new(),
                llm: None,
                serpapi: None,
                launcher: Arc::new(launcher.clone()),
                store: store.clone(),
            };
            Self {
                fetcher,
                launcher,
                store,
                services,
            }
        }

        pub fn with_llm(mut self, adapter: FakeAdapter) -> Self {
            self.services.llm = Some(Arc::new(LLM::with_adapter(
                Box::new(adapter),
                LLMProvider::Google,
                "test-model",
            )));
            self
        }

        pub fn context(&self) -> AbilityContext {
            AbilityContext::new(self.services.clone(), 1)
        }
    }
}
