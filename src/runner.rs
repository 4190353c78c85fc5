//! Task Runner
//!
//! One submitted task, start to finish:
//!
//! 1. monthly limit check (rejections never create a task row)
//! 2. route the text to an ability and record the task as `running`
//! 3. run the ability with the user's profile and submission answer
//! 4. store the serialized result and final status
//!
//! Progress events go out on a broadcast channel along the way; nobody has
//! to be listening.
//!
//! Once a row exists it is always finished, even when the run future is
//! dropped mid-flight (client disconnect) or the final write fails: a
//! [`RowFinalizer`] completes it from a background task on drop.

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::abilities::{self, AbilityContext, AbilityResult, Progress, Services, SubmitGate};
use crate::brain;
use crate::db::TaskStore;
use crate::models::{LimitStatus, ProgressEvent, RunTaskResponse, Subscription, TaskStatus};
use crate::types::{AppError, AppResult};

const INTERRUPTED: &str = "Task was interrupted before it finished";

/// Finishes a task row if the owning future goes away before doing so
struct RowFinalizer {
    store: Arc<dyn TaskStore>,
    progress: broadcast::Sender<ProgressEvent>,
    task_id: i64,
    user_id: i64,
    /// Outcome to store; `None` until the ability has returned
    pending: Option<(TaskStatus, String)>,
    finished: bool,
}

impl RowFinalizer {
    fn interrupted_result() -> String {
        serde_json::to_string(&AbilityResult::error(INTERRUPTED)).unwrap_or_default()
    }
}

impl Drop for RowFinalizer {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let (status, result) = self
            .pending
            .take()
            .unwrap_or_else(|| (TaskStatus::Failed, Self::interrupted_result()));
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(task_id = self.task_id, "No runtime left to finish task row");
            return;
        };

        warn!(task_id = self.task_id, status = status.as_str(), "Finishing task row after interrupted run");
        let store = self.store.clone();
        let progress = self.progress.clone();
        let (task_id, user_id) = (self.task_id, self.user_id);
        handle.spawn(async move {
            if let Err(e) = store.finish_task(task_id, status, &result).await {
                warn!(task_id, error = %e, "Could not finish interrupted task");
                return;
            }
            let _ = progress.send(ProgressEvent::TaskCompleted {
                task_id,
                user_id,
                status,
            });
        });
    }
}

pub struct TaskRunner {
    services: Services,
    progress: broadcast::Sender<ProgressEvent>,
}

impl TaskRunner {
    pub fn new(services: Services, progress: broadcast::Sender<ProgressEvent>) -> Self {
        Self { services, progress }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Monthly task allowance for `user_id`
    pub async fn check_limits(&self, user_id: i64) -> AppResult<LimitStatus> {
        let store = &self.services.store;
        let subscription = store
            .get_profile(user_id)
            .await?
            .map(|p| p.subscription)
            .unwrap_or_default();

        let now = Utc::now();
        let first_of_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
        let since = Utc.from_utc_datetime(&first_of_month.and_time(NaiveTime::MIN));
        let used = store.count_tasks_since(user_id, since, None).await?;

        if subscription == Subscription::Pro {
            return Ok(LimitStatus {
                allowed: true,
                subscription,
                remaining: None,
                used,
                total: None,
            });
        }

        let limit = self.services.config.limits.free_monthly_tasks;
        Ok(LimitStatus {
            allowed: used < limit,
            subscription,
            remaining: Some((limit - used).max(0)),
            used,
            total: Some(limit),
        })
    }

    pub async fn run(
        &self,
        user_id: i64,
        task: &str,
        confirm_submit: Option<bool>,
    ) -> AppResult<RunTaskResponse> {
        self.run_with_cancel(user_id, task, confirm_submit, CancellationToken::new())
            .await
    }

    pub async fn run_with_cancel(
        &self,
        user_id: i64,
        task: &str,
        confirm_submit: Option<bool>,
        cancel: CancellationToken,
    ) -> AppResult<RunTaskResponse> {
        let task = task.trim();
        if task.is_empty() {
            return Err(AppError::InvalidRequest("task description is required".to_string()));
        }

        let limits = self.check_limits(user_id).await?;
        if !limits.allowed {
            info!(user_id, used = limits.used, "Monthly task limit reached");
            return Ok(RunTaskResponse {
                success: false,
                task_id: None,
                result: None,
                message: Some(format!(
                    "Monthly limit reached! You've used all {} free tasks this month. Upgrade to Pro for unlimited tasks!",
                    limits.total.unwrap_or(limits.used)
                )),
                limit_exceeded: true,
            });
        }

        let store = &self.services.store;
        let ability = brain::plan_or_default(task);
        let record = store.create_task(user_id, task, Some(ability)).await?;
        info!(task_id = record.id, user_id, ability = %ability, "Task started");
        let mut finalizer = RowFinalizer {
            store: store.clone(),
            progress: self.progress.clone(),
            task_id: record.id,
            user_id,
            pending: None,
            finished: false,
        };

        let _ = self.progress.send(ProgressEvent::TaskStarted {
            task_id: record.id,
            user_id,
            description: task.to_string(),
        });
        let progress = Progress::new(self.progress.clone(), record.id, user_id);
        progress.update(format!("AI Brain chose: {}", ability.name()));

        let profile = match store.get_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id, error = %e, "Could not load profile, continuing without it");
                None
            }
        };

        let ctx = AbilityContext::new(self.services.clone(), user_id)
            .with_profile(profile)
            .with_submit_gate(SubmitGate::from_answer(confirm_submit))
            .with_progress(progress.clone())
            .with_cancel(cancel);
        let result = abilities::execute(ability, task, &ctx).await;

        let status = result.task_status();
        let serialized = serde_json::to_string(&result)
            .map_err(|e| AppError::Internal(format!("could not serialize task result: {}", e)))?;
        finalizer.pending = Some((status, serialized.clone()));
        store.finish_task(record.id, status, &serialized).await?;
        finalizer.finished = true;

        let _ = self.progress.send(ProgressEvent::TaskCompleted {
            task_id: record.id,
            user_id,
            status,
        });
        progress.update("Task completed!");
        info!(task_id = record.id, status = status.as_str(), outcome = ?result.status, "Task finished");

        Ok(RunTaskResponse {
            success: true,
            task_id: Some(record.id),
            result: Some(result),
            message: None,
            limit_exceeded: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testing::Harness;
    use crate::abilities::Outcome;
    use crate::brain::Ability;
    use crate::browser::fake::FakePage;
    use crate::config::Config;
    use crate::models::UserProfile;
    use crate::scrapers::fetch::fake::FakeFetcher;
    use std::time::Duration;

    fn runner(harness: &Harness) -> (TaskRunner, broadcast::Receiver<ProgressEvent>) {
        let (tx, rx) = broadcast::channel(64);
        (TaskRunner::new(harness.services.clone(), tx), rx)
    }

    #[tokio::test]
    async fn test_run_records_task_and_emits_events() {
        let page: String = (1..=3).map(|i| format!("<h3>Story {}</h3>", i)).collect();
        let harness = Harness::new(FakeFetcher::new().with_page("news.google.com", &page));
        let (runner, mut events) = runner(&harness);

        let response = runner.run(1, "show me today's headlines", None).await.unwrap();
        assert!(response.success);
        assert_eq!(response.result.as_ref().unwrap().status, Outcome::Success);

        let tasks = harness.store.list_tasks(1, 10).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].ability, Some(Ability::Headlines));
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert!(tasks[0].result.as_deref().unwrap().contains("Story 1"));

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(serde_json::to_value(&event).unwrap()["event"].as_str().unwrap().to_string());
        }
        assert_eq!(kinds.first().map(String::as_str), Some("task_started"));
        assert!(kinds.contains(&"task_update".to_string()));
        assert!(kinds.contains(&"task_completed".to_string()));
    }

    #[tokio::test]
    async fn test_failed_ability_marks_task_failed() {
        let harness = Harness::new(FakeFetcher::new());
        let (runner, _events) = runner(&harness);

        let response = runner.run(1, "buy wireless earbuds", None).await.unwrap();
        assert!(response.success);
        assert_eq!(response.result.unwrap().status, Outcome::Error);

        let tasks = harness.store.list_tasks(1, 1).await.unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_monthly_limit() {
        let harness = Harness::new(FakeFetcher::new());
        let (runner, _events) = runner(&harness);
        for _ in 0..10 {
            harness.store.create_task(1, "old task", None).await.unwrap();
        }

        let status = runner.check_limits(1).await.unwrap();
        assert!(!status.allowed);
        assert_eq!(status.remaining, Some(0));

        let response = runner.run(1, "show headlines", None).await.unwrap();
        assert!(!response.success);
        assert!(response.limit_exceeded);
        assert!(response.task_id.is_none());
        assert_eq!(harness.store.list_tasks(1, 100).await.unwrap().len(), 10);

        // Other users are unaffected
        assert_eq!(runner.check_limits(2).await.unwrap().remaining, Some(10));
    }

    #[tokio::test]
    async fn test_pro_is_unlimited() {
        let harness = Harness::new(FakeFetcher::new());
        let (runner, _events) = runner(&harness);
        harness
            .store
            .upsert_profile(&UserProfile {
                user_id: 3,
                subscription: Subscription::Pro,
                ..Default::default()
            })
            .await
            .unwrap();
        for _ in 0..12 {
            harness.store.create_task(3, "task", None).await.unwrap();
        }

        let status = runner.check_limits(3).await.unwrap();
        assert!(status.allowed);
        assert_eq!(status.remaining, None);
        assert_eq!(status.used, 12);
    }

    #[tokio::test]
    async fn test_blank_task_rejected() {
        let harness = Harness::new(FakeFetcher::new());
        let (runner, _events) = runner(&harness);
        assert!(matches!(
            runner.run(1, "   ", None).await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_declined_form_is_completed_not_failed() {
        let harness = Harness::new(FakeFetcher::new());
        let (runner, _events) = runner(&harness);

        let response = runner
            .run(1, "fill the form at https://example.com/signup", Some(false))
            .await
            .unwrap();
        assert_eq!(response.result.unwrap().status, Outcome::Cancelled);
        let tasks = harness.store.list_tasks(1, 1).await.unwrap();
        assert_eq!(tasks[0].ability, Some(Ability::FormFill));
        assert_eq!(tasks[0].status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_dropped_run_still_finishes_row() {
        let mut harness = Harness::with_page(FakeFetcher::new(), FakePage::default());
        let mut config = Config::for_tests();
        config.browser.settle_ms = 5_000;
        harness.services.config = Arc::new(config);
        let (runner, mut events) = runner(&harness);
        let runner = Arc::new(runner);

        let handle = tokio::spawn({
            let runner = runner.clone();
            async move { runner.run(1, "open youtube and scroll", None).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(harness.store.list_tasks(1, 1).await.unwrap()[0].status, TaskStatus::Running);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        let mut status = TaskStatus::Running;
        for _ in 0..50 {
            status = harness.store.list_tasks(1, 1).await.unwrap()[0].status;
            if status != TaskStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, TaskStatus::Failed);
        let tasks = harness.store.list_tasks(1, 1).await.unwrap();
        assert!(tasks[0].result.as_deref().unwrap().contains(INTERRUPTED));

        let mut completed = false;
        while let Ok(event) = events.try_recv() {
            completed |= matches!(event, ProgressEvent::TaskCompleted { status: TaskStatus::Failed, .. });
        }
        assert!(completed);
    }
}
