use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::abilities::AbilityResult;
use crate::brain::Ability;
use crate::config::Config;
use crate::db::TaskStore;
use crate::runner::TaskRunner;
use crate::scrapers::Source;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn TaskStore>,
    pub runner: Arc<TaskRunner>,
    pub progress: broadcast::Sender<ProgressEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "running" => Some(TaskStatus::Running),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

/// A submitted task and, once finished, its stringified result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub ability: Option<Ability>,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    #[default]
    Free,
    Pro,
}

impl Subscription {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("pro") {
            Subscription::Pro
        } else {
            Subscription::Free
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subscription::Free => "free",
            Subscription::Pro => "pro",
        }
    }
}

/// Structured user preferences, read-only from the abilities' point of view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    /// Comma separated
    pub skills: Option<String>,
    pub preferred_job_title: Option<String>,
    pub preferred_location: Option<String>,
    pub expected_salary: Option<String>,
    #[serde(default)]
    pub subscription: Subscription,
}

impl UserProfile {
    pub fn first_skill(&self) -> Option<String> {
        self.skills
            .as_deref()?
            .split(',')
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// A normalized scraped record: a product, a job or an internship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub source: Source,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Price, salary or stipend as displayed
    pub price_text: String,
    /// Parsed amount; `f64::INFINITY` (serialized as null) when unparseable
    pub price: f64,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Progress notifications pushed over the WebSocket channel
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    TaskStarted {
        task_id: i64,
        user_id: i64,
        description: String,
    },
    TaskUpdate {
        task_id: i64,
        user_id: i64,
        message: String,
    },
    TaskCompleted {
        task_id: i64,
        user_id: i64,
        status: TaskStatus,
    },
}

// API Request/Response types

#[derive(Debug, Deserialize)]
pub struct RunTaskRequest {
    pub task: String,
    /// Pre-answers the form submission prompt; `None` asks on the page
    #[serde(default)]
    pub confirm_submit: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RunTaskResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AbilityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub limit_exceeded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitStatus {
    pub allowed: bool,
    pub subscription: Subscription,
    /// `None` means unlimited
    pub remaining: Option<i64>,
    pub used: i64,
    pub total: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AbilityInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub uses_browser: bool,
}

impl From<Ability> for AbilityInfo {
    fn from(ability: Ability) -> Self {
        Self {
            id: ability.id(),
            name: ability.name(),
            description: ability.description(),
            uses_browser: ability.uses_browser(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}
