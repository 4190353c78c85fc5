//! Browser Sessions
//!
//! A [`BrowserSession`] is one headless browser with one page, owned by the
//! task that launched it. There is no shared browser: each ability asks a
//! [`BrowserLauncher`] for a fresh session, passes it down explicitly and
//! closes it when done. Dropping a session without closing it kills the
//! browser process, so a cancelled task cannot leak one.

pub mod chrome;
#[cfg(test)]
pub mod fake;

pub use chrome::{ChromeLauncher, ChromeSession};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::AppResult;

/// An `<input>` element as seen on the page. `index` is its position among
/// all inputs in document order and is how it is addressed for filling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub index: usize,
    #[serde(default)]
    pub input_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub placeholder: String,
}

impl InputField {
    /// Text inputs and their close relatives. A missing type attribute is text.
    pub fn is_fillable(&self) -> bool {
        matches!(
            self.input_type.to_lowercase().as_str(),
            "" | "text" | "email" | "password" | "tel" | "number"
        )
    }

    /// Lowercased placeholder and name, the text matched against field labels
    pub fn label(&self) -> String {
        format!("{} {}", self.placeholder, self.name).to_lowercase()
    }
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> AppResult<()>;

    /// Full HTML of the current document
    async fn content(&self) -> AppResult<String>;

    async fn current_url(&self) -> AppResult<String>;

    async fn title(&self) -> AppResult<String>;

    async fn input_fields(&self) -> AppResult<Vec<InputField>>;

    async fn fill_field(&self, index: usize, value: &str) -> AppResult<()>;

    /// Click the first element matching `selector`, type `text`, and press
    /// Enter when `submit` is set
    async fn type_into(&self, selector: &str, text: &str, submit: bool) -> AppResult<()>;

    async fn scroll_by(&self, pixels: i64) -> AppResult<()>;

    /// Click the first element matching `selector`. `Ok(false)` when none exists.
    async fn click_first(&self, selector: &str) -> AppResult<bool>;

    /// Click the first `<button>` whose text contains any of `words`
    /// (case-insensitive). `Ok(false)` when none exists.
    async fn click_button_with_text(&self, words: &[&str]) -> AppResult<bool>;

    /// Show a `confirm()` dialog on the page. Unanswered within `wait` means no.
    async fn confirm(&self, prompt: &str, wait: Duration) -> AppResult<bool>;

    async fn close(&mut self) -> AppResult<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> AppResult<Box<dyn BrowserSession>>;
}
