//! Scripted browser for tests. Records every action into a shared log.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BrowserLauncher, BrowserSession, InputField};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub title: String,
    pub fields: Vec<InputField>,
    /// Selectors `click_first` can find
    pub clickable: Vec<String>,
    /// Texts of the page's `<button>` elements
    pub buttons: Vec<String>,
    pub confirm_answer: bool,
    /// Field indices whose fill fails
    pub broken_fields: Vec<usize>,
    pub fail_launch: bool,
}

impl FakePage {
    pub fn with_fields(fields: &[(&str, &str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .enumerate()
                .map(|(index, (input_type, name, placeholder))| InputField {
                    index,
                    input_type: input_type.to_string(),
                    name: name.to_string(),
                    placeholder: placeholder.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeLog {
    pub launches: usize,
    pub closes: usize,
    pub visited: Vec<String>,
    pub filled: Vec<(usize, String)>,
    pub typed: Vec<(String, String, bool)>,
    pub scrolls: Vec<i64>,
    pub clicked: Vec<String>,
    pub prompts: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub page: FakePage,
    pub log: Arc<Mutex<FakeLog>>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, FakeLog> {
        self.log.lock().unwrap()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> AppResult<Box<dyn BrowserSession>> {
        if self.page.fail_launch {
            return Err(AppError::Browser("no chrome binary".to_string()));
        }
        self.log.lock().unwrap().launches += 1;
        Ok(Box::new(FakeSession {
            page: self.page.clone(),
            log: self.log.clone(),
        }))
    }
}

pub struct FakeSession {
    page: FakePage,
    log: Arc<Mutex<FakeLog>>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&self, url: &str) -> AppResult<()> {
        self.log.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn content(&self) -> AppResult<String> {
        Ok(self.page.html.clone())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.log.lock().unwrap().visited.last().cloned().unwrap_or_default())
    }

    async fn title(&self) -> AppResult<String> {
        Ok(self.page.title.clone())
    }

    async fn input_fields(&self) -> AppResult<Vec<InputField>> {
        Ok(self.page.fields.clone())
    }

    async fn fill_field(&self, index: usize, value: &str) -> AppResult<()> {
        if self.page.broken_fields.contains(&index) {
            return Err(AppError::Browser(format!("input #{} is detached", index)));
        }
        self.log.lock().unwrap().filled.push((index, value.to_string()));
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str, submit: bool) -> AppResult<()> {
        self.log
            .lock()
            .unwrap()
            .typed
            .push((selector.to_string(), text.to_string(), submit));
        Ok(())
    }

    async fn scroll_by(&self, pixels: i64) -> AppResult<()> {
        self.log.lock().unwrap().scrolls.push(pixels);
        Ok(())
    }

    async fn click_first(&self, selector: &str) -> AppResult<bool> {
        if self.page.clickable.iter().any(|s| s == selector) {
            self.log.lock().unwrap().clicked.push(selector.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn click_button_with_text(&self, words: &[&str]) -> AppResult<bool> {
        let hit = self.page.buttons.iter().find(|text| {
            let text = text.to_lowercase();
            words.iter().any(|w| text.contains(w))
        });
        match hit {
            Some(text) => {
                self.log.lock().unwrap().clicked.push(format!("button:{}", text));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn confirm(&self, prompt: &str, _wait: Duration) -> AppResult<bool> {
        self.log.lock().unwrap().prompts.push(prompt.to_string());
        Ok(self.page.confirm_answer)
    }

    async fn close(&mut self) -> AppResult<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}
