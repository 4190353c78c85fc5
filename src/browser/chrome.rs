//! Chromium sessions over the DevTools protocol (chromiumoxide)

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserLauncher, BrowserSession, InputField};
use crate::config::BrowserConfig;
use crate::types::{AppError, AppResult};

fn browser_err(e: impl std::fmt::Display) -> AppError {
    AppError::Browser(e.to_string())
}

/// JSON string literal for embedding user text in page scripts
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

const LIST_INPUTS_JS: &str = r#"
(() => Array.from(document.querySelectorAll('input')).map((el, index) => ({
    index,
    input_type: (el.getAttribute('type') || '').toLowerCase(),
    name: el.getAttribute('name') || el.id || '',
    placeholder: el.getAttribute('placeholder') || ''
})))()
"#;

pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> AppResult<Box<dyn BrowserSession>> {
        let mut builder = CdpConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .window_size(1366, 900);
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|e| AppError::Config(format!("browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| AppError::Browser(format!("browser launch failed: {}", e)))?;

        // The CDP connection only makes progress while the handler is polled
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(browser_err)?;
        info!(headless = self.config.headless, "Browser session started");

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler_task,
            closed: false,
        }))
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl ChromeSession {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> AppResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(browser_err)?
            .into_value::<T>()
            .map_err(browser_err)
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&self, url: &str) -> AppResult<()> {
        debug!(url = %url, "Navigating");
        self.page.goto(url).await.map_err(browser_err)?;
        Ok(())
    }

    async fn content(&self) -> AppResult<String> {
        self.page.content().await.map_err(browser_err)
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.page.url().await.map_err(browser_err)?.unwrap_or_default())
    }

    async fn title(&self) -> AppResult<String> {
        Ok(self.page.get_title().await.map_err(browser_err)?.unwrap_or_default())
    }

    async fn input_fields(&self) -> AppResult<Vec<InputField>> {
        self.eval(LIST_INPUTS_JS.to_string()).await
    }

    async fn fill_field(&self, index: usize, value: &str) -> AppResult<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelectorAll('input')[{index}];
                if (!el) return false;
                el.focus();
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            index = index,
            value = js_string(value),
        );
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(AppError::Browser(format!("input #{} is gone", index)))
        }
    }

    async fn type_into(&self, selector: &str, text: &str, submit: bool) -> AppResult<()> {
        let element = self.page.find_element(selector).await.map_err(browser_err)?;
        element.click().await.map_err(browser_err)?;
        element.type_str(text).await.map_err(browser_err)?;
        if submit {
            element.press_key("Enter").await.map_err(browser_err)?;
        }
        Ok(())
    }

    async fn scroll_by(&self, pixels: i64) -> AppResult<()> {
        self.eval::<serde_json::Value>(format!("window.scrollBy(0, {}); true", pixels))
            .await?;
        Ok(())
    }

    async fn click_first(&self, selector: &str) -> AppResult<bool> {
        match self.page.find_element(selector).await {
            Ok(element) => {
                element.click().await.map_err(browser_err)?;
                Ok(true)
            }
            Err(e) => {
                debug!(selector, error = %e, "No element to click");
                Ok(false)
            }
        }
    }

    async fn click_button_with_text(&self, words: &[&str]) -> AppResult<bool> {
        let words_json = serde_json::to_string(words).map_err(browser_err)?;
        let script = format!(
            r#"(() => {{
                const words = {words};
                for (const btn of document.querySelectorAll('button')) {{
                    const text = (btn.innerText || btn.textContent || '').toLowerCase();
                    if (words.some(w => text.includes(w))) {{ btn.click(); return true; }}
                }}
                return false;
            }})()"#,
            words = words_json,
        );
        self.eval(script).await
    }

    async fn confirm(&self, prompt: &str, wait: Duration) -> AppResult<bool> {
        let script = format!("confirm({})", js_string(prompt));
        match tokio::time::timeout(wait, self.eval::<bool>(script)).await {
            Ok(answer) => answer,
            Err(_) => {
                warn!(wait_secs = wait.as_secs(), "Confirmation unanswered, treating as declined");
                Ok(false)
            }
        }
    }

    async fn close(&mut self) -> AppResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let closed = self.browser.close().await.map_err(browser_err);
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        info!("Browser session closed");
        closed.map(|_| ())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if !self.closed {
            // Browser's own Drop kills the child process
            warn!("Browser session dropped without close");
            self.handler_task.abort();
        }
    }
}
