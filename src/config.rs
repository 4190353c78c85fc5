use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::types::{AppError, AppResult, LLMProvider};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub scraping: ScrapingConfig,
    pub browser: BrowserConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// When unset, tasks and profiles live in memory
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub model: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
}

impl LLMConfig {
    /// API key for the configured provider, if any
    pub fn active_api_key(&self) -> Option<String> {
        match LLMProvider::from_id(&self.provider)? {
            LLMProvider::Google => self.gemini_api_key.clone(),
            LLMProvider::OpenAI | LLMProvider::OpenRouter | LLMProvider::Groq => {
                self.openai_api_key.clone()
            }
        }
    }

    pub fn require_api_key(&self) -> AppResult<String> {
        self.active_api_key().ok_or_else(|| {
            AppError::Config(format!(
                "no API key configured for LLM provider '{}' (set GEMINI_API_KEY or OPENAI_API_KEY)",
                self.provider
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub serpapi_key: Option<String>,
    pub max_results: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    Direct,
    Proxy,
    Rendered,
}

impl std::str::FromStr for FetchStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "http" => Ok(FetchStrategy::Direct),
            "proxy" | "scraperapi" => Ok(FetchStrategy::Proxy),
            "rendered" | "browser" => Ok(FetchStrategy::Rendered),
            other => Err(anyhow::anyhow!("unknown SCRAPE_STRATEGY '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingConfig {
    pub strategy: FetchStrategy,
    pub proxy_api_key: Option<String>,
    pub proxy_api_base: String,
    pub http_timeout_secs: u64,
}

impl ScrapingConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub settle_ms: u64,
}

impl BrowserConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub free_monthly_tasks: i64,
    pub free_daily_job_searches: i64,
    pub task_deadline_secs: u64,
}

impl LimitsConfig {
    pub fn task_deadline(&self) -> Duration {
        Duration::from_secs(self.task_deadline_secs)
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            database: DatabaseConfig {
                url: optional("DATABASE_URL"),
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
            },
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "google".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
                gemini_api_key: optional("GEMINI_API_KEY"),
                openai_api_key: optional("OPENAI_API_KEY"),
                openai_api_base: optional("OPENAI_API_BASE"),
            },
            search: SearchConfig {
                serpapi_key: optional("SERPAPI_KEY"),
                max_results: env::var("SERPAPI_MAX_RESULTS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            scraping: ScrapingConfig {
                strategy: env::var("SCRAPE_STRATEGY")
                    .unwrap_or_else(|_| "direct".to_string())
                    .parse()?,
                proxy_api_key: optional("SCRAPER_API_KEY"),
                proxy_api_base: env::var("SCRAPER_API_BASE")
                    .unwrap_or_else(|_| "https://api.scraperapi.com".to_string()),
                http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()?,
            },
            browser: BrowserConfig {
                headless: env::var("BROWSER_HEADLESS")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
                chrome_path: optional("CHROME_PATH"),
                settle_ms: env::var("BROWSER_SETTLE_MS")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
            },
            limits: LimitsConfig {
                free_monthly_tasks: env::var("FREE_MONTHLY_TASKS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                free_daily_job_searches: env::var("FREE_DAILY_JOB_SEARCHES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
                task_deadline_secs: env::var("TASK_DEADLINE_SECS")
                    .unwrap_or_else(|_| "180".to_string())
                    .parse()?,
            },
        })
    }

    /// Defaults with no external keys and no settle delays
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec![],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
                min_connections: 1,
            },
            llm: LLMConfig {
                provider: "google".to_string(),
                model: "gemini-1.5-flash".to_string(),
                gemini_api_key: None,
                openai_api_key: None,
                openai_api_base: None,
            },
            search: SearchConfig {
                serpapi_key: None,
                max_results: 10,
            },
            scraping: ScrapingConfig {
                strategy: FetchStrategy::Direct,
                proxy_api_key: None,
                proxy_api_base: "https://api.scraperapi.com".to_string(),
                http_timeout_secs: 5,
            },
            browser: BrowserConfig {
                headless: true,
                chrome_path: None,
                settle_ms: 0,
            },
            limits: LimitsConfig {
                free_monthly_tasks: 10,
                free_daily_job_searches: 3,
                task_deadline_secs: 30,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_strategy_parse() {
        assert_eq!("direct".parse::<FetchStrategy>().unwrap(), FetchStrategy::Direct);
        assert_eq!("Browser".parse::<FetchStrategy>().unwrap(), FetchStrategy::Rendered);
        assert_eq!("scraperapi".parse::<FetchStrategy>().unwrap(), FetchStrategy::Proxy);
        assert!("carrier-pigeon".parse::<FetchStrategy>().is_err());
    }

    #[test]
    fn test_active_api_key_follows_provider() {
        let mut llm = Config::for_tests().llm;
        assert!(llm.require_api_key().is_err());

        llm.gemini_api_key = Some("g-key".to_string());
        assert_eq!(llm.active_api_key().as_deref(), Some("g-key"));

        llm.provider = "groq".to_string();
        assert_eq!(llm.active_api_key(), None);
        llm.openai_api_key = Some("o-key".to_string());
        assert_eq!(llm.active_api_key().as_deref(), Some("o-key"));
    }
}
