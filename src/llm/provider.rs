use async_trait::async_trait;
use tracing::debug;

use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, LLMMessage, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Which provider to talk to, and how
pub struct LLMProviderConfig {
    pub provider: LLMProvider,
    pub api_key: String,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider: LLMProvider,
    model: String,
}

impl LLM {
    pub fn new(config: LLMProviderConfig, model: impl Into<String>) -> Self {
        let adapter: Box<dyn LLMAdapter> = match config.provider {
            LLMProvider::Google => Box::new(crate::llm::google::GoogleAdapter::with_base_url(
                &config.api_key,
                config.base_url.as_deref(),
            )),
            LLMProvider::OpenAI | LLMProvider::OpenRouter | LLMProvider::Groq => {
                Box::new(crate::llm::openai::OpenAIAdapter::for_provider(
                    config.provider,
                    &config.api_key,
                    config.base_url.as_deref(),
                ))
            }
        };

        Self {
            adapter,
            provider: config.provider,
            model: model.into(),
        }
    }

    /// Build from application config. Unknown providers and missing keys are
    /// configuration errors.
    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        let provider = LLMProvider::from_id(&config.provider).ok_or_else(|| {
            AppError::Config(format!("unsupported LLM provider '{}'", config.provider))
        })?;
        let api_key = config.require_api_key()?;
        let base_url = match provider {
            LLMProvider::Google => None,
            _ => config.openai_api_base.clone(),
        };

        Ok(Self::new(
            LLMProviderConfig {
                provider,
                api_key,
                base_url,
            },
            config.model.clone(),
        ))
    }

    pub fn with_adapter(adapter: Box<dyn LLMAdapter>, provider: LLMProvider, model: impl Into<String>) -> Self {
        Self {
            adapter,
            provider,
            model: model.into(),
        }
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }

    /// Single-turn prompt with the configured model
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> AppResult<String> {
        debug!(provider = %self.provider, model = %self.model, prompt_chars = prompt.len(), "LLM completion");
        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: Some(max_tokens),
            temperature: Some(0.3),
            system_instruction: None,
        };
        let response = self.create_chat_completion(&request).await?;
        if response.content.trim().is_empty() {
            return Err(AppError::LLMApi("empty completion".to_string()));
        }
        Ok(response.content)
    }
}
