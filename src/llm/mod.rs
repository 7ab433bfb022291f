pub mod models;
pub mod openai;

use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use models::Completion;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid Response: {0}")]
    InvalidResponse(String),
    #[error("Rate Limited")]
    RateLimited,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Single-shot text generation from one prompt.
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_default(config: &AppConfig) -> Option<Arc<dyn LlmProvider>> {
        match config.llm.provider.as_str() {
            "openai" => {
                let cfg = &config.llm.openai;
                Some(Arc::new(OpenAiProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.default_model.clone(),
                )))
            }
            _ => None,
        }
    }
}
