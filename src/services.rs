use actix_web::web;
use std::sync::Arc;
use thiserror::Error;

use crate::answer::AnswerService;
use crate::ask::AskService;
use crate::config::AppConfig;
use crate::llm::{LlmProvider, ProviderFactory};
use crate::storage::{create_store, DocumentStorePtr, StorageError};
use crate::upload::UploadService;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open upload directory {0}: {1}")]
    Storage(String, StorageError),
    #[error("Unknown LLM provider '{0}'")]
    UnknownProvider(String),
}

/// The components every entry point needs, built once from the config.
#[derive(Clone)]
pub struct Services {
    pub store: DocumentStorePtr,
    pub uploads: UploadService,
    pub ask: AskService,
}

impl Services {
    pub fn new(config: &AppConfig, store: DocumentStorePtr, provider: Arc<dyn LlmProvider>) -> Self {
        let answers = AnswerService::new(provider, config.answer.max_chars);
        Self {
            uploads: UploadService::new(store.clone(), &config.storage),
            ask: AskService::new(store.clone(), answers),
            store,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let store = create_store(&config.storage)
            .map_err(|e| StartupError::Storage(config.storage.upload_dir.clone(), e))?;
        let provider = ProviderFactory::create_default(config)
            .ok_or_else(|| StartupError::UnknownProvider(config.llm.provider.clone()))?;
        Ok(Self::new(config, store, provider))
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.uploads.clone()))
            .app_data(web::Data::new(self.ask.clone()));
    }
}
