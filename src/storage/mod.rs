pub mod local;
pub mod models;

pub use local::LocalFileStore;
pub use models::*;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Invalid document identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Document already exists: {0}")]
    AlreadyExists(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DocumentStorePtr = Arc<dyn DocumentStore>;

/// A document being written. Nothing is visible under the identifier until
/// `commit` succeeds; dropping an uncommitted sink discards what was written.
#[async_trait]
pub trait DocumentSink: Send {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), StorageError>;

    async fn commit(&mut self) -> Result<StoredDocument, StorageError>;
}

/// Key-value store for uploaded document bytes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Start writing a new document under `id`.
    async fn create(&self, id: &str) -> Result<Box<dyn DocumentSink>, StorageError>;

    /// Persist `content` under `id`. Never overwrites an existing document.
    async fn save(&self, id: &str, content: Bytes) -> Result<StoredDocument, StorageError> {
        let mut sink = self.create(id).await?;
        sink.write(&content).await?;
        sink.commit().await
    }

    async fn load(&self, id: &str) -> Result<Bytes, StorageError>;

    async fn exists(&self, id: &str) -> Result<bool, StorageError>;

    /// All stored documents, newest first.
    async fn list(&self) -> Result<Vec<StoredDocument>, StorageError>;
}

/// Identifiers double as file names, so they must be a single, non-hidden
/// path component.
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty() && !id.starts_with('.') && !id.contains(['/', '\\', '\0'])
}

pub fn create_store(config: &StorageConfig) -> Result<DocumentStorePtr, StorageError> {
    let store = LocalFileStore::open(&config.upload_dir)?;
    Ok(Arc::new(store))
}
