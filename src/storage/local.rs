use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::storage::{is_valid_identifier, DocumentSink, DocumentStore, StorageError, StoredDocument};

/// Flat directory store: one file per document, file name equals identifier.
pub struct LocalFileStore {
    base_path: PathBuf,
}

impl LocalFileStore {
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        info!("Using upload directory at {}", base_path.display());
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        is_valid_identifier(id).then(|| self.base_path.join(id))
    }
}

/// Writes into a hidden `.<id>.part` file next to the target and renames it
/// into place on commit.
pub struct LocalDocumentSink {
    id: String,
    part_path: PathBuf,
    final_path: PathBuf,
    file: Option<fs::File>,
    written: u64,
    committed: bool,
}

#[async_trait]
impl DocumentSink for LocalDocumentSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let file = self.file.as_mut().ok_or_else(|| already_committed(&self.id))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    async fn commit(&mut self) -> Result<StoredDocument, StorageError> {
        let mut file = self.file.take().ok_or_else(|| already_committed(&self.id))?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if fs::try_exists(&self.final_path).await? {
            return Err(StorageError::AlreadyExists(self.id.clone()));
        }
        fs::rename(&self.part_path, &self.final_path).await?;
        self.committed = true;

        debug!("Stored {} ({} bytes)", self.id, self.written);

        Ok(StoredDocument {
            id: self.id.clone(),
            path: self.final_path.clone(),
            size: self.written,
            modified: Utc::now(),
        })
    }
}

impl Drop for LocalDocumentSink {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.part_path) {
            Ok(()) => debug!("Discarded partial upload {}", self.id),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.part_path.display(), e),
        }
    }
}

fn already_committed(id: &str) -> StorageError {
    StorageError::Io(std::io::Error::new(
        ErrorKind::Other,
        format!("document {} was already committed", id),
    ))
}

#[async_trait]
impl DocumentStore for LocalFileStore {
    async fn create(&self, id: &str) -> Result<Box<dyn DocumentSink>, StorageError> {
        let final_path = self
            .path_for(id)
            .ok_or_else(|| StorageError::InvalidIdentifier(id.to_string()))?;
        if fs::try_exists(&final_path).await? {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }

        let part_path = self.base_path.join(format!(".{}.part", id));
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&part_path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(id.to_string()),
                _ => StorageError::Io(e),
            })?;

        Ok(Box::new(LocalDocumentSink {
            id: id.to_string(),
            part_path,
            final_path,
            file: Some(file),
            written: 0,
            committed: false,
        }))
    }

    async fn load(&self, id: &str) -> Result<Bytes, StorageError> {
        let path = self
            .path_for(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        match fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(id.to_string())),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, id: &str) -> Result<bool, StorageError> {
        match self.path_for(id) {
            Some(path) => Ok(fs::try_exists(&path).await?),
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StorageError> {
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut documents = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(id) = entry.file_name().into_string() else {
                continue;
            };
            // In-progress uploads
            if id.starts_with('.') {
                continue;
            }
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            documents.push(StoredDocument {
                id,
                path: entry.path(),
                size: metadata.len(),
                modified,
            });
        }

        documents.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
        Ok(documents)
    }
}
