use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::storage::{DocumentSink, DocumentStorePtr, StorageError, UploadedFile};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file part")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("Invalid file type")]
    InvalidFileType,
    #[error("File exceeds maximum size of {0} bytes")]
    TooLarge(usize),
    #[error("Invalid multipart payload: {0}")]
    Multipart(String),
    #[error("Failed to store file: {0}")]
    Storage(#[from] StorageError),
}

/// Validates incoming files and hands them to the document store under a
/// freshly generated identifier.
#[derive(Clone)]
pub struct UploadService {
    store: DocumentStorePtr,
    allowed_extensions: Vec<String>,
    max_file_size: usize,
}

impl UploadService {
    pub fn new(store: DocumentStorePtr, config: &StorageConfig) -> Self {
        Self {
            store,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
        }
    }

    /// Checks the client-supplied name before any bytes are read.
    pub fn validate_name(&self, original_name: &str) -> Result<(), UploadError> {
        if original_name.is_empty() {
            return Err(UploadError::NoSelectedFile);
        }
        if !allowed_file(original_name, &self.allowed_extensions) {
            return Err(UploadError::InvalidFileType);
        }
        Ok(())
    }

    /// Validates the name and opens a document under a fresh identifier.
    /// Content is then fed in chunks through the returned `PendingUpload`.
    pub async fn begin(&self, original_name: &str) -> Result<PendingUpload, UploadError> {
        self.validate_name(original_name)?;

        let id = generate_identifier(original_name);
        let sink = self.store.create(&id).await?;

        Ok(PendingUpload {
            id,
            original_name: original_name.to_string(),
            sink,
            received: 0,
            limit: self.max_file_size,
        })
    }

    pub async fn store(&self, original_name: &str, content: Bytes) -> Result<UploadedFile, UploadError> {
        let mut pending = self.begin(original_name).await?;
        pending.write(&content).await?;
        pending.finish().await
    }
}

/// An upload in progress. Dropping it before `finish` discards the partial
/// document.
pub struct PendingUpload {
    id: String,
    original_name: String,
    sink: Box<dyn DocumentSink>,
    received: usize,
    limit: usize,
}

impl PendingUpload {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.received + chunk.len() > self.limit {
            return Err(UploadError::TooLarge(self.limit));
        }
        self.sink.write(chunk).await?;
        self.received += chunk.len();
        Ok(())
    }

    pub async fn finish(mut self) -> Result<UploadedFile, UploadError> {
        let stored = self.sink.commit().await?;
        info!("Uploaded {} as {} ({} bytes)", self.original_name, self.id, stored.size);

        Ok(UploadedFile {
            id: self.id,
            stored_path: stored.path,
            original_name: self.original_name,
        })
    }
}

/// `<128-bit random hex>_<sanitized name>`
pub fn generate_identifier(original_name: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(original_name))
}

pub fn allowed_file(filename: &str, allowed_extensions: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            allowed_extensions.iter().any(|allowed| *allowed == ext)
        }
        None => false,
    }
}

/// Reduces a client-supplied file name to a safe single path component.
/// Accented letters are decomposed and keep their ASCII base letter.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let mut output = String::with_capacity(base.len());
    for word in base.split_whitespace() {
        if !output.is_empty() {
            output.push('_');
        }
        output.extend(
            word.nfkd()
                .filter(|ch| ch.is_ascii_alphanumeric() || matches!(*ch, '_' | '-' | '.')),
        );
    }

    let trimmed = output.trim_matches(|c: char| c == '.' || c == '_');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}
