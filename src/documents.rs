use tracing::{debug, warn};

use crate::storage::{DocumentStore, StorageError};

/// Loads the text of each identifier in order. Identifiers that cannot be
/// resolved are skipped; the result may be empty.
pub async fn load_documents<S>(store: &S, ids: &[String]) -> Vec<String>
where
    S: DocumentStore + ?Sized,
{
    let mut docs = Vec::with_capacity(ids.len());

    for id in ids {
        match store.load(id).await {
            Ok(content) => docs.push(String::from_utf8_lossy(&content).into_owned()),
            Err(StorageError::NotFound(_)) => debug!("Skipping unknown document {}", id),
            Err(e) => warn!("Skipping unreadable document {}: {}", id, e),
        }
    }

    docs
}
