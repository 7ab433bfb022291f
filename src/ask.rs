use serde::{Deserialize, Serialize};
use tracing::info;

use crate::answer::AnswerService;
use crate::documents::load_documents;
use crate::prompt::compose_prompt;
use crate::storage::DocumentStorePtr;

pub const MISSING_INPUT_ANSWER: &str = "Missing question or files.";
pub const NO_CONTENT_ANSWER: &str = "No content found in uploaded files.";

/// Question answering over uploaded documents: validate, load, compose, ask.
/// Every outcome is an answer string.
#[derive(Clone)]
pub struct AskService {
    store: DocumentStorePtr,
    answers: AnswerService,
}

impl AskService {
    pub fn new(store: DocumentStorePtr, answers: AnswerService) -> Self {
        Self { store, answers }
    }

    pub async fn ask(&self, question: &str, file_ids: &[String]) -> String {
        if question.trim().is_empty() || file_ids.is_empty() {
            return MISSING_INPUT_ANSWER.to_string();
        }

        let docs = load_documents(self.store.as_ref(), file_ids).await;
        if docs.is_empty() {
            return NO_CONTENT_ANSWER.to_string();
        }

        info!("Answering question over {}/{} documents", docs.len(), file_ids.len());
        let prompt = compose_prompt(&docs, question);
        self.answers.ask(&prompt).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of a conversation transcript. Transcripts live only in the
/// client; nothing here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}
