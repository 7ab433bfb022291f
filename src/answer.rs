use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::LlmProvider;

pub const TRUNCATION_MARKER: &str = "\n...[truncated]...";

/// Turns a prompt into a user-facing answer. Provider failures come back as
/// answer text, never as an error.
#[derive(Clone)]
pub struct AnswerService {
    provider: Arc<dyn LlmProvider>,
    max_chars: usize,
}

impl AnswerService {
    pub fn new(provider: Arc<dyn LlmProvider>, max_chars: usize) -> Self {
        Self { provider, max_chars }
    }

    pub async fn ask(&self, prompt: &str) -> String {
        let answer = match self.provider.complete(prompt).await {
            Ok(completion) => {
                if let Some(usage) = &completion.usage {
                    info!(
                        "{} answered with {} ({} input / {} output tokens)",
                        self.provider.name(),
                        completion.model,
                        usage.input_tokens,
                        usage.output_tokens
                    );
                }
                completion.content.trim().to_string()
            }
            Err(e) => {
                warn!("{} request failed: {}", self.provider.name(), e);
                format!("Error from OpenAI API: {}", e)
            }
        };

        truncate_answer(answer, self.max_chars)
    }
}

/// Caps `answer` at `max_chars` characters, appending the marker when cut.
pub fn truncate_answer(answer: String, max_chars: usize) -> String {
    let cut = answer.char_indices().nth(max_chars).map(|(idx, _)| idx);
    match cut {
        Some(idx) => {
            let mut truncated = answer;
            truncated.truncate(idx);
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => answer,
    }
}
