use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::llm::{models::{Completion, Usage}, LlmError, LlmProvider};

/// OpenAI Responses API client (`POST {base_url}/responses`).
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let model = self.default_model.as_str();

        let body = json!({
            "model": model,
            "input": prompt,
        });

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Err(LlmError::Api(format!("OpenAI Error {}: {}", status, error_message(&text))));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = output_text(&json)
            .ok_or_else(|| LlmError::InvalidResponse("response carried no output text".to_string()))?;

        let usage = json.get("usage").map(|u| Usage {
            input_tokens: token_count(&u["input_tokens"]),
            output_tokens: token_count(&u["output_tokens"]),
        });

        Ok(Completion {
            content,
            model: json["model"].as_str().unwrap_or(model).to_string(),
            usage,
        })
    }
}

/// Concatenates every `output_text` part of every message in `output`.
/// Some compatible servers also send the SDK's flattened `output_text` field.
fn output_text(json: &Value) -> Option<String> {
    if let Some(text) = json["output_text"].as_str() {
        return Some(text.to_string());
    }

    let parts: Vec<&str> = json["output"]
        .as_array()?
        .iter()
        .filter(|item| item["type"] == "message")
        .filter_map(|item| item["content"].as_array())
        .flatten()
        .filter(|part| part["type"] == "output_text")
        .filter_map(|part| part["text"].as_str())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

/// Absent counts read as zero; counts beyond `u32` saturate.
fn token_count(value: &Value) -> u32 {
    value.as_u64().map(|n| u32::try_from(n).unwrap_or(u32::MAX)).unwrap_or(0)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
