use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::web::models::Message;

// Fixed output cap sent with every request. Some LLM servers apply internal
// caps regardless of what we send.
pub const MAX_OUTPUT_TOKENS: usize = 512;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);
const TOP_P: f32 = 0.95;

/// Raw outcome of a single upstream attempt, before classification. Only
/// `RateLimited` is ever retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    RateLimited,
    Rejected { status: u16, message: Option<String> },
    Unreachable(String),
    Malformed(String),
}

/// Seam between the retry executor and the network. The production
/// implementation is `UpstreamClient`; tests substitute scripted stubs.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<String, UpstreamError>;
}

// A wrapper for the upstream chat-completions API
pub struct UpstreamClient {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl UpstreamClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }
}

#[async_trait]
impl ChatBackend for UpstreamClient {
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<String, UpstreamError> {
        // Using the OpenAI-compatible API endpoint
        let url = format!("{}/v1/chat/completions", self.base_url);

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "top_p": TOP_P,
            "max_tokens": MAX_OUTPUT_TOKENS
        });
        debug!("Upstream payload: {}", payload);

        // Timeouts and connection failures surface here with no response.
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        debug!("Upstream response: {}", body);

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| {
                UpstreamError::Malformed("no content in upstream response".to_string())
            })?;
        Ok(content.to_string())
    }
}

// Upstream error bodies carry a human-readable message at error.message;
// anything else in the body is dropped.
fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_is_pulled_from_the_error_envelope() {
        let body = r#"{"error": {"message": "invalid api key", "type": "auth"}}"#;
        assert_eq!(
            extract_error_message(body),
            Some("invalid api key".to_string())
        );
    }

    #[test]
    fn bodies_without_an_envelope_yield_nothing() {
        assert_eq!(extract_error_message("upstream exploded"), None);
        assert_eq!(extract_error_message(r#"{"detail": "nope"}"#), None);
        assert_eq!(extract_error_message(""), None);
    }
}
