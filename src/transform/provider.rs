//! Chat-completion provider used by the transform service.
//!
//! Calls are blocking (`ureq`); the dispatcher runs them on a background
//! thread so no surface loop ever waits on the network.

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;

use crate::config::TransformConfig;

const REFERER: &str = "https://grammary.app";
const APP_TITLE: &str = "Grammary App";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// The backend refused the request and said why.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ServiceFailure {
    pub status: Option<u16>,
    pub message: String,
}

pub trait ChatProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Send `messages` and return the first choice's text.
    ///
    /// The API key is passed per call and must never be logged.
    fn complete(&self, messages: &[ChatMessage], api_key: &str) -> Result<String>;
}

/// OpenRouter's OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenRouterProvider {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

/// Pull the completion text out of a response body.
///
/// `{"choices": [{"message": {"content": "..."}}]}`, or an
/// `{"error": {"message": "..."}}` object, which some gateways send with a
/// 200 status.
pub fn parse_completion(json: &serde_json::Value) -> Result<String> {
    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        let status = error
            .get("code")
            .and_then(|c| c.as_u64())
            .and_then(|c| u16::try_from(c).ok());
        return Err(ServiceFailure { status, message }.into());
    }

    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .context("Response contained no completion text")
}

impl ChatProvider for OpenRouterProvider {
    fn provider_id(&self) -> &str {
        "openrouter"
    }

    fn complete(&self, messages: &[ChatMessage], api_key: &str) -> Result<String> {
        let body = self.build_request_body(messages);

        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "Sending request to OpenRouter"
        );

        let response = match ureq::post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", api_key))
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .send_json(&body)
        {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(status)) => {
                return Err(ServiceFailure {
                    status: Some(status),
                    message: format!("OpenRouter API error: HTTP {}", status),
                }
                .into());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context("Failed to send request to OpenRouter"))
            }
        };

        let response_json: serde_json::Value = response
            .into_body()
            .read_json()
            .context("Failed to parse OpenRouter response")?;

        let content = parse_completion(&response_json)?;

        tracing::debug!(content_len = content.len(), "Received OpenRouter response");

        Ok(content)
    }
}
