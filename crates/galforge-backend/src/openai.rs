//! OpenAI-compatible chat-completions backend.
//!
//! Request building and response parsing are plain functions so they can be
//! tested without a server. Provider error bodies are passed through in the
//! `BackendError` message: moderation refusals are usually reported there,
//! and the executor's classifier needs to see them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use galforge_contracts::{
    backend::{BackendRequest, ChatMessage},
    error::{BackendError, GalforgeError, GalforgeResult},
};
use galforge_core::traits::Backend;

/// Characters of an error response body kept in a `BackendError`.
const ERROR_BODY_CHARS: usize = 1_000;

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Build the JSON body for one request.
pub fn build_body(request: &BackendRequest) -> ChatCompletionRequest<'_> {
    ChatCompletionRequest {
        model: &request.config.model,
        messages: &request.messages,
        temperature: request.config.temperature,
        max_tokens: request.config.max_tokens,
        response_format: request
            .config
            .json_mode
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

/// Pull the assistant text out of a successful response body.
pub fn parse_completion(body: &str) -> Result<String, BackendError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::new(format!("failed to parse completion response: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::new("completion response contained no choices"))?;

    // Some providers report a filtered completion as a normal response.
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(BackendError::new("completion stopped by content_filter"));
    }

    choice
        .message
        .content
        .ok_or_else(|| BackendError::new("completion choice had no message content"))
}

// ── Backend ──────────────────────────────────────────────────────────────────

/// A blocking client for `{base_url}/chat/completions`.
pub struct ChatCompletionsBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ChatCompletionsBackend {
    /// # Errors
    ///
    /// Returns `GalforgeError::ConfigError` if the HTTP client cannot be
    /// built (e.g. the TLS backend fails to initialise).
    pub fn new(base_url: &str, api_key: Option<String>) -> GalforgeResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| GalforgeError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint(base_url),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

impl Backend for ChatCompletionsBackend {
    fn invoke(&self, request: &BackendRequest) -> Result<String, BackendError> {
        let body = build_body(request);
        debug!(
            endpoint = %self.endpoint,
            model = %request.config.model,
            messages = request.messages.len(),
            json_mode = request.config.json_mode,
            "sending chat completion request"
        );

        let mut http = self
            .client
            .post(&self.endpoint)
            .timeout(Duration::from_secs(request.config.timeout_secs))
            .json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().map_err(|e| {
            error!(error = %e, "chat completion request failed");
            BackendError::new(format!("request failed: {e}"))
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| BackendError::new(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            error!(%status, "backend returned an error status");
            let excerpt: String = text.chars().take(ERROR_BODY_CHARS).collect();
            return Err(BackendError::new(format!("backend returned {status}: {excerpt}")));
        }

        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use galforge_contracts::backend::{BackendRequest, GenerationConfig};

    use super::*;

    fn request(json_mode: bool) -> BackendRequest {
        BackendRequest::new(
            "You design visual novels.",
            "Idea: summer festival",
            GenerationConfig {
                model: "gpt-4o-mini".to_string(),
                temperature: 0.5,
                max_tokens: 1024,
                timeout_secs: 30,
                json_mode,
            },
        )
    }

    #[test]
    fn test_body_matches_chat_completions_shape() {
        let req = request(false);
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "You design visual novels." },
                    { "role": "user", "content": "Idea: summer festival" }
                ],
                "temperature": 0.5,
                "max_tokens": 1024
            })
        );
    }

    #[test]
    fn test_json_mode_adds_response_format() {
        let req = request(true);
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(body["response_format"], json!({ "type": "json_object" }));
    }

    #[test]
    fn test_parse_returns_first_choice_content() {
        let body = r#"{"id": "x", "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "{\"genre\": \"romance\"}"}, "finish_reason": "stop"}
        ]}"#;
        assert_eq!(parse_completion(body).unwrap(), r#"{"genre": "romance"}"#);
    }

    #[test]
    fn test_parse_rejects_empty_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(err.message.contains("no choices"));
    }

    #[test]
    fn test_filtered_finish_reason_mentions_content_filter() {
        let body = r#"{"choices": [{"message": {"content": null}, "finish_reason": "content_filter"}]}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(err.message.contains("content_filter"));
    }

    #[test]
    fn test_parse_rejects_non_json_body() {
        assert!(parse_completion("<html>bad gateway</html>").is_err());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("http://localhost:8080/v1/"), "http://localhost:8080/v1/chat/completions");
        assert_eq!(endpoint("https://api.openai.com/v1"), "https://api.openai.com/v1/chat/completions");
    }
}
