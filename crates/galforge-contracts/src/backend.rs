//! Request types for the generative backend seam.
//!
//! A request is a short conversation plus generation parameters. The common
//! case is one system and one user message; the feedback repair flow appends
//! the rejected assistant output and a corrective system message.

use serde::{Deserialize, Serialize};

use crate::agent::AgentSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Global generation parameters, passed straight through to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-call timeout; the runtime has no other cancellation mechanism.
    pub timeout_secs: u64,
    pub json_mode: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: 120,
            json_mode: false,
        }
    }
}

impl GenerationConfig {
    /// Apply an agent's per-agent overrides to the global parameters.
    pub fn resolve_for(&self, spec: &AgentSpec) -> Self {
        Self {
            model: self.model.clone(),
            temperature: spec.temperature.unwrap_or(self.temperature),
            max_tokens: spec.max_tokens.unwrap_or(self.max_tokens),
            timeout_secs: self.timeout_secs,
            json_mode: spec.use_structured_output,
        }
    }
}

/// One backend invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub messages: Vec<ChatMessage>,
    pub config: GenerationConfig,
}

impl BackendRequest {
    /// The plain `system + user` request shape.
    pub fn new(system: impl Into<String>, user: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            config,
        }
    }

    /// Content of the last user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}
