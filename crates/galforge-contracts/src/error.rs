//! Runtime error types for the galforge agent pipeline.
//!
//! Fallible operations return `GalforgeResult<T>`. Extraction and validation
//! failures are recovered inside the executor and never surface here; what
//! does surface is either a configuration bug or a backend that stayed down
//! for the whole retry budget.

use thiserror::Error;

/// The unified error type for the galforge runtime.
#[derive(Debug, Error)]
pub enum GalforgeError {
    /// The backend kept failing until the agent's retry budget ran out.
    ///
    /// This is the only error class allowed to terminate a pipeline run.
    #[error("backend call for agent '{agent}' failed after {attempts} attempt(s): {message}")]
    Transport {
        agent: String,
        attempts: u32,
        message: String,
    },

    /// A prompt template could not be rendered with the supplied inputs.
    #[error("prompt template for agent '{agent}' failed to render: {reason}")]
    Template { agent: String, reason: String },

    /// An `AgentSpec` or producer graph violates a construction invariant.
    #[error("invalid agent specification: {reason}")]
    InvalidSpec { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A validated agent output could not be decoded into its typed form.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },

    /// The audit writer could not persist a record.
    ///
    /// Treated as fatal: an unaudited revision must not be applied.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },
}

/// Convenience alias used throughout the galforge crates.
pub type GalforgeResult<T> = Result<T, GalforgeError>;

/// No parseable JSON object was found in a backend response.
///
/// `excerpt` holds the first characters of the raw text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (response began: {excerpt:?})")]
pub struct ExtractionError {
    pub reason: String,
    pub excerpt: String,
}

/// The failure raised by a generative backend.
///
/// The message is the only signal the executor inspects; it is matched
/// against the moderation keyword list to decide between backoff and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
