//! Core trait definitions for the galforge execution pipeline.
//!
//! These three traits define every seam the executor talks through:
//!
//! - `Backend`: untrusted generator (usually an LLM endpoint)
//! - `Validator`: trusted checker (decides whether an output is accepted)
//! - `AuditWriter`: trusted sink (records every executor flow)
//!
//! The executor wires them together. Nothing produced by a `Backend` reaches
//! a caller without passing the extractor and the `Validator` first.

use std::sync::Arc;

use galforge_contracts::{
    agent::{AgentSpec, JsonObject},
    backend::BackendRequest,
    error::{BackendError, GalforgeResult},
    execution::AuditRecord,
    verify::ValidationOutcome,
};

/// A generative text backend.
///
/// Implementations are **untrusted**: the returned text may be prose,
/// fenced JSON, malformed JSON, or anything else. Failure is signalled only
/// through the error message, which the executor classifies by keyword.
pub trait Backend: Send + Sync {
    /// Run one completion for `request` and return the raw response text.
    ///
    /// Blocks until the response arrives or the per-call timeout in
    /// `request.config` elapses.
    fn invoke(&self, request: &BackendRequest) -> Result<String, BackendError>;
}

/// The output validator: the gate between extraction and acceptance.
///
/// Implementations interpret the agent's required fields and optional schema
/// generically; no agent carries bespoke validation code.
pub trait Validator: Send + Sync {
    /// Check `output` against `spec.required_fields` and `spec.schema`.
    ///
    /// Return `Err` only when the validator itself is misconfigured (e.g. an
    /// unknown custom rule). An output that fails its checks is
    /// `Ok(ValidationOutcome::Invalid)`.
    fn validate(&self, output: &JsonObject, spec: &AgentSpec) -> GalforgeResult<ValidationOutcome>;
}

/// The audit writer: the immutable record of executor flows.
///
/// Every generation, feedback repair, and global revision produces exactly
/// one `AuditRecord`. A failed write is fatal.
pub trait AuditWriter: Send + Sync {
    /// Append one record to the audit log.
    fn write(&self, record: &AuditRecord) -> GalforgeResult<()>;

    /// Mark a run as complete. Implementations may seal or flush the log.
    fn finalize(&self, run_id: &str) -> GalforgeResult<()>;
}

// Shared handles, so a caller can keep inspecting a component it has
// handed to an executor.

impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn invoke(&self, request: &BackendRequest) -> Result<String, BackendError> {
        (**self).invoke(request)
    }
}

impl<T: Validator + ?Sized> Validator for Arc<T> {
    fn validate(&self, output: &JsonObject, spec: &AgentSpec) -> GalforgeResult<ValidationOutcome> {
        (**self).validate(output, spec)
    }
}

impl<T: AuditWriter + ?Sized> AuditWriter for Arc<T> {
    fn write(&self, record: &AuditRecord) -> GalforgeResult<()> {
        (**self).write(record)
    }

    fn finalize(&self, run_id: &str) -> GalforgeResult<()> {
        (**self).finalize(run_id)
    }
}
