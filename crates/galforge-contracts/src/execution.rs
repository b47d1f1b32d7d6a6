//! Execution results and audit records.
//!
//! `ExecutionResult` is what the executor returns from one `run()`.
//! `AuditRecord` is what gets written to the audit log, one per
//! generation, feedback repair, or global revision.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::JsonObject;

/// The outcome of one Agent Execution Core run.
///
/// There is no partially validated variant: an output either passed
/// validation or is the agent's explicitly marked fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The output passed every required-field and schema check.
    Validated { output: JsonObject, attempts: u32 },

    /// Generation degraded to the agent's safe default.
    ///
    /// `output` always carries `"fallback": true`.
    Fallback {
        output: JsonObject,
        cause: FallbackCause,
        attempts: u32,
    },
}

impl ExecutionResult {
    pub fn output(&self) -> &JsonObject {
        match self {
            Self::Validated { output, .. } | Self::Fallback { output, .. } => output,
        }
    }

    pub fn into_output(self) -> JsonObject {
        match self {
            Self::Validated { output, .. } | Self::Fallback { output, .. } => output,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Validated { attempts, .. } | Self::Fallback { attempts, .. } => *attempts,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// True when the fallback was caused by backend content moderation.
    pub fn is_filtered(&self) -> bool {
        matches!(
            self,
            Self::Fallback {
                cause: FallbackCause::ContentFiltered { .. },
                ..
            }
        )
    }
}

/// Why an execution fell back to the safe default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackCause {
    /// Every round produced unparseable or invalid output.
    ValidationExhausted { last_reason: String },
    /// The backend's moderation layer refused the final round.
    ContentFiltered { message: String },
}

/// One line of a structural diff between two outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Dotted path of the changed value, e.g. `heroines[1]` or `world.era`.
    pub path: String,
    pub change: DiffChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiffChange {
    Added { new: Value },
    Removed { old: Value },
    Changed { old: Value, new: Value },
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            DiffChange::Added { new } => write!(f, "+ {}: {}", self.path, new),
            DiffChange::Removed { old } => write!(f, "- {}: {}", self.path, old),
            DiffChange::Changed { old, new } => write!(f, "~ {}: {} -> {}", self.path, old, new),
        }
    }
}

/// Which executor flow produced an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Generation,
    FeedbackRedo,
    GlobalRevision,
}

/// What the flow did to the agent's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordOutcome {
    /// A newly validated output was produced.
    Validated,
    /// The agent degraded to its fallback value.
    Fallback,
    /// A repair failed and the previous output was kept.
    Unchanged,
}

/// An immutable record of one executor flow, written to the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub agent: String,
    pub kind: RecordKind,
    pub outcome: RecordOutcome,
    /// Backend calls spent by the flow.
    pub attempts: u32,
    /// Structural changes against the previous output. Empty for fresh
    /// generations and for repairs that were not applied.
    pub changes: Vec<DiffEntry>,
    /// Wall-clock time the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}
