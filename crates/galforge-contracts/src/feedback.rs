//! Defect reports produced by checker agents.
//!
//! An `Issue` points at an already-accepted output and says what is wrong
//! with it. Issues drive both the feedback repair of a single agent and the
//! multi-agent consistency loop.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue severity, ordered `Low < Medium < High < Critical`.
///
/// The ordering is the processing priority: when a prompt can only list
/// some issues, higher severities are kept first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "Low", alias = "LOW", alias = "minor")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM", alias = "moderate")]
    Medium,
    #[serde(alias = "High", alias = "HIGH", alias = "major")]
    High,
    #[serde(alias = "Critical", alias = "CRITICAL", alias = "blocker")]
    Critical,
}

impl Severity {
    /// Marker shown in front of an issue in repair prompts.
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::High => "🟠",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported defect in a previously accepted output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Name of the agent whose output is implicated.
    #[serde(alias = "sourceAgent")]
    pub source_agent: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default, alias = "fixSuggestion")]
    pub fix_suggestion: String,
    /// Optional pointer into the output, e.g. `heroines[1].motivation`.
    #[serde(default, alias = "relatedField", skip_serializing_if = "Option::is_none")]
    pub related_field: Option<String>,
}

impl Issue {
    pub fn new(source_agent: impl Into<String>, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            source_agent: source_agent.into(),
            severity,
            description: description.into(),
            fix_suggestion: String::new(),
            related_field: None,
        }
    }

    pub fn with_fix(mut self, suggestion: impl Into<String>) -> Self {
        self.fix_suggestion = suggestion.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.related_field = Some(field.into());
        self
    }
}

/// The structured output of a checker agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub valid: bool,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl CheckReport {
    /// Issues at or above `threshold`.
    pub fn actionable(&self, threshold: Severity) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.severity >= threshold).collect()
    }

    /// True when the report should trigger another repair round.
    ///
    /// A report marked valid, or one with nothing at or above the
    /// threshold, is treated as converged.
    pub fn is_blocking(&self, threshold: Severity) -> bool {
        !self.valid && self.issues.iter().any(|i| i.severity >= threshold)
    }
}
