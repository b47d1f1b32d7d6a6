//! The galforge executor: bounded generation with repair.
//!
//! One `AgentExecutor` serves every agent of a run. Each flow follows the
//! same round loop:
//!
//!   Prompt → Backend → Extract → Validate → (accept | repair prompt | backoff)
//!
//! Three flows share the loop:
//!
//! - `run()`                 fresh generation, degrading to the agent's fallback
//! - `redo_with_feedback()`  targeted repair of an accepted output from checker issues
//! - `revise()`              planner-directed rewrite of one document section
//!
//! Moderation refusals are never raised: they back off, retry, and finally
//! degrade. Any other backend failure that outlasts the budget is raised as
//! `GalforgeError::Transport`, the only error that stops a pipeline.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use galforge_contracts::{
    agent::{AgentSpec, JsonObject, PromptInputs, RunId},
    backend::{BackendRequest, ChatMessage, GenerationConfig},
    error::{GalforgeError, GalforgeResult},
    execution::{AuditRecord, DiffEntry, ExecutionResult, FallbackCause, RecordKind, RecordOutcome},
    feedback::Issue,
    plan::RevisionRequest,
    verify::ValidationOutcome,
};

use crate::{
    classify::{ErrorClass, ErrorClassifier},
    diff::structural_diff,
    extract::extract,
    prompt,
    traits::{AuditWriter, Backend, Validator},
};

pub const DEFAULT_MODERATION_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_FEEDBACK_ISSUES: usize = 20;
pub const DEFAULT_REVISION_ROUNDS: u32 = 4;

/// Runtime settings shared by every agent the executor runs.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Global generation parameters; agents override temperature and tokens.
    pub generation: GenerationConfig,
    /// Blocking sleep after a moderation refusal when rounds remain.
    pub moderation_backoff: Duration,
    pub classifier: ErrorClassifier,
    /// Soft cap on issues listed in one feedback prompt.
    pub max_feedback_issues: usize,
    /// Backend calls allowed for one global revision.
    pub revision_rounds: u32,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            moderation_backoff: DEFAULT_MODERATION_BACKOFF,
            classifier: ErrorClassifier::default(),
            max_feedback_issues: DEFAULT_MAX_FEEDBACK_ISSUES,
            revision_rounds: DEFAULT_REVISION_ROUNDS,
        }
    }
}

/// Result of a planner-directed revision.
#[derive(Debug, Clone, PartialEq)]
pub enum RevisionOutcome {
    /// The revised section validated and should replace the old one.
    Applied(JsonObject),
    /// Every round failed; the caller keeps the section it already has.
    Unchanged { reason: String },
}

/// What one backend round produced.
enum Round {
    Accepted(JsonObject),
    Rejected {
        reason: String,
        /// Raw response text, used as the assistant turn in feedback repair.
        raw: String,
        /// Text quoted back to the backend in the next repair prompt.
        previous: String,
    },
    Filtered(String),
    Failed(String),
}

/// The failure of the most recent round, kept for budget exhaustion.
enum LastFailure {
    Rejected(String),
    Filtered(String),
    Failed(String),
}

/// The most recent rejected output, kept for repair prompts.
struct Rejection {
    reason: String,
    previous: String,
}

pub struct AgentExecutor {
    backend: Box<dyn Backend>,
    validator: Box<dyn Validator>,
    audit: Box<dyn AuditWriter>,
    settings: ExecutorSettings,
    run_id: RunId,
}

impl AgentExecutor {
    pub fn new(
        backend: Box<dyn Backend>,
        validator: Box<dyn Validator>,
        audit: Box<dyn AuditWriter>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            backend,
            validator,
            audit,
            settings,
            run_id: RunId::new(),
        }
    }

    /// Use `run_id` instead of a freshly generated one, e.g. to match the
    /// id an audit writer was created with.
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Seal the audit log for this executor's run.
    pub fn finish(&self) -> GalforgeResult<()> {
        info!(run_id = %self.run_id, "finalizing audit log");
        self.audit.finalize(&self.run_id.to_string())
    }

    /// Generate one validated output for `spec`.
    ///
    /// # Rounds
    ///
    /// Round 0 sends the rendered system and human prompts. A later round
    /// sends a repair prompt quoting the last rejected output and its reason,
    /// or the fresh prompt again when no output has been rejected yet. At
    /// most `spec.max_fix_rounds` backend calls are made.
    ///
    /// # Errors
    ///
    /// `Template` if a prompt fails to render (before any backend call) and
    /// `Transport` if the final round failed with a non-moderation error.
    /// Exhausted validation and moderation refusals return
    /// `ExecutionResult::Fallback` instead.
    pub fn run(&self, spec: &AgentSpec, inputs: &PromptInputs) -> GalforgeResult<ExecutionResult> {
        spec.validate()?;
        let config = self.settings.generation.resolve_for(spec);
        let system = prompt::render(&spec.name, &spec.system_prompt, inputs)?;
        let human = prompt::render(&spec.name, &spec.human_prompt_template, inputs)?;

        debug!(
            run_id = %self.run_id,
            agent = %spec.name,
            budget = spec.max_fix_rounds,
            "generation starting"
        );

        let mut rejection: Option<Rejection> = None;
        let mut last: Option<LastFailure> = None;

        for round in 0..spec.max_fix_rounds {
            let attempts = round + 1;
            let request = match &rejection {
                Some(r) if round > 0 => BackendRequest::new(
                    prompt::REPAIR_SYSTEM_PROMPT,
                    prompt::repair_prompt(&r.reason, &r.previous, &spec.required_fields),
                    config.clone(),
                ),
                _ => BackendRequest::new(system.clone(), human.clone(), config.clone()),
            };

            match self.round(spec, &request)? {
                Round::Accepted(output) => {
                    info!(agent = %spec.name, attempts, "output validated");
                    self.record(spec, RecordKind::Generation, RecordOutcome::Validated, attempts, Vec::new())?;
                    return Ok(ExecutionResult::Validated { output, attempts });
                }
                Round::Rejected { reason, previous, .. } => {
                    warn!(agent = %spec.name, round, reason = %reason, "output rejected");
                    last = Some(LastFailure::Rejected(reason.clone()));
                    rejection = Some(Rejection { reason, previous });
                }
                Round::Filtered(message) => {
                    self.back_off(spec, round, spec.max_fix_rounds, &message);
                    last = Some(LastFailure::Filtered(message));
                }
                Round::Failed(message) => {
                    warn!(agent = %spec.name, round, error = %message, "backend call failed");
                    last = Some(LastFailure::Failed(message));
                }
            }
        }

        let attempts = spec.max_fix_rounds;
        let cause = match last {
            Some(LastFailure::Failed(message)) => {
                return Err(GalforgeError::Transport {
                    agent: spec.name.clone(),
                    attempts,
                    message,
                });
            }
            Some(LastFailure::Filtered(message)) => FallbackCause::ContentFiltered { message },
            Some(LastFailure::Rejected(last_reason)) => FallbackCause::ValidationExhausted { last_reason },
            None => FallbackCause::ValidationExhausted {
                last_reason: "no rounds were run".to_string(),
            },
        };

        warn!(agent = %spec.name, attempts, cause = ?cause, "budget exhausted, returning fallback");
        self.record(spec, RecordKind::Generation, RecordOutcome::Fallback, attempts, Vec::new())?;
        Ok(ExecutionResult::Fallback {
            output: spec.marked_fallback(),
            cause,
            attempts,
        })
    }

    /// Repair an accepted output from checker issues.
    ///
    /// Returns the repaired output when a round validates, otherwise
    /// `previous` unchanged. A rejected round appends the rejected text and a
    /// corrective system message to the conversation before the next call.
    ///
    /// # Errors
    ///
    /// `Transport` if the final round failed with a non-moderation error.
    pub fn redo_with_feedback(
        &self,
        spec: &AgentSpec,
        previous: &JsonObject,
        issues: &[Issue],
    ) -> GalforgeResult<JsonObject> {
        spec.validate()?;
        if issues.is_empty() {
            debug!(agent = %spec.name, "no issues reported, keeping output");
            return Ok(previous.clone());
        }

        let selection = prompt::select_issues(issues, &spec.name, self.settings.max_feedback_issues);
        if selection.omitted > 0 {
            debug!(agent = %spec.name, omitted = selection.omitted, "issue list truncated");
        }

        let config = self.settings.generation.resolve_for(spec);
        let mut messages = vec![
            ChatMessage::system(prompt::REVISION_SYSTEM_PROMPT),
            ChatMessage::user(prompt::feedback_prompt(previous, &selection)),
        ];
        let mut last: Option<LastFailure> = None;

        for round in 0..spec.max_redo_rounds {
            let attempts = round + 1;
            let request = BackendRequest {
                messages: messages.clone(),
                config: config.clone(),
            };

            match self.round(spec, &request)? {
                Round::Accepted(output) => {
                    let changes = self.log_changes(spec, previous, &output);
                    self.record(spec, RecordKind::FeedbackRedo, RecordOutcome::Validated, attempts, changes)?;
                    return Ok(output);
                }
                Round::Rejected { reason, raw, .. } => {
                    warn!(agent = %spec.name, round, reason = %reason, "feedback repair rejected");
                    messages.push(ChatMessage::assistant(raw));
                    messages.push(ChatMessage::system(prompt::corrective_message(&reason)));
                    last = Some(LastFailure::Rejected(reason));
                }
                Round::Filtered(message) => {
                    self.back_off(spec, round, spec.max_redo_rounds, &message);
                    last = Some(LastFailure::Filtered(message));
                }
                Round::Failed(message) => {
                    warn!(agent = %spec.name, round, error = %message, "backend call failed");
                    last = Some(LastFailure::Failed(message));
                }
            }
        }

        if let Some(LastFailure::Failed(message)) = last {
            return Err(GalforgeError::Transport {
                agent: spec.name.clone(),
                attempts: spec.max_redo_rounds,
                message,
            });
        }

        warn!(agent = %spec.name, "feedback repair exhausted, keeping previous output");
        self.record(
            spec,
            RecordKind::FeedbackRedo,
            RecordOutcome::Unchanged,
            spec.max_redo_rounds,
            Vec::new(),
        )?;
        Ok(previous.clone())
    }

    /// Rewrite one document section as a planner directed.
    ///
    /// Validation uses the agent's own contract. Up to
    /// `settings.revision_rounds` calls are made; rounds after a rejection
    /// send a field-completeness repair prompt.
    ///
    /// # Errors
    ///
    /// `Transport` if the final round failed with a non-moderation error.
    pub fn revise(
        &self,
        spec: &AgentSpec,
        current: &JsonObject,
        request: &RevisionRequest,
    ) -> GalforgeResult<RevisionOutcome> {
        spec.validate()?;
        let budget = self.settings.revision_rounds.max(1);
        let config = self.settings.generation.resolve_for(spec);

        let mut rejection: Option<Rejection> = None;
        let mut last: Option<LastFailure> = None;

        for round in 0..budget {
            let attempts = round + 1;
            let user = match &rejection {
                Some(r) => prompt::completeness_repair_prompt(&r.reason, &r.previous, request, &spec.required_fields),
                None => prompt::revision_prompt(current, request),
            };
            let backend_request = BackendRequest::new(prompt::REVISION_SYSTEM_PROMPT, user, config.clone());

            match self.round(spec, &backend_request)? {
                Round::Accepted(output) => {
                    let changes = self.log_changes(spec, current, &output);
                    self.record(spec, RecordKind::GlobalRevision, RecordOutcome::Validated, attempts, changes)?;
                    return Ok(RevisionOutcome::Applied(output));
                }
                Round::Rejected { reason, previous, .. } => {
                    warn!(agent = %spec.name, round, reason = %reason, "revision rejected");
                    last = Some(LastFailure::Rejected(reason.clone()));
                    rejection = Some(Rejection { reason, previous });
                }
                Round::Filtered(message) => {
                    self.back_off(spec, round, budget, &message);
                    last = Some(LastFailure::Filtered(message));
                }
                Round::Failed(message) => {
                    warn!(agent = %spec.name, round, error = %message, "backend call failed");
                    last = Some(LastFailure::Failed(message));
                }
            }
        }

        let reason = match last {
            Some(LastFailure::Failed(message)) => {
                return Err(GalforgeError::Transport {
                    agent: spec.name.clone(),
                    attempts: budget,
                    message,
                });
            }
            Some(LastFailure::Filtered(message)) => format!("content filtered: {message}"),
            Some(LastFailure::Rejected(reason)) => reason,
            None => "no rounds were run".to_string(),
        };

        warn!(agent = %spec.name, reason = %reason, "revision exhausted, keeping section");
        self.record(spec, RecordKind::GlobalRevision, RecordOutcome::Unchanged, budget, Vec::new())?;
        Ok(RevisionOutcome::Unchanged { reason })
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// One backend call followed by extraction and validation.
    fn round(&self, spec: &AgentSpec, request: &BackendRequest) -> GalforgeResult<Round> {
        let raw = match self.backend.invoke(request) {
            Ok(text) => text,
            Err(e) => {
                return Ok(match self.settings.classifier.classify(&e.message) {
                    ErrorClass::ContentFilter => Round::Filtered(e.message),
                    ErrorClass::Transport => Round::Failed(e.message),
                });
            }
        };

        let output = match extract(&raw) {
            Ok(output) => output,
            Err(e) => {
                return Ok(Round::Rejected {
                    reason: e.reason,
                    previous: raw.clone(),
                    raw,
                });
            }
        };

        match self.validator.validate(&output, spec)? {
            ValidationOutcome::Valid => Ok(Round::Accepted(output)),
            ValidationOutcome::Invalid { reason } => Ok(Round::Rejected {
                reason,
                previous: prompt::pretty_json(&output),
                raw,
            }),
        }
    }

    /// Sleep after a moderation refusal unless this was the last round.
    fn back_off(&self, spec: &AgentSpec, round: u32, budget: u32, message: &str) {
        warn!(agent = %spec.name, round, error = %message, "backend refused content");
        if round + 1 < budget && !self.settings.moderation_backoff.is_zero() {
            std::thread::sleep(self.settings.moderation_backoff);
        }
    }

    fn log_changes(&self, spec: &AgentSpec, before: &JsonObject, after: &JsonObject) -> Vec<DiffEntry> {
        let changes = structural_diff(before, after);
        if changes.is_empty() {
            info!(agent = %spec.name, "repair validated with no structural changes");
        }
        for change in &changes {
            info!(agent = %spec.name, "{change}");
        }
        changes
    }

    fn record(
        &self,
        spec: &AgentSpec,
        kind: RecordKind,
        outcome: RecordOutcome,
        attempts: u32,
        changes: Vec<DiffEntry>,
    ) -> GalforgeResult<()> {
        self.audit.write(&AuditRecord {
            agent: spec.name.clone(),
            kind,
            outcome,
            attempts,
            changes,
            timestamp: Utc::now(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
