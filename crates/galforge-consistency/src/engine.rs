//! The check / plan / revise loop.

use serde_json::Value;
use tracing::{debug, info, warn};

use galforge_contracts::{
    agent::{AgentSpec, JsonObject, PromptInputs},
    document::Document,
    error::{GalforgeError, GalforgeResult},
    execution::ExecutionResult,
    feedback::CheckReport,
    plan::{ConsistencyConfig, RevisionPlan, RevisionRequest},
};
use galforge_core::{AgentExecutor, RevisionOutcome};

use crate::context::gather_context;
use crate::reconcile::reconcile;
use crate::stage::{stage_order, ProducerStage};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The last report had nothing at or above the blocking severity.
    Converged,
    /// Blocking issues remained after `max_rounds` repair rounds.
    BudgetExhausted,
    /// The planner answered `has_issues: false`.
    PlannerDeclined,
    /// Reconciliation left no agent to revise.
    NothingToRevise,
    /// The checker itself fell back, so no report could be trusted.
    CheckerDegraded,
}

/// One global revision attempted by the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionResult {
    /// Zero-based repair round.
    pub round: u32,
    pub agent: String,
    pub section: String,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    pub document: Document,
    /// The last checker report. Empty when the checker degraded on the
    /// first check.
    pub report: CheckReport,
    /// Repair rounds run.
    pub rounds: u32,
    pub termination: Termination,
    pub revisions: Vec<RevisionResult>,
}

impl Convergence {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

pub struct ConsistencyLoop<'e> {
    executor: &'e AgentExecutor,
    checker: AgentSpec,
    planner: AgentSpec,
    config: ConsistencyConfig,
}

impl<'e> ConsistencyLoop<'e> {
    pub fn new(executor: &'e AgentExecutor, checker: AgentSpec, planner: AgentSpec, config: ConsistencyConfig) -> Self {
        Self {
            executor,
            checker,
            planner,
            config,
        }
    }

    pub fn config(&self) -> &ConsistencyConfig {
        &self.config
    }

    /// Build the sections missing from `initial`, then check and revise
    /// until the document converges or a stop condition is reached.
    ///
    /// `inputs` are shared by every stage, the checker, and the planner.
    /// The checker and planner also receive the whole document as
    /// `document`; the planner additionally receives the blocking `issues`.
    ///
    /// # Errors
    ///
    /// - `InvalidSpec` when the stages cannot be ordered
    /// - anything the executor returns (e.g. `Transport`)
    ///
    /// A checker report that does not decode ends the loop as
    /// `CheckerDegraded`; an undecodable plan ends it as `PlannerDeclined`.
    /// Attach [`check_report_schema`](crate::shape::check_report_schema) and
    /// [`revision_plan_schema`](crate::shape::revision_plan_schema) to the
    /// checker and planner so such output is repaired instead.
    pub fn converge(
        &self,
        stages: &[ProducerStage],
        initial: Document,
        inputs: &PromptInputs,
    ) -> GalforgeResult<Convergence> {
        let order = stage_order(stages)?;
        let mut document = initial;

        for &i in &order {
            let stage = &stages[i];
            if document.contains(&stage.section) {
                debug!(section = %stage.section, "section already present, skipping generation");
                continue;
            }
            let result = self.executor.run(&stage.spec, &stage.inputs(inputs, &document))?;
            if result.is_fallback() {
                warn!(
                    agent = %stage.spec.name,
                    section = %stage.section,
                    "stage fell back, continuing with fallback content"
                );
            }
            document.insert(stage.section.clone(), result.into_output());
        }

        let known: Vec<&str> = stages.iter().map(|s| s.spec.name.as_str()).collect();
        let threshold = self.config.blocking_severity;
        let mut revisions = Vec::new();
        let mut last_report: Option<CheckReport> = None;
        let mut round = 0;

        loop {
            let Some(report) = self.check(&document, inputs)? else {
                warn!(round, checker = %self.checker.name, "checker fell back, stopping the loop");
                return Ok(Convergence {
                    document,
                    report: last_report.unwrap_or(CheckReport {
                        valid: false,
                        issues: Vec::new(),
                    }),
                    rounds: round,
                    termination: Termination::CheckerDegraded,
                    revisions,
                });
            };

            let blocking = report.actionable(threshold).len();
            info!(
                round,
                valid = report.valid,
                issues = report.issues.len(),
                blocking,
                "consistency check complete"
            );

            let stop = if !report.is_blocking(threshold) {
                Some(Termination::Converged)
            } else if round >= self.config.max_rounds {
                Some(Termination::BudgetExhausted)
            } else {
                None
            };
            if let Some(termination) = stop {
                return Ok(self.finish(document, report, round, termination, revisions));
            }

            let plan = self.plan(&document, &report, inputs)?;
            if !plan.has_issues {
                return Ok(self.finish(document, report, round, Termination::PlannerDeclined, revisions));
            }

            let reconciled = reconcile(&plan, &known);
            if reconciled.is_empty() {
                return Ok(self.finish(document, report, round, Termination::NothingToRevise, revisions));
            }

            for modification in reconciled.steps {
                let Some(stage) = stages.iter().find(|s| s.spec.name == modification.agent_name) else {
                    continue;
                };
                let current = document.get(&stage.section).cloned().unwrap_or_default();
                let context = gather_context(
                    &document,
                    stages,
                    &stage.section,
                    &modification.context_from_other_agents,
                );
                let request = RevisionRequest::from_modification(modification, context);

                let applied = match self.executor.revise(&stage.spec, &current, &request)? {
                    RevisionOutcome::Applied(revised) => {
                        document.insert(stage.section.clone(), revised);
                        true
                    }
                    RevisionOutcome::Unchanged { reason } => {
                        warn!(
                            agent = %stage.spec.name,
                            reason = %reason,
                            "revision not applied, keeping the current section"
                        );
                        false
                    }
                };
                revisions.push(RevisionResult {
                    round,
                    agent: stage.spec.name.clone(),
                    section: stage.section.clone(),
                    applied,
                });
            }

            last_report = Some(report);
            round += 1;
        }
    }

    fn finish(
        &self,
        document: Document,
        report: CheckReport,
        rounds: u32,
        termination: Termination,
        revisions: Vec<RevisionResult>,
    ) -> Convergence {
        info!(
            checker = %self.checker.name,
            rounds,
            termination = ?termination,
            revisions = revisions.len(),
            "consistency loop finished"
        );
        Convergence {
            document,
            report,
            rounds,
            termination,
            revisions,
        }
    }

    /// `None` when the checker fell back or its report did not decode.
    fn check(&self, document: &Document, inputs: &PromptInputs) -> GalforgeResult<Option<CheckReport>> {
        let mut inputs = inputs.clone();
        inputs.insert("document".to_string(), document.to_value());

        match self.executor.run(&self.checker, &inputs)? {
            ExecutionResult::Fallback { .. } => Ok(None),
            ExecutionResult::Validated { output, .. } => Ok(decode(&self.checker, output)),
        }
    }

    /// A planner fallback decodes as a declined plan. A plan that does not
    /// decode at all is treated as declined too.
    fn plan(&self, document: &Document, report: &CheckReport, inputs: &PromptInputs) -> GalforgeResult<RevisionPlan> {
        let mut inputs = inputs.clone();
        inputs.insert("document".to_string(), document.to_value());
        inputs.insert(
            "issues".to_string(),
            serde_json::to_value(report.actionable(self.config.blocking_severity)).map_err(|e| {
                GalforgeError::SchemaValidation {
                    reason: format!("failed to encode issues for the planner: {e}"),
                }
            })?,
        );

        let result = self.executor.run(&self.planner, &inputs)?;
        if result.is_fallback() {
            warn!(planner = %self.planner.name, "planner fell back");
        }
        Ok(decode(&self.planner, result.into_output()).unwrap_or_else(RevisionPlan::declined))
    }
}

/// Validated output can still miss the typed shape when the spec carries no
/// schema for it. Logged and reported as `None`.
fn decode<T: serde::de::DeserializeOwned>(spec: &AgentSpec, output: JsonObject) -> Option<T> {
    match serde_json::from_value(Value::Object(output)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(agent = %spec.name, error = %e, "output does not match the expected shape");
            None
        }
    }
}
