//! # galforge-consistency
//!
//! The consistency-repair control loop.
//!
//! A pipeline is a set of [`ProducerStage`]s, each owning one section of the
//! story [`Document`](galforge_contracts::document::Document). The loop:
//!
//! 1. builds any missing sections, stages in dependency order
//! 2. asks a checker agent for a `CheckReport` over the whole document
//! 3. stops when nothing at or above the blocking severity remains, or the
//!    round budget is spent
//! 4. asks a planner agent for a `RevisionPlan`, reconciles it, and runs
//!    one global revision per planned agent
//! 5. goes back to 2
//!
//! Running the loop twice with different checkers (outline first, full
//! document second) gives the two-tier check: the second call only builds
//! the sections the first one did not.

pub mod context;
pub mod engine;
pub mod reconcile;
pub mod shape;
pub mod stage;

pub use engine::{ConsistencyLoop, Convergence, RevisionResult, Termination};
pub use shape::{check_report_schema, revision_plan_schema};
pub use stage::ProducerStage;
