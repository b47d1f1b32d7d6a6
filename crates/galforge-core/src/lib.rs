//! # galforge-core
//!
//! The retry-and-repair execution runtime for galforge agents.
//!
//! This crate provides:
//! - The three seam traits (`Backend`, `Validator`, `AuditWriter`)
//! - The structured output extractor and the moderation error classifier
//! - The `AgentExecutor` that runs generation, feedback repair, and global
//!   revision against one agent spec
//!
//! ## Usage
//!
//! ```rust,ignore
//! use galforge_core::{AgentExecutor, ExecutorSettings, traits::{Backend, Validator, AuditWriter}};
//! ```

pub mod classify;
pub mod diff;
pub mod executor;
pub mod extract;
pub mod prompt;
pub mod traits;

pub use classify::{ErrorClass, ErrorClassifier};
pub use executor::{AgentExecutor, ExecutorSettings, RevisionOutcome};
pub use extract::extract;
