//! # galforge-config
//!
//! TOML runtime configuration for the galforge pipeline.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use galforge_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_file(Path::new("galforge.toml"))?;
//! let executor = AgentExecutor::new(backend, validator, audit, config.executor_settings());
//! let cast = config.apply_overrides(catalog::characters());
//! ```
//!
//! Every value has a default, so a missing section keeps the built-in
//! budgets. Per-agent overrides live under `[agents.<name>]`.

pub mod loader;
pub mod schema;

pub use schema::{AgentOverride, BackendSection, ConsistencySection, RetrySection, RuntimeConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
