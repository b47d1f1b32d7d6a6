//! # galforge-verify
//!
//! Output validation for the galforge runtime.
//!
//! This crate provides [`engine::SchemaValidator`], which implements the
//! [`galforge_core::traits::Validator`] trait. It checks agent outputs in
//! two tiers, stopping after the first tier that fails:
//!
//! 1. **Required fields**: every path in `AgentSpec::required_fields` must
//!    resolve to a non-empty value. All missing paths are reported together.
//! 2. **Schema**: JSON Schema validation via the `jsonschema` crate, then the
//!    declarative rules (`AllowedValues`, `NumberRange`, `MinItems`,
//!    `Custom`). Every violation is aggregated into one reason.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use galforge_verify::engine::SchemaValidator;
//!
//! let mut validator = SchemaValidator::new();
//! validator.register_rule("distinct-names", Box::new(|output| {
//!     // Return Some(message) to reject.
//!     None
//! }));
//! ```

pub mod engine;
pub mod path;

pub use engine::SchemaValidator;
