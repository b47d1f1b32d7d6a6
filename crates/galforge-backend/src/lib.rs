//! # galforge-backend
//!
//! Concrete [`Backend`](galforge_core::traits::Backend) implementations.
//!
//! - [`ChatCompletionsBackend`] posts to any OpenAI-compatible
//!   `/chat/completions` endpoint with a blocking `reqwest` client.
//! - [`ScriptedBackend`] replays a fixed list of replies and failures and
//!   records every request, for scenarios and tests.

pub mod openai;
pub mod scripted;

pub use openai::ChatCompletionsBackend;
pub use scripted::{ScriptStep, ScriptedBackend};
