//! # galforge-ref-galgame
//!
//! Reference visual-novel pipeline for the galforge runtime.
//!
//! - [`catalog`]: the agent specs (story core, world, cast, plot, two
//!   checkers, planner) and their stage graphs
//! - [`pipeline`]: the two-tier run, outline loop first and full loop second
//! - [`scenarios`]: five scripted walk-throughs of the executor and the loop
//!
//! Scenario data is fictional and hardcoded; no scenario contacts a real
//! model.

pub mod catalog;
pub mod mock_data;
pub mod pipeline;
pub mod scenarios;
