//! galforge demo CLI
//!
//! Runs the scripted reference scenarios, or generates a story document
//! against a live OpenAI-compatible endpoint.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- repair-round
//!   cargo run -p demo -- generate --idea "a lighthouse keeper's last summer" --out story.json

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use galforge_audit::InMemoryAuditWriter;
use galforge_backend::ChatCompletionsBackend;
use galforge_config::RuntimeConfig;
use galforge_contracts::{
    agent::RunId,
    error::{GalforgeError, GalforgeResult},
};
use galforge_core::AgentExecutor;
use galforge_ref_galgame::{
    pipeline::generate_story,
    scenarios::{clean_generation, consistency_loop, content_filter, feedback_redo, repair_round},
};
use galforge_verify::SchemaValidator;

// ── CLI definition ────────────────────────────────────────────────────────────

/// galforge: validated multi-agent visual novel generation.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "galforge reference pipeline demo",
    long_about = "Runs the scripted galforge scenarios (extraction, repair rounds, content\n\
                  filtering, feedback redo, consistency loop) or a live story generation."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all five scripted scenarios in sequence.
    RunAll,
    /// Scenario 1: fenced output accepted on the first round.
    CleanGeneration,
    /// Scenario 2: missing fields repaired on round 1.
    RepairRound,
    /// Scenario 3: every round filtered, fallback returned.
    ContentFilter,
    /// Scenario 4: checker feedback repaired, or the original kept.
    FeedbackRedo,
    /// Scenario 5: two-tier consistency loop with plan reconciliation.
    ConsistencyLoop,
    /// Generate a story document against a live chat-completions endpoint.
    Generate {
        /// The story idea.
        #[arg(long)]
        idea: String,
        /// Runtime configuration file. Built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the result here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=info to follow rounds and revisions.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => {
            print_banner();
            run_all()
        }
        Command::CleanGeneration => {
            print_banner();
            clean_generation::run_scenario()
        }
        Command::RepairRound => {
            print_banner();
            repair_round::run_scenario()
        }
        Command::ContentFilter => {
            print_banner();
            content_filter::run_scenario()
        }
        Command::FeedbackRedo => {
            print_banner();
            feedback_redo::run_scenario()
        }
        Command::ConsistencyLoop => {
            print_banner();
            consistency_loop::run_scenario()
        }
        Command::Generate { idea, config, out } => generate(&idea, config.as_deref(), out.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {e}");
        std::process::exit(1);
    }
}

fn run_all() -> GalforgeResult<()> {
    clean_generation::run_scenario()?;
    repair_round::run_scenario()?;
    content_filter::run_scenario()?;
    feedback_redo::run_scenario()?;
    consistency_loop::run_scenario()?;
    println!("All scenarios completed successfully.");
    Ok(())
}

// ── Live generation ───────────────────────────────────────────────────────────

fn generate(idea: &str, config_path: Option<&Path>, out: Option<&Path>) -> GalforgeResult<()> {
    let config = match config_path {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::from_toml_str("")?,
    };

    let api_key = std::env::var(&config.backend.api_key_env).ok();
    if api_key.is_none() {
        warn!(env = %config.backend.api_key_env, "API key variable is not set, sending unauthenticated requests");
    }
    let backend = ChatCompletionsBackend::new(&config.backend.base_url, api_key)?;
    info!(endpoint = %backend.endpoint(), model = %config.backend.model, "starting generation");

    let run_id = RunId::new();
    let audit = Arc::new(InMemoryAuditWriter::new(run_id.to_string()));
    let executor = AgentExecutor::new(
        Box::new(backend),
        Box::new(SchemaValidator::new()),
        Box::new(Arc::clone(&audit)),
        config.executor_settings(),
    )
    .with_run_id(run_id.clone());

    let run = generate_story(&executor, &config, idea)?;
    executor.finish()?;

    let log = audit.export_log();
    let result = json!({
        "run_id": run_id.to_string(),
        "idea": idea,
        "document": run.document(),
        "report": run.full.report,
        "outline": {
            "termination": format!("{:?}", run.outline.termination),
            "rounds": run.outline.rounds,
        },
        "full": {
            "termination": format!("{:?}", run.full.termination),
            "rounds": run.full.rounds,
        },
        "fallback_sections": run.document().fallback_sections(),
        "audit": {
            "events": log.events.len(),
            "terminal_hash": log.terminal_hash,
            "verified": audit.verify_integrity(),
        },
    });

    let text = serde_json::to_string_pretty(&result).map_err(|e| GalforgeError::SchemaValidation {
        reason: format!("failed to serialise the result: {e}"),
    })?;
    match out {
        Some(path) => {
            std::fs::write(path, text).map_err(|e| GalforgeError::ConfigError {
                reason: format!("failed to write '{}': {e}", path.display()),
            })?;
            println!("Story written to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("galforge: validated multi-agent visual novel generation");
    println!("Scripted Reference Demo");
    println!("=======================================================");
    println!();
    println!("Per agent call:");
    println!("  [1] Render the prompt (fresh, repair, feedback, or revision)");
    println!("  [2] Backend call; moderation refusals back off and retry");
    println!("  [3] Extract one JSON object from the raw answer");
    println!("  [4] Validate required fields, then the JSON Schema and rules");
    println!("  [5] Accept, repair, or fall back; every outcome joins the SHA-256 audit chain");
    println!();
}
