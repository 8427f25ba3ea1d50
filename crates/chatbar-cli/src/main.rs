//! Chatbar CLI - replays a recorded session through the engine.
//!
//! This is the entry point for the `chatbar` binary.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chatbar_cli::{ReplayTransport, Surface, Transcript};
use chatbar_engine::{ConversationEngine, EngineConfig, Step, TurnSummary};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Chatbar - replay a recorded session and print what the chat shows.
#[derive(Parser, Debug)]
#[command(name = "chatbar")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded session script, one JSON event per line.
    #[arg(long, env = "CHATBAR_SCRIPT")]
    script: PathBuf,

    /// Prompt to submit.
    #[arg(default_value = "Hello")]
    prompt: String,

    /// Engine configuration file (JSON).
    #[arg(long, env = "CHATBAR_CONFIG")]
    config: Option<PathBuf>,

    /// Print the detail surface instead of the chat surface.
    #[arg(long, default_value = "false")]
    detail: bool,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    /// Print the turn summary and every step as JSON.
    #[arg(long, default_value = "false")]
    json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a TurnSummary,
    steps: &'a [Step],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for the transcript
    if args.debug || std::env::var_os("RUST_LOG").is_some() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("chatbar_cli=debug,chatbar_engine=debug,warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(args.config.as_deref()).await?;
    let engine = ConversationEngine::new(config);
    let transport = ReplayTransport::new(&args.script);

    let summary = engine.submit(&transport, &args.prompt).await;
    let steps = engine.snapshot();

    if args.json {
        let report = JsonReport {
            summary: &summary,
            steps: &steps,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let surface = if args.detail {
        Surface::Detail
    } else {
        Surface::Primary
    };
    print!(
        "{}",
        Transcript::new(&steps, surface).highlight(engine.highlighted())
    );
    Ok(())
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EngineConfig::from_json(&raw).with_context(|| format!("Invalid config {}", path.display()))
}
