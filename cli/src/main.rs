//! CLI entrypoint for tether
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tether_application::{HistorySink, NoHistorySink, SessionEngine};
use tether_infrastructure::{ConfigLoader, FileConfig, JsonlHistorySink, ProcessTransport};
use tether_presentation::{ChatRepl, Cli, ConsoleRenderer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting tether");

    // Load configuration and apply CLI overrides
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };

    if let Some(cmd) = &cli.agent_cmd {
        let mut parts = cmd.split_whitespace().map(String::from);
        config.agent.command = parts.next().unwrap_or_default();
        config.agent.args = parts.collect();
    }
    if let Some(seconds) = cli.turn_deadline {
        config.session.turn_deadline_seconds = Some(seconds);
    }
    config.validate().context("invalid configuration")?;

    if cli.no_color || !config.repl.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let history = build_history_sink(&cli, &config);
    let transport = ProcessTransport::spawn(&config.agent.command, &config.agent.args)
        .with_context(|| format!("failed to spawn agent: {}", config.agent.command))?;

    let engine = SessionEngine::start(
        Arc::new(transport),
        Arc::new(ConsoleRenderer::new()),
        history,
        config.engine_options(),
    );

    // Chat mode
    if cli.chat {
        let mut repl = ChatRepl::new(Arc::clone(&engine));
        if let Some(path) = &config.repl.history_file {
            repl = repl.with_history_file(Some(PathBuf::from(path)));
        }

        let result = repl.run().await;
        engine.shutdown().await;
        result?;
        return Ok(());
    }

    // One-shot mode - prompt is required
    let Some(prompt) = cli.prompt else {
        engine.shutdown().await;
        bail!("A prompt is required. Use --chat for interactive mode.");
    };

    engine.submit(prompt).await;
    let fault = engine.wait_turn().await;
    println!();
    engine.shutdown().await;

    if let Some(fault) = fault {
        bail!("turn failed: {}", fault);
    }
    Ok(())
}

/// Pick the transcript sink: a dated JSONL file unless disabled.
fn build_history_sink(cli: &Cli, config: &FileConfig) -> Arc<dyn HistorySink> {
    if cli.no_history || !config.history.enabled {
        return Arc::new(NoHistorySink);
    }

    let dir = config
        .history
        .dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| dirs::data_dir().map(|d| d.join("tether").join("sessions")));

    let Some(dir) = dir else {
        return Arc::new(NoHistorySink);
    };

    let filename = format!(
        "session-{}.jsonl",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    );
    match JsonlHistorySink::new(dir.join(filename)) {
        Some(sink) => {
            info!("Recording session transcript to {}", sink.path().display());
            Arc::new(sink)
        }
        None => Arc::new(NoHistorySink),
    }
}
