//! regwatch - publish regulatory PDFs and ingest them from the queue.
//!
//! # Configuration
//!
//! Settings come from `--config <FILE>` (TOML, JSON or YAML) with
//! `REGWATCH_*` environment variables layered on top. A `.env` file in the
//! working directory is loaded first.
//!
//! - `REGWATCH_NATS_URL` - Broker URL, defaults to `nats://localhost:4222`
//! - `REGWATCH_CONTENT_DIR` - Where received PDFs are kept
//! - `REGWATCH_LLM_PROVIDER` - `groq`, `openai` or `anthropic`
//! - `GROQ_API_KEY` / `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` - Summary agent keys

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use regwatch_cli::{build_agent, init_tracing, PipelineContext};
use regwatch_core::types::PDF_CONTENT_TYPE;
use regwatch_core::{AckMode, PipelineConfig, RegulationParser, RegwatchError};

#[derive(Parser)]
#[command(name = "regwatch", version, about = "Queue-driven ingestion of regulatory PDFs")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, value_name = "FILE", env = "REGWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging for regwatch crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish one PDF
    Publish {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Publish every PDF in a directory, in filename order
    PublishDir {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Seconds to wait between documents; 0 disables pacing
        #[arg(long, value_name = "SECS")]
        interval_secs: Option<u64>,
    },
    /// Consume documents until interrupted
    Monitor {
        /// When messages are acknowledged: client (after processing) or auto (on receipt)
        #[arg(long, value_name = "MODE")]
        ack: Option<AckMode>,

        /// Do not send parsed documents to the summary agent
        #[arg(long)]
        no_agent: bool,

        /// Also write each parsed document to DIR/<filename>.json
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Extract a local PDF and print the structured document
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .with_env()?,
        None => PipelineConfig::from_env()?,
    };
    Ok(config)
}

async fn publish(config: PipelineConfig, file: &Path) -> Result<()> {
    let context = PipelineContext::open(config).await?;
    let result = context.producer().publish_file(file).await;
    context.close().await;

    let filename = result?;
    println!("Published {}", filename);
    Ok(())
}

async fn publish_dir(mut config: PipelineConfig, dir: &Path, interval: Option<u64>) -> Result<()> {
    if let Some(secs) = interval {
        config.producer.pacing_secs = secs;
    }

    let context = PipelineContext::open(config).await?;
    let result = context.producer().publish_dir(dir).await;
    context.close().await;

    let report = result?;
    println!(
        "Published {} document(s), skipped {}",
        report.published.len(),
        report.skipped.len()
    );
    for name in &report.skipped {
        println!("  skipped {}", name);
    }
    Ok(())
}

async fn monitor(
    mut config: PipelineConfig,
    ack: Option<AckMode>,
    no_agent: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    if output_dir.is_some() {
        config.sink.output_dir = output_dir;
    }
    let ack_mode = ack.unwrap_or(config.broker.ack_mode);
    let agent = Arc::new(build_agent(&config, !no_agent));

    let context = PipelineContext::open(config).await?;

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, finishing current document");
        token.cancel();
    });

    let result = context.monitor(agent, ack_mode, shutdown).await;
    context.close().await;
    result?;

    info!("Monitor stopped cleanly");
    Ok(())
}

async fn parse(file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let document = RegulationParser::default()
        .parse(filename, &bytes, PDF_CONTENT_TYPE)
        .await?;
    println!("{}", serde_json::to_string_pretty(&document.to_json())?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = || load_config(cli.config.as_deref());

    match cli.command {
        Commands::Publish { file } => publish(config()?, &file).await,
        Commands::PublishDir { dir, interval_secs } => {
            publish_dir(config()?, &dir, interval_secs).await
        }
        Commands::Monitor {
            ack,
            no_agent,
            output_dir,
        } => monitor(config()?, ack, no_agent, output_dir).await,
        Commands::Parse { file } => parse(&file).await,
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        if let Some(suggestion) = err
            .downcast_ref::<RegwatchError>()
            .and_then(RegwatchError::suggestion)
        {
            eprintln!("Hint: {}", suggestion);
        }
        std::process::exit(1);
    }
}
