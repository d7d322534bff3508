//! Owlbot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "owlbot")]
#[command(about = "A Discord bot that routes guild channels to AI-assisted behaviors")]
struct Cli {
    /// Override the data directory (holds the settings database)
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("starting Owlbot...");

    // Missing credentials abort here; the bot never limps along without them.
    let mut config = owlbot::config::Config::load()
        .with_context(|| "failed to load configuration from environment")?;

    if let Some(data_dir) = cli.data_dir {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
        config.data_dir = data_dir;
    }

    tracing::info!(data_dir = %config.data_dir.display(), "configuration loaded");

    let pool = owlbot::db::connect(&config.sqlite_path())
        .await
        .with_context(|| "failed to open settings database")?;

    let caps = owlbot::Capabilities::new(&config, pool.clone())
        .with_context(|| "failed to build capability adapters")?;

    let state = Arc::new(owlbot::discord::BotState { caps, config });

    tokio::select! {
        result = owlbot::discord::run(state) => {
            result.with_context(|| "Discord client stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("shutting down...");
    pool.close().await;

    tracing::info!("Owlbot stopped");
    Ok(())
}
