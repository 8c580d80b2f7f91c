mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

use sloguard::config::SloguardConfig;

#[derive(Parser)]
#[command(name = "sloguard", version, about = "Per-tenant SLO governor for expensive features")]
struct Cli {
    /// Config file (defaults to ~/.sloguard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the admin HTTP server
    Serve,
    /// Print the resolved configuration and check it
    Config,
    /// Run a latency trace through the guard and report trips
    Replay {
        /// Trace file, one `offset_ms,tenant,latency_ms` sample per line
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr so report output on stdout stays clean. The subscriber
    // goes up before config loading so its warnings are seen; the configured
    // level replaces the bootstrap filter once known.
    let bootstrap = EnvFilter::try_from_env("SLOGUARD_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, filter_handle) = reload::Layer::new(bootstrap);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => SloguardConfig::load_from(path)?,
        None => SloguardConfig::load()?,
    };

    match EnvFilter::try_new(&config.server.log_level) {
        Ok(filter) => filter_handle.reload(filter)?,
        Err(e) => tracing::warn!(
            level = %config.server.log_level,
            error = %e,
            "invalid log level, keeping info"
        ),
    }

    match cli.command {
        Command::Serve => {
            sloguard::server::serve(config).await?;
        }
        Command::Config => {
            cli::show_config::show_config(&config)?;
        }
        Command::Replay { file, json } => {
            cli::replay::replay(&config, &file, json)?;
        }
    }

    Ok(())
}
