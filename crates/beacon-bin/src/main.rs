//! Beacon - command-line host for the telemetry outbox.

mod app;
mod cli;

use std::path::PathBuf;
use std::time::Duration;

use beacon_config_and_utils::{init_logging, init_logging_to_file, Config, Paths};
use clap::{Parser, Subcommand};
use cli::TrackCommand;

/// Beacon command-line interface.
#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Queue game telemetry and deliver it to the collector")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for queue, identity, config and logs. Defaults to ~/.beacon
    #[arg(long, env = "BEACON_HOME", global = true)]
    base_dir: Option<PathBuf>,

    /// Collector URL, overriding the configured one
    #[arg(long, global = true)]
    server_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one event and wait for it to be delivered
    Track {
        #[command(subcommand)]
        event: TrackCommand,

        /// Seconds to wait for delivery before leaving the event queued
        #[arg(long, default_value = "10")]
        wait_secs: u64,
    },
    /// Show the persisted queue without sending anything
    Status,
    /// Deliver everything in the persisted queue
    Drain {
        /// Seconds to wait for the queue to empty
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(url) = cli.server_url {
        config.server_url = url;
    }

    // Initialize logging
    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    if let Err(e) = init_logging_to_file(&level, &paths.log_file()) {
        init_logging(&level);
        tracing::warn!(error = %e, "File logging unavailable, using stderr only");
    }

    config.validate()?;

    match cli.command {
        Commands::Track { event, wait_secs } => {
            app::track(&config, &paths, event.into(), Duration::from_secs(wait_secs)).await?;
        }
        Commands::Status => {
            app::status(&config, &paths)?;
        }
        Commands::Drain { timeout_secs } => {
            app::drain(&config, &paths, Duration::from_secs(timeout_secs)).await?;
        }
    }

    Ok(())
}
