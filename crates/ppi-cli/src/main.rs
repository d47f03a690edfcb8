// crates/ppi-cli/src/main.rs
//
// CLI entrypoint for the PPI boosted farm.
//
// Loads the protocol configuration, initializes tracing, and dispatches to
// the `schedule` and `replay` subcommands.

mod commands;
mod config;
mod error;
mod output;
mod shared;

use clap::{Parser, Subcommand};
use commands::replay::ReplayCmd;
use commands::schedule::ScheduleCmd;
use config::ProtocolConfig;

/// PPI farm CLI: emission schedule and call-script replay.
#[derive(Parser, Debug)]
#[command(
    name = "ppi",
    version = "0.1.0",
    about = "PPI boosted farm: vote escrow, emission schedule and reward accounting"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "ppi.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the emission rate table and the reward over a window.
    Schedule(ScheduleCmd),

    /// Replay a JSON script of timestamped calls against a fresh protocol.
    Replay(ReplayCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config is read before tracing starts so its log level can apply.
    let loaded = ProtocolConfig::load(&cli.config);
    let log_level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", cli.config);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                cli.config,
                e
            );
            ProtocolConfig::default()
        }
    };

    match &cli.command {
        Commands::Schedule(cmd) => commands::schedule::run(cmd, &config).await?,
        Commands::Replay(cmd) => commands::replay::run(cmd, &config).await?,
    }

    Ok(())
}
