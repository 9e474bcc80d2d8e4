mod geo;
mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::geo::GeoCommands;
use crate::scan::{IdentifierSource, ScanArgs, ScanStatus};

/// Exit status for a run stopped by an interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "whscan")]
#[command(about = "Warehouse enumeration, markdown detection, and warehouse lookup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover which warehouse numbers exist on the target site
    Enumerate {
        #[command(flatten)]
        source: IdentifierSource,

        #[command(flatten)]
        scan: ScanArgs,

        /// Smallest response body, in bytes, that counts as a real warehouse page
        #[arg(long)]
        min_valid_bytes: Option<usize>,
    },
    /// Flag marked-down products from a list of product ids
    Markdown {
        /// File of product ids (JSON array or one per line)
        #[arg(long)]
        input_file: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Query the static warehouse table
    Geo {
        /// Warehouse table file (defaults to `WHSCAN_WAREHOUSES_PATH`)
        #[arg(long)]
        warehouses: Option<PathBuf>,

        #[command(subcommand)]
        command: GeoCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = whscan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let status = match cli.command {
        Commands::Enumerate {
            source,
            scan,
            min_valid_bytes,
        } => scan::run_enumerate(&config, &source, &scan, min_valid_bytes).await?,
        Commands::Markdown { input_file, scan } => {
            scan::run_markdown(&config, &input_file, &scan).await?
        }
        Commands::Geo {
            warehouses,
            command,
        } => {
            let path = warehouses.unwrap_or_else(|| config.warehouses_path.clone());
            geo::run_geo(&path, &command)?;
            ScanStatus::Completed
        }
    };

    Ok(match status {
        ScanStatus::Completed => ExitCode::SUCCESS,
        ScanStatus::Interrupted => ExitCode::from(EXIT_INTERRUPTED),
    })
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal; finishing in-flight requests");
}

#[cfg(test)]
mod tests;
