//! medharvest command-line interface

use anyhow::Context;
use clap::{Parser, Subcommand};
use medharvest::config::load_config_with_hash;
use medharvest::crawler::{run_details, run_discovery};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medharvest")]
#[command(about = "Resumable medicine-catalog harvester", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "medharvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover product detail-page URLs across the catalog
    Links {
        /// Discard any saved checkpoint and URL list and start over
        #[arg(long)]
        fresh: bool,
    },

    /// Fetch and extract every discovered detail page
    Details,
}

fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "medharvest=info,warn",
            1 => "medharvest=debug,info",
            2 => "medharvest=trace,debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    tracing::info!(config = %cli.config.display(), hash = %config_hash, "configuration loaded");

    // First Ctrl-C asks for a graceful stop at the next unit boundary; the
    // drivers save their progress before returning.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current unit of work");
            flag.store(true, Ordering::SeqCst);
        }
    });

    match cli.command {
        Command::Links { fresh } => run_discovery(config, fresh, shutdown)
            .await
            .context("link discovery failed")?,
        Command::Details => run_details(config, shutdown)
            .await
            .context("detail fetch failed")?,
    }

    Ok(())
}
