//! mergebot - label-driven rebase-and-merge automation

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mergebot")]
#[command(about = "Keep labeled change requests rebased, and merge them when ready")]
#[command(version)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one delivered event
    Run {
        /// Event payload (JSON)
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event_path: PathBuf,

        /// Event name
        #[arg(long, env = "GITHUB_EVENT_NAME")]
        event_name: Option<String>,

        /// Config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the action the bot would take for a CR (no side effects)
    Evaluate {
        /// CR number
        cr_id: u64,

        /// Config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print which siblings closing a CR would rebase (no side effects)
    Cascade {
        /// CR number
        cr_id: u64,

        /// Config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mergebot=debug" } else { "mergebot=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            event_path,
            event_name,
            config,
        } => {
            cli::run_event(cli::RunOptions {
                event_path: &event_path,
                event_name: event_name.as_deref(),
                config: config.as_deref(),
            })
            .await?;
        }
        Commands::Evaluate { cr_id, config } => {
            cli::run_evaluate(cr_id, config.as_deref()).await?;
        }
        Commands::Cascade { cr_id, config } => {
            cli::run_cascade(cr_id, config.as_deref()).await?;
        }
    }

    Ok(())
}
