//! pubflow - publish pipeline orchestrator
//!
//! CLI binary that collects a manifest of files, validates them and
//! publishes them through the built-in plugins.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "pubflow")]
#[command(about = "Validate and publish studio files")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $PUBFLOW_CONFIG, then the user config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print every node result and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation pass
    Validate {
        #[command(flatten)]
        session: cli::SessionArgs,
    },

    /// Validate, publish and finalize
    Publish {
        #[command(flatten)]
        session: cli::SessionArgs,

        /// Publish without running validation first
        #[arg(long)]
        no_validate: bool,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show what a publish would do
    Summary {
        #[command(flatten)]
        session: cli::SessionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise warnings, or debug with --verbose
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "pubflow=debug".to_string()
        } else {
            "pubflow=warn".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Validate { session } => {
            cli::run_validate(&session, config, cli.verbose).await?;
        }
        Commands::Publish {
            session,
            no_validate,
            yes,
        } => {
            cli::run_publish(&session, config, no_validate, yes, cli.verbose).await?;
        }
        Commands::Summary { session } => {
            cli::run_summary(&session, config)?;
        }
    }

    Ok(())
}
