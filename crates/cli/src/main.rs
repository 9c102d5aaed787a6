//! agentrail CLI: the main entry point.
//!
//! Commands:
//! - `ask`    : Run a single query through the pipeline
//! - `chat`   : Interactive session with shared context
//! - `config` : Validate and show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "agentrail",
    about = "agentrail: retrieval-first question answering with tool routing",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.agentrail/config.toml)
    #[arg(short, long, global = true, env = "AGENTRAIL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query
    Ask {
        /// The question
        query: String,

        /// Passages to retrieve for this query
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the turn trace after the answer
        #[arg(long)]
        trace: bool,

        /// Print the full turn as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive session
    Chat {
        /// Print the turn trace after each answer
        #[arg(long)]
        trace: bool,
    },

    /// Validate and show configuration
    Config {
        /// Print a default config file instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask {
            query,
            top_k,
            trace,
            json,
        } => commands::ask::run(config_path, &query, top_k, trace, json).await?,
        Commands::Chat { trace } => commands::chat::run(config_path, trace).await?,
        Commands::Config { default } => commands::config_cmd::run(config_path, default)?,
    }

    Ok(())
}
