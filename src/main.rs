mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gradesync")]
#[command(about = "Sync assessment-platform grades into a Google Sheets gradebook")]
struct Cli {
    /// Config file to use instead of ~/.config/gradesync/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add new assignment columns and submit the batch
    Sync,
    /// Show which columns and subsheets a sync would add, without writing
    Status {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List classified assignments in column order
    Assignments {
        /// Also list assignments that match no category
        #[arg(short, long)]
        all: bool,
    },
    /// Show the config path, creating a default config if missing
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Sync => commands::sync::run(config).await,
        Commands::Status { json } => commands::status::run(config, json).await,
        Commands::Assignments { all } => commands::assignments::run(config, all).await,
        Commands::Config => commands::config::run(config),
    }
}
