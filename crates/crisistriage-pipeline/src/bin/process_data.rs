//! ETL entry point: merge the raw exports into the triage database.

use clap::Parser;
use crisistriage_pipeline::process::{self, ProcessConfig};
use crisistriage_pipeline::sqlite_url;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "process_data",
    about = "Merge message and annotation CSV exports into a SQLite database",
    version
)]
struct Cli {
    /// CSV export of raw messages
    #[arg(value_name = "MESSAGES_CSV")]
    messages: PathBuf,

    /// CSV export of category annotations
    #[arg(value_name = "CATEGORIES_CSV")]
    categories: PathBuf,

    /// SQLite database file to (re)build
    #[arg(value_name = "DATABASE")]
    database: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ProcessConfig {
        messages_path: cli.messages,
        categories_path: cli.categories,
        database_url: sqlite_url(&cli.database),
    };
    if let Err(e) = process::run(&config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
