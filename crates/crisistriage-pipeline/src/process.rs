//! ETL stage: CSV exports in, rebuilt SQLite table out.

use crisistriage_core::Result;
use crisistriage_etl::{merge_and_clean, read_categories, read_messages, EtlSummary};
use crisistriage_storage::SqliteMessageRepository;
use std::path::PathBuf;
use tracing::info;

/// Inputs and destination for one ETL run.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub messages_path: PathBuf,
    pub categories_path: PathBuf,
    pub database_url: String,
}

/// Reads both exports, merges and cleans them, and replaces the messages
/// table. Returns the cleaning counters; they are also printed.
pub async fn run(config: &ProcessConfig) -> Result<EtlSummary> {
    info!(
        messages = %config.messages_path.display(),
        categories = %config.categories_path.display(),
        "loading raw exports"
    );
    let messages = read_messages(&config.messages_path)?;
    let categories = read_categories(&config.categories_path)?;

    info!(
        messages = messages.len(),
        annotations = categories.len(),
        "merging and cleaning"
    );
    let outcome = merge_and_clean(&messages, &categories)?;

    info!(database = %config.database_url, rows = outcome.rows.len(), "saving cleaned rows");
    let repository = SqliteMessageRepository::open(&config.database_url).await?;
    repository.replace_all(&outcome.rows).await?;

    println!("ETL summary:");
    println!("{}", outcome.summary);
    Ok(outcome.summary)
}
