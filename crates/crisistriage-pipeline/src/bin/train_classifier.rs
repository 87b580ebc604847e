//! Training entry point: fit, evaluate and save the message classifier.

use clap::Parser;
use crisistriage_pipeline::sqlite_url;
use crisistriage_pipeline::train::{self, TrainConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "train_classifier",
    about = "Train the multi-category message classifier from the triage database",
    version
)]
struct Cli {
    /// SQLite database produced by process_data
    #[arg(value_name = "DATABASE")]
    database: PathBuf,

    /// Output path for the trained model artifact (JSON)
    #[arg(value_name = "MODEL_FILE")]
    model: PathBuf,

    /// Fraction of rows held out for the final evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Cross-validation folds for the hyperparameter search
    #[arg(long, default_value_t = 3)]
    folds: usize,

    /// Trees per category forest
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Maximum tree depth; unlimited when omitted
    #[arg(long)]
    max_depth: Option<u32>,

    /// Minimum samples required to split a tree node
    #[arg(long, default_value_t = 2)]
    min_samples_split: usize,

    /// Seed for splits, bootstraps and feature sampling
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = TrainConfig::new(sqlite_url(&cli.database), cli.model);
    config.test_size = cli.test_size;
    config.folds = cli.folds;
    config.forest.n_trees = cli.trees;
    config.forest.max_depth = cli.max_depth;
    config.forest.min_samples_split = cli.min_samples_split;
    config.seed = cli.seed;

    if let Err(e) = train::run(&config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
