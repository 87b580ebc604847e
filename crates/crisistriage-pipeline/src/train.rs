//! Training stage: database in, evaluated model artifact out.

use crisistriage_core::{CategoryVector, Result, TriageError};
use crisistriage_ml::{
    train_test_split, ClassificationReport, ForestParams, GridSearch, ModelArtifact,
    MultiOutputForest, ParamGrid, SearchOutcome, TfidfVectorizer,
};
use crisistriage_storage::SqliteMessageRepository;
use std::path::PathBuf;
use tracing::info;

/// One training run's configuration.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub database_url: String,
    pub model_path: PathBuf,
    /// Fraction of rows held out for the final evaluation.
    pub test_size: f64,
    /// Cross-validation folds used inside the grid search.
    pub folds: usize,
    pub grid: ParamGrid,
    pub forest: ForestParams,
    pub seed: u64,
}

impl TrainConfig {
    /// Defaults: 20% held out, 3 folds, the standard grid, 100-tree
    /// forests, seed 42.
    pub fn new(database_url: String, model_path: PathBuf) -> Self {
        TrainConfig {
            database_url,
            model_path,
            test_size: 0.2,
            folds: 3,
            grid: ParamGrid::default(),
            forest: ForestParams::default(),
            seed: 42,
        }
    }
}

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Labeled rows loaded from the database.
    pub rows: usize,
    pub search: SearchOutcome,
    /// Held-out evaluation of the refitted winner.
    pub report: ClassificationReport,
    pub model_path: PathBuf,
}

/// Loads the cleaned messages, grid-searches vectorizer hyperparameters,
/// refits the winner on the full training split, evaluates on the held-out
/// rows and saves the artifact.
pub async fn run(config: &TrainConfig) -> Result<TrainOutcome> {
    info!(database = %config.database_url, "loading labeled messages");
    let repository = SqliteMessageRepository::open(&config.database_url).await?;
    let rows = repository.fetch_all().await?;
    if rows.is_empty() {
        return Err(TriageError::Training(
            "the messages table is empty; nothing to train on".to_string(),
        ));
    }
    info!(rows = rows.len(), "loaded labeled messages");

    let documents: Vec<&str> = rows.iter().map(|r| r.message.as_str()).collect();
    let targets: Vec<CategoryVector> = rows.iter().map(|r| r.labels).collect();

    let split = train_test_split(rows.len(), config.test_size, config.seed)?;
    let train_docs: Vec<&str> = split.train.iter().map(|&i| documents[i]).collect();
    let train_targets: Vec<CategoryVector> = split.train.iter().map(|&i| targets[i]).collect();
    let test_docs: Vec<&str> = split.test.iter().map(|&i| documents[i]).collect();
    let test_targets: Vec<CategoryVector> = split.test.iter().map(|&i| targets[i]).collect();
    info!(
        train = train_docs.len(),
        test = test_docs.len(),
        "split rows for evaluation"
    );

    let search = GridSearch {
        grid: config.grid.clone(),
        folds: config.folds,
        forest: config.forest,
        seed: config.seed,
    }
    .run(&train_docs, &train_targets)?;
    info!(best = %search.best, "grid search finished");

    let mut vectorizer = TfidfVectorizer::new(search.best);
    vectorizer.fit(&train_docs)?;
    let features = vectorizer.transform_all(&train_docs);
    let classifier = MultiOutputForest::fit(&features, &train_targets, &config.forest, config.seed)?;
    info!(
        vocabulary = vectorizer.vocabulary_size(),
        trees = config.forest.n_trees,
        "refitted winning configuration"
    );

    let predictions = classifier.predict(&vectorizer.transform_all(&test_docs));
    let report = ClassificationReport::compute(&predictions, &test_targets)?;
    println!("{report}");
    println!();
    println!(
        "macro F1 {:.3} | weighted F1 {:.3} on {} held-out rows",
        report.macro_f1(),
        report.weighted_f1(),
        report.samples
    );

    let artifact = ModelArtifact::new(vectorizer, classifier, search.clone(), report.clone());
    artifact.save(&config.model_path)?;
    info!(path = %config.model_path.display(), "saved model artifact");

    Ok(TrainOutcome {
        rows: rows.len(),
        search,
        report,
        model_path: config.model_path.clone(),
    })
}
