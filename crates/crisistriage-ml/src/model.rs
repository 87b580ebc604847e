//! Trained model artifact.
//!
//! The artifact bundles the fitted vectorizer, the per-category forests,
//! the grid-search score table and the held-out evaluation into one
//! versioned JSON file. Loading checks the version and the category
//! registry so a stale artifact fails loudly instead of scoring against
//! the wrong columns.

use crate::forest::MultiOutputForest;
use crate::metrics::ClassificationReport;
use crate::search::SearchOutcome;
use crate::vectorize::TfidfVectorizer;
use chrono::Utc;
use crisistriage_core::{CategoryVector, Result, TriageError, CATEGORY_NAMES};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Artifact format version; bump when the JSON layout changes.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    /// RFC 3339 timestamp of the training run.
    pub created_at: String,
    /// Category registry the model was trained against.
    pub categories: Vec<String>,
    pub vectorizer: TfidfVectorizer,
    pub classifier: MultiOutputForest,
    pub search: SearchOutcome,
    pub evaluation: ClassificationReport,
}

impl ModelArtifact {
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: MultiOutputForest,
        search: SearchOutcome,
        evaluation: ClassificationReport,
    ) -> Self {
        ModelArtifact {
            version: ARTIFACT_VERSION,
            created_at: Utc::now().to_rfc3339(),
            categories: CATEGORY_NAMES.iter().map(|&n| n.to_string()).collect(),
            vectorizer,
            classifier,
            search,
            evaluation,
        }
    }

    /// Writes the artifact as JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)
            .map_err(|e| TriageError::Model(format!("cannot create {}: {e}", path.display())))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Reads an artifact back, verifying version and category registry.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| TriageError::Model(format!("cannot open {}: {e}", path.display())))?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(TriageError::Model(format!(
                "artifact version {} is not supported (expected {ARTIFACT_VERSION})",
                artifact.version
            )));
        }
        if artifact.categories != CATEGORY_NAMES {
            return Err(TriageError::Model(
                "artifact categories do not match the registry".to_string(),
            ));
        }
        Ok(artifact)
    }

    /// Classifies a raw message with the bundled vectorizer and forests.
    pub fn predict(&self, text: &str) -> CategoryVector {
        let row = self.vectorizer.transform(text);
        self.classifier.predict_row(&row)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestParams;
    use crate::search::{GridSearch, ParamGrid};
    use crate::vectorize::VectorizerParams;

    fn trained_artifact() -> ModelArtifact {
        let documents = vec![
            "we need clean water now",
            "water point is dry",
            "send water bottles please",
            "water for the camp",
            "food packs for families",
            "hungry children need food",
            "food supplies gone",
            "rice or any food works",
        ];
        let targets: Vec<CategoryVector> = documents
            .iter()
            .map(|d| {
                let mut v = CategoryVector::zeros();
                v.set(0, 1);
                if d.contains("water") {
                    v.set(10, 1);
                } else {
                    v.set(11, 1);
                }
                v
            })
            .collect();

        let params = VectorizerParams::default();
        let mut vectorizer = TfidfVectorizer::new(params);
        vectorizer.fit(&documents).unwrap();
        let features = vectorizer.transform_all(&documents);
        let forest_params = ForestParams {
            n_trees: 5,
            max_depth: None,
            min_samples_split: 2,
        };
        let classifier = MultiOutputForest::fit(&features, &targets, &forest_params, 42).unwrap();
        let search = GridSearch {
            grid: ParamGrid {
                ngram_max: vec![1],
                max_df: vec![1.0],
            },
            folds: 2,
            forest: forest_params,
            seed: 42,
        }
        .run(&documents, &targets)
        .unwrap();
        let predictions = classifier.predict(&features);
        let evaluation = ClassificationReport::compute(&predictions, &targets).unwrap();
        ModelArtifact::new(vectorizer, classifier, search, evaluation)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let artifact = trained_artifact();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("classifier.json");
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.version, ARTIFACT_VERSION);
        assert_eq!(loaded.categories.len(), CATEGORY_NAMES.len());
        assert_eq!(loaded.vectorizer.vocabulary_size(), artifact.vectorizer.vocabulary_size());
        assert_eq!(loaded.classifier, artifact.classifier);
        assert_eq!(loaded.evaluation, artifact.evaluation);
    }

    #[test]
    fn test_prediction_survives_round_trip() {
        let artifact = trained_artifact();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        let text = "we need clean water now";
        assert_eq!(artifact.predict(text), loaded.predict(text));
        // "related" is constant positive in the training data.
        assert_eq!(loaded.predict(text).get(0), 1);
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let artifact = trained_artifact();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        artifact.save(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let patched = json.replacen("\"version\":1", "\"version\":99", 1);
        assert_ne!(json, patched);
        std::fs::write(&path, patched).unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, TriageError::Model(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TriageError::Model(_)));
    }
}
