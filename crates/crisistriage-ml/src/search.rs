//! Hyperparameter grid search with k-fold cross-validation.
//!
//! Candidates are scored by mean macro F1 over the folds. The fold
//! partitions are computed once and reused for every candidate so scores
//! stay comparable; ties keep the earliest candidate in grid order.

use crate::forest::{ForestParams, MultiOutputForest};
use crate::metrics::macro_f1;
use crate::split::{KFold, SplitIndices};
use crate::vectorize::{TfidfVectorizer, VectorizerParams};
use crisistriage_core::{CategoryVector, Result, TriageError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The vectorizer axes the search explores, row-major: `ngram_max` outer,
/// `max_df` inner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub ngram_max: Vec<usize>,
    pub max_df: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        ParamGrid {
            ngram_max: vec![1, 2],
            max_df: vec![0.5, 0.75, 1.0],
        }
    }
}

impl ParamGrid {
    /// All candidate combinations in evaluation order.
    pub fn candidates(&self) -> Vec<VectorizerParams> {
        let mut out = Vec::with_capacity(self.ngram_max.len() * self.max_df.len());
        for &ngram_max in &self.ngram_max {
            for &max_df in &self.max_df {
                out.push(VectorizerParams { ngram_max, max_df });
            }
        }
        out
    }
}

/// Cross-validation result for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: VectorizerParams,
    pub fold_scores: Vec<f64>,
    pub mean_f1: f64,
}

/// Everything the search learned, kept for the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best: VectorizerParams,
    pub candidates: Vec<CandidateScore>,
}

/// Exhaustive search over a [`ParamGrid`].
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub grid: ParamGrid,
    pub folds: usize,
    pub forest: ForestParams,
    pub seed: u64,
}

impl GridSearch {
    /// Scores every candidate on `documents`/`targets` and returns the
    /// winner with the full score table.
    pub fn run(
        &self,
        documents: &[&str],
        targets: &[CategoryVector],
    ) -> Result<SearchOutcome> {
        if documents.len() != targets.len() {
            return Err(TriageError::Training(format!(
                "{} documents against {} label rows",
                documents.len(),
                targets.len()
            )));
        }
        let candidates = self.grid.candidates();
        if candidates.is_empty() {
            return Err(TriageError::Config(
                "hyperparameter grid is empty".to_string(),
            ));
        }
        let folds = KFold::new(self.folds, self.seed)?.split(documents.len())?;

        let mut scores: Vec<CandidateScore> = Vec::with_capacity(candidates.len());
        let mut best: Option<usize> = None;
        for params in candidates {
            let mut fold_scores = Vec::with_capacity(folds.len());
            for fold in &folds {
                fold_scores.push(self.score_fold(&params, documents, targets, fold)?);
            }
            let mean_f1 = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            info!(params = %params, mean_f1, "scored grid candidate");

            if best.map_or(true, |i| mean_f1 > scores[i].mean_f1) {
                best = Some(scores.len());
            }
            scores.push(CandidateScore {
                params,
                fold_scores,
                mean_f1,
            });
        }

        // The grid is non-empty, so a best candidate always exists.
        let best = best.ok_or_else(|| {
            TriageError::Training("grid search produced no scores".to_string())
        })?;
        Ok(SearchOutcome {
            best: scores[best].params,
            candidates: scores,
        })
    }

    fn score_fold(
        &self,
        params: &VectorizerParams,
        documents: &[&str],
        targets: &[CategoryVector],
        fold: &SplitIndices,
    ) -> Result<f64> {
        let train_docs: Vec<&str> = fold.train.iter().map(|&i| documents[i]).collect();
        let train_targets: Vec<CategoryVector> = fold.train.iter().map(|&i| targets[i]).collect();
        let test_docs: Vec<&str> = fold.test.iter().map(|&i| documents[i]).collect();
        let test_targets: Vec<CategoryVector> = fold.test.iter().map(|&i| targets[i]).collect();

        let mut vectorizer = TfidfVectorizer::new(*params);
        vectorizer.fit(&train_docs)?;
        let features = vectorizer.transform_all(&train_docs);
        let model = MultiOutputForest::fit(&features, &train_targets, &self.forest, self.seed)?;
        let predictions = model.predict(&vectorizer.transform_all(&test_docs));
        macro_f1(&predictions, &test_targets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crisistriage_core::CategoryVector;

    fn corpus() -> (Vec<&'static str>, Vec<CategoryVector>) {
        let documents = vec![
            "we need clean water urgently",
            "water supply ran out yesterday",
            "please send drinking water",
            "water tank is empty here",
            "food packets required for families",
            "children are hungry send food",
            "no food since the storm",
            "rice and food supplies needed",
        ];
        let targets = documents
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
        (documents, targets)
    }

    fn search(grid: ParamGrid) -> GridSearch {
        GridSearch {
            grid,
            folds: 2,
            forest: ForestParams {
                n_trees: 5,
                max_depth: None,
                min_samples_split: 2,
            },
            seed: 42,
        }
    }

    #[test]
    fn test_default_grid_order() {
        let candidates = ParamGrid::default().candidates();
        assert_eq!(candidates.len(), 6);
        assert_eq!(candidates[0].ngram_max, 1);
        assert!((candidates[0].max_df - 0.5).abs() < 1e-12);
        assert_eq!(candidates[3].ngram_max, 2);
        assert!((candidates[3].max_df - 0.5).abs() < 1e-12);
        assert!((candidates[5].max_df - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_candidate_wins() {
        let (documents, targets) = corpus();
        let outcome = search(ParamGrid {
            ngram_max: vec![1],
            max_df: vec![1.0],
        })
        .run(&documents, &targets)
        .unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.best.ngram_max, 1);
        assert_eq!(outcome.candidates[0].fold_scores.len(), 2);
    }

    #[test]
    fn test_scores_every_candidate() {
        let (documents, targets) = corpus();
        let outcome = search(ParamGrid {
            ngram_max: vec![1, 2],
            max_df: vec![1.0],
        })
        .run(&documents, &targets)
        .unwrap();
        assert_eq!(outcome.candidates.len(), 2);
        let best_mean = outcome
            .candidates
            .iter()
            .map(|c| c.mean_f1)
            .fold(f64::NEG_INFINITY, f64::max);
        let winner = outcome
            .candidates
            .iter()
            .find(|c| c.params == outcome.best)
            .unwrap();
        assert!((winner.mean_f1 - best_mean).abs() < 1e-12);
    }

    #[test]
    fn test_tie_keeps_grid_order() {
        let (documents, targets) = corpus();
        // Identical candidates score identically; the first must win.
        let outcome = search(ParamGrid {
            ngram_max: vec![1, 1],
            max_df: vec![1.0],
        })
        .run(&documents, &targets)
        .unwrap();
        assert_eq!(outcome.candidates[0].mean_f1, outcome.candidates[1].mean_f1);
        assert_eq!(outcome.best, outcome.candidates[0].params);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let (documents, targets) = corpus();
        let result = search(ParamGrid {
            ngram_max: vec![],
            max_df: vec![1.0],
        })
        .run(&documents, &targets);
        assert!(result.is_err());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let (documents, _) = corpus();
        let result = search(ParamGrid::default()).run(&documents, &[]);
        assert!(result.is_err());
    }
}
