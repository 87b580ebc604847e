//! Bootstrap-aggregated tree ensembles.
//!
//! [`RandomForest`] bags [`DecisionTree`]s for one binary label: each tree
//! trains on a bootstrap sample of the rows and considers `sqrt(n_features)`
//! columns per split. [`MultiOutputForest`] fits one forest per category in
//! registry order, deriving each forest's seed from the run seed so results
//! are reproducible end to end.

use crate::sparse::{ColumnMatrix, SparseMatrix, SparseRow};
use crate::tree::{DecisionTree, TreeParams};
use crisistriage_core::{CategoryVector, Result, TriageError, CATEGORY_COUNT, CATEGORY_NAMES};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ensemble hyperparameters shared by every per-category forest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<u32>,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ForestParams {
    fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(TriageError::Config(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(TriageError::Config(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
        }
    }
}

// ---------------------------------------------------------------------------
// Single-label forest
// ---------------------------------------------------------------------------

/// Random forest for a single binary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fits `params.n_trees` trees on bootstrap samples of the rows.
    pub fn fit(
        columns: &ColumnMatrix,
        targets: &[u8],
        params: &ForestParams,
        seed: u64,
    ) -> Result<Self> {
        params.validate()?;
        let n = columns.n_rows();
        if n == 0 {
            return Err(TriageError::Training(
                "cannot fit a forest on zero rows".to_string(),
            ));
        }
        if targets.len() != n {
            return Err(TriageError::Training(format!(
                "target length {} does not match row count {n}",
                targets.len()
            )));
        }

        let n_candidates = ((columns.n_cols() as f64).sqrt().ceil() as usize).max(1);
        let tree_params = params.tree_params();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let mut rows: Vec<u32> = (0..n).map(|_| rng.gen_range(0..n) as u32).collect();
            rows.sort_unstable();
            trees.push(DecisionTree::fit(
                columns,
                &rows,
                targets,
                &tree_params,
                n_candidates,
                &mut rng,
            ));
        }
        Ok(RandomForest { trees })
    }

    /// Mean positive-class probability across the ensemble.
    pub fn predict_probability(&self, row: &SparseRow) -> f64 {
        let sum: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_probability(row) as f64)
            .sum();
        sum / self.trees.len() as f64
    }

    /// Hard 0/1 prediction; positive when the mean probability clears 0.5,
    /// so an exact tie falls back to the negative class.
    pub fn predict(&self, row: &SparseRow) -> u8 {
        u8::from(self.predict_probability(row) > 0.5)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

// ---------------------------------------------------------------------------
// Multi-output forest
// ---------------------------------------------------------------------------

/// One forest per category, in [`CATEGORY_NAMES`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutputForest {
    forests: Vec<RandomForest>,
}

impl MultiOutputForest {
    /// Fits all per-category forests against the same feature matrix.
    ///
    /// Category `k` trains with seed `seed + k`, so two runs with the same
    /// data, parameters and seed produce identical models.
    pub fn fit(
        features: &SparseMatrix,
        targets: &[CategoryVector],
        params: &ForestParams,
        seed: u64,
    ) -> Result<Self> {
        if targets.len() != features.n_rows() {
            return Err(TriageError::Training(format!(
                "labels for {} rows but features for {}",
                targets.len(),
                features.n_rows()
            )));
        }
        let columns = features.to_columns();
        let mut forests = Vec::with_capacity(CATEGORY_COUNT);
        for (k, name) in CATEGORY_NAMES.iter().enumerate() {
            let labels: Vec<u8> = targets.iter().map(|t| t.get(k)).collect();
            let forest =
                RandomForest::fit(&columns, &labels, params, seed.wrapping_add(k as u64))?;
            debug!(category = *name, "fitted forest");
            forests.push(forest);
        }
        Ok(MultiOutputForest { forests })
    }

    /// Predicts the full label vector for one feature row.
    pub fn predict_row(&self, row: &SparseRow) -> CategoryVector {
        let mut labels = CategoryVector::zeros();
        for (k, forest) in self.forests.iter().enumerate() {
            labels.set(k, forest.predict(row));
        }
        labels
    }

    /// Predicts label vectors for every row of a feature matrix.
    pub fn predict(&self, features: &SparseMatrix) -> Vec<CategoryVector> {
        (0..features.n_rows())
            .map(|i| self.predict_row(features.row(i)))
            .collect()
    }

    pub fn n_outputs(&self) -> usize {
        self.forests.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
