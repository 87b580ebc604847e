//! Seeded train/test and cross-validation splits.
//!
//! All splits shuffle row indices with a seeded ChaCha8 stream, so a given
//! seed always produces the same partition of the same row count.

use crisistriage_core::{Result, TriageError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Index sets for one train/evaluation partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n_rows` and holds out `test_size` of it.
///
/// The held-out count is rounded to the nearest row but clamped so both
/// sides keep at least one row.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TriageError::Config(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    if n_rows < 2 {
        return Err(TriageError::Training(format!(
            "need at least 2 rows to split, got {n_rows}"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_rows as f64 * test_size).round() as usize).clamp(1, n_rows - 1);
    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// K-fold splitter: one shuffle, then contiguous folds over the shuffled
/// order, so every row is held out exactly once.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    folds: usize,
    seed: u64,
}

impl KFold {
    pub fn new(folds: usize, seed: u64) -> Result<Self> {
        if folds < 2 {
            return Err(TriageError::Config(format!(
                "cross-validation needs at least 2 folds, got {folds}"
            )));
        }
        Ok(KFold { folds, seed })
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Produces the fold partitions for `n_rows` rows. The first
    /// `n_rows % folds` folds hold one extra row.
    pub fn split(&self, n_rows: usize) -> Result<Vec<SplitIndices>> {
        if n_rows < self.folds {
            return Err(TriageError::Training(format!(
                "cannot make {} folds from {n_rows} rows",
                self.folds
            )));
        }

        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let base = n_rows / self.folds;
        let extra = n_rows % self.folds;
        let mut splits = Vec::with_capacity(self.folds);
        let mut start = 0usize;
        for fold in 0..self.folds {
            let size = base + usize::from(fold < extra);
            let end = start + size;
            let test = indices[start..end].to_vec();
            let mut train = Vec::with_capacity(n_rows - size);
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);
            splits.push(SplitIndices { train, test });
            start = end;
        }
        Ok(splits)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
