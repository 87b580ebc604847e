//! CART-style binary classification trees.
//!
//! Trees grow greedily on Gini impurity. At every node a random subset of
//! feature columns is considered, values are grouped with the implicit
//! zeros of the sparse matrix, and the best threshold is the midpoint
//! between adjacent distinct values. Nodes live in a flat arena so a
//! fitted tree serializes without recursion.

use crate::sparse::{row_value, ColumnMatrix, SparseRow};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum split depth; `None` grows until nodes are pure or too small.
    pub max_depth: Option<u32>,
    /// Nodes with fewer samples than this become leaves.
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Fraction of positive training samples that reached this leaf.
        probability: f32,
    },
    Split {
        feature: u32,
        threshold: f32,
        left: u32,
        right: u32,
    },
}

/// A fitted tree. Samples with `feature <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grows a tree on the rows listed in `rows` (sorted, repeats allowed;
    /// bootstrap samples arrive this way). `targets` is indexed by row id
    /// and holds 0/1 labels. `n_candidates` columns are sampled per node.
    pub(crate) fn fit(
        columns: &ColumnMatrix,
        rows: &[u32],
        targets: &[u8],
        params: &TreeParams,
        n_candidates: usize,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        debug_assert_eq!(columns.n_rows(), targets.len());
        let mut tree = DecisionTree { nodes: Vec::new() };
        tree.grow(columns, rows, targets, params, n_candidates, 0, rng);
        tree
    }

    fn grow(
        &mut self,
        columns: &ColumnMatrix,
        rows: &[u32],
        targets: &[u8],
        params: &TreeParams,
        n_candidates: usize,
        depth: u32,
        rng: &mut ChaCha8Rng,
    ) -> u32 {
        let positives = rows
            .iter()
            .filter(|&&row| targets[row as usize] == 1)
            .count();
        let probability = positives as f32 / rows.len() as f32;

        let depth_reached = params.max_depth.is_some_and(|limit| depth >= limit);
        let pure = positives == 0 || positives == rows.len();
        if pure || depth_reached || rows.len() < params.min_samples_split {
            return self.push(Node::Leaf { probability });
        }

        let Some((feature, threshold)) =
            best_split(columns, rows, targets, positives, n_candidates, rng)
        else {
            // No candidate column had two distinct values among these rows.
            return self.push(Node::Leaf { probability });
        };

        let (left_rows, right_rows) = partition(columns.column(feature as usize), rows, threshold);
        let index = self.push(Node::Split {
            feature,
            threshold,
            left: 0,
            right: 0,
        });
        let left = self.grow(columns, &left_rows, targets, params, n_candidates, depth + 1, rng);
        let right = self.grow(columns, &right_rows, targets, params, n_candidates, depth + 1, rng);
        if let Node::Split {
            left: l, right: r, ..
        } = &mut self.nodes[index as usize]
        {
            *l = left;
            *r = right;
        }
        index
    }

    fn push(&mut self, node: Node) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        index
    }

    /// Probability of the positive class for one sample.
    pub fn predict_probability(&self, row: &SparseRow) -> f32 {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                Node::Leaf { probability } => return *probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row_value(row, *feature) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

// ---------------------------------------------------------------------------
// Split search
// ---------------------------------------------------------------------------

/// Picks the `(feature, threshold)` pair with the lowest weighted Gini
/// impurity among `n_candidates` randomly sampled columns.
fn best_split(
    columns: &ColumnMatrix,
    rows: &[u32],
    targets: &[u8],
    node_positives: usize,
    n_candidates: usize,
    rng: &mut ChaCha8Rng,
) -> Option<(u32, f32)> {
    let n_cols = columns.n_cols();
    if n_cols == 0 {
        return None;
    }
    let k = n_candidates.clamp(1, n_cols);
    let mut best: Option<(u32, f32, f64)> = None;
    for feature in rand::seq::index::sample(rng, n_cols, k) {
        let Some((threshold, score)) =
            best_threshold(columns.column(feature), rows, targets, node_positives)
        else {
            continue;
        };
        if best.map_or(true, |(_, _, current)| score < current) {
            best = Some((feature as u32, threshold, score));
        }
    }
    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// Scans one column for the threshold minimizing weighted Gini impurity.
/// Returns `None` when the rows hold fewer than two distinct values.
fn best_threshold(
    column: &[(u32, f32)],
    rows: &[u32],
    targets: &[u8],
    node_positives: usize,
) -> Option<(f32, f64)> {
    let nonzero = gather(column, rows);
    if nonzero.is_empty() {
        return None;
    }
    let n = rows.len();
    let zero_count = n - nonzero.len();
    let nonzero_positives = nonzero
        .iter()
        .filter(|&&(row, _)| targets[row as usize] == 1)
        .count();

    // Value groups in ascending order: the implicit zero block first, then
    // runs of equal non-zero values.
    let mut pairs: Vec<(f32, u8)> = nonzero
        .iter()
        .map(|&(row, value)| (value, targets[row as usize]))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<(f32, usize, usize)> = Vec::new();
    if zero_count > 0 {
        groups.push((0.0, zero_count, node_positives - nonzero_positives));
    }
    for (value, target) in pairs {
        match groups.last_mut() {
            Some(group) if group.0 == value => {
                group.1 += 1;
                group.2 += usize::from(target == 1);
            }
            _ => groups.push((value, 1, usize::from(target == 1))),
        }
    }
    if groups.len() < 2 {
        return None;
    }

    let mut best: Option<(f32, f64)> = None;
    let mut left_count = 0usize;
    let mut left_positives = 0usize;
    for boundary in 0..groups.len() - 1 {
        left_count += groups[boundary].1;
        left_positives += groups[boundary].2;
        let right_count = n - left_count;
        let right_positives = node_positives - left_positives;
        let score = (left_count as f64 * gini(left_count, left_positives)
            + right_count as f64 * gini(right_count, right_positives))
            / n as f64;
        if best.map_or(true, |(_, current)| score < current) {
            let threshold = (groups[boundary].0 + groups[boundary + 1].0) / 2.0;
            best = Some((threshold, score));
        }
    }
    best
}

fn gini(count: usize, positives: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let p = positives as f64 / count as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

/// Intersects a sorted column with a sorted row list, yielding the rows'
/// non-zero values. Repeated rows yield repeated entries.
fn gather(column: &[(u32, f32)], rows: &[u32]) -> Vec<(u32, f32)> {
    let mut out = Vec::new();
    let mut ci = 0usize;
    for &row in rows {
        while ci < column.len() && column[ci].0 < row {
            ci += 1;
        }
        if ci < column.len() && column[ci].0 == row {
            out.push((row, column[ci].1));
        }
    }
    out
}

/// Splits `rows` on `feature <= threshold`, preserving sort order.
fn partition(column: &[(u32, f32)], rows: &[u32], threshold: f32) -> (Vec<u32>, Vec<u32>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut ci = 0usize;
    for &row in rows {
        while ci < column.len() && column[ci].0 < row {
            ci += 1;
        }
        let value = if ci < column.len() && column[ci].0 == row {
            column[ci].1
        } else {
            0.0
        };
        if value <= threshold {
            left.push(row);
        } else {
            right.push(row);
        }
    }
    (left, right)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseMatrix;
    use rand::SeedableRng;

    fn dense_columns(rows: &[&[f32]]) -> ColumnMatrix {
        let n_cols = rows[0].len();
        let mut matrix = SparseMatrix::new(n_cols);
        for row in rows {
            let sparse: SparseRow = row
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v != 0.0)
                .map(|(c, &v)| (c as u32, v))
                .collect();
            matrix.push_row(sparse);
        }
        matrix.to_columns()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_single_feature_split() {
        let columns = dense_columns(&[&[0.0], &[0.0], &[1.0], &[1.0]]);
        let targets = [0, 0, 1, 1];
        let rows: Vec<u32> = (0..4).collect();
        let tree = DecisionTree::fit(
            &columns,
            &rows,
            &targets,
            &TreeParams::default(),
            1,
            &mut rng(),
        );
        assert_eq!(tree.predict_probability(&vec![]), 0.0);
        assert_eq!(tree.predict_probability(&vec![(0, 1.0)]), 1.0);
        // Threshold sits at the midpoint 0.5.
        assert_eq!(tree.predict_probability(&vec![(0, 0.4)]), 0.0);
        assert_eq!(tree.predict_probability(&vec![(0, 0.6)]), 1.0);
    }

    #[test]
    fn test_pure_node_is_a_single_leaf() {
        let columns = dense_columns(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
        let targets = [1, 1, 1];
        let rows: Vec<u32> = (0..3).collect();
        let tree = DecisionTree::fit(
            &columns,
            &rows,
            &targets,
            &TreeParams::default(),
            2,
            &mut rng(),
        );
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_probability(&vec![(0, 1.0)]), 1.0);
    }

    #[test]
    fn test_max_depth_zero_yields_prior() {
        let columns = dense_columns(&[&[0.0], &[1.0], &[1.0], &[1.0]]);
        let targets = [0, 1, 1, 1];
        let rows: Vec<u32> = (0..4).collect();
        let params = TreeParams {
            max_depth: Some(0),
            min_samples_split: 2,
        };
        let tree = DecisionTree::fit(&columns, &rows, &targets, &params, 1, &mut rng());
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_probability(&vec![]), 0.75);
    }

    #[test]
    fn test_min_samples_split_stops_growth() {
        let columns = dense_columns(&[&[0.0], &[1.0]]);
        let targets = [0, 1];
        let rows: Vec<u32> = (0..2).collect();
        let params = TreeParams {
            max_depth: None,
            min_samples_split: 3,
        };
        let tree = DecisionTree::fit(&columns, &rows, &targets, &params, 1, &mut rng());
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_probability(&vec![]), 0.5);
    }

    #[test]
    fn test_constant_feature_becomes_leaf() {
        let columns = dense_columns(&[&[1.0], &[1.0], &[1.0], &[1.0]]);
        let targets = [0, 1, 0, 1];
        let rows: Vec<u32> = (0..4).collect();
        let tree = DecisionTree::fit(
            &columns,
            &rows,
            &targets,
            &TreeParams::default(),
            1,
            &mut rng(),
        );
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_probability(&vec![(0, 1.0)]), 0.5);
    }

    #[test]
    fn test_two_feature_interaction() {
        // Positive iff feature 0 is high, regardless of feature 1.
        let columns = dense_columns(&[
            &[0.9, 0.1],
            &[0.8, 0.9],
            &[0.1, 0.8],
            &[0.2, 0.2],
            &[0.9, 0.5],
            &[0.1, 0.5],
        ]);
        let targets = [1, 1, 0, 0, 1, 0];
        let rows: Vec<u32> = (0..6).collect();
        let tree = DecisionTree::fit(
            &columns,
            &rows,
            &targets,
            &TreeParams::default(),
            2,
            &mut rng(),
        );
        assert_eq!(tree.predict_probability(&vec![(0, 0.85), (1, 0.5)]), 1.0);
        assert_eq!(tree.predict_probability(&vec![(0, 0.15), (1, 0.5)]), 0.0);
    }

    #[test]
    fn test_bootstrap_rows_with_repeats() {
        let columns = dense_columns(&[&[0.0], &[1.0], &[1.0]]);
        let targets = [0, 1, 1];
        // Row 1 drawn twice, row 2 absent; still separable.
        let rows = vec![0, 1, 1];
        let tree = DecisionTree::fit(
            &columns,
            &rows,
            &targets,
            &TreeParams::default(),
            1,
            &mut rng(),
        );
        assert_eq!(tree.predict_probability(&vec![(0, 1.0)]), 1.0);
        assert_eq!(tree.predict_probability(&vec![]), 0.0);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let columns = dense_columns(&[
            &[0.9, 0.1, 0.3],
            &[0.8, 0.9, 0.1],
            &[0.1, 0.8, 0.9],
            &[0.2, 0.2, 0.7],
            &[0.9, 0.5, 0.2],
            &[0.1, 0.5, 0.8],
        ]);
        let targets = [1, 1, 0, 0, 1, 0];
        let rows: Vec<u32> = (0..6).collect();
        let a = DecisionTree::fit(&columns, &rows, &targets, &TreeParams::default(), 2, &mut rng());
        let b = DecisionTree::fit(&columns, &rows, &targets, &TreeParams::default(), 2, &mut rng());
        assert_eq!(a, b);
    }
}
