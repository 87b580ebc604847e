//! Sparse feature matrices.
//!
//! TF-IDF rows over a message corpus are overwhelmingly zero, so features
//! are stored as `(column, value)` pairs. The row-major form is what the
//! vectorizer produces and the predictors consume; the column-major view
//! is built once per training run for split search in the tree trainer.

/// One sparse row: `(column, value)` pairs sorted by column, zeros omitted.
pub type SparseRow = Vec<(u32, f32)>;

/// Looks up a column in a sparse row; absent columns are zero.
pub fn row_value(row: &SparseRow, column: u32) -> f32 {
    match row.binary_search_by_key(&column, |&(c, _)| c) {
        Ok(i) => row[i].1,
        Err(_) => 0.0,
    }
}

/// Row-major sparse matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n_cols: usize,
    rows: Vec<SparseRow>,
}

impl SparseMatrix {
    /// Creates an empty matrix with `n_cols` columns.
    pub fn new(n_cols: usize) -> Self {
        SparseMatrix {
            n_cols,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Entries must be sorted by column and within bounds.
    pub fn push_row(&mut self, row: SparseRow) {
        debug_assert!(row.windows(2).all(|w| w[0].0 < w[1].0));
        debug_assert!(row.iter().all(|&(c, _)| (c as usize) < self.n_cols));
        self.rows.push(row);
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, index: usize) -> &SparseRow {
        &self.rows[index]
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Builds the column-major view of this matrix.
    pub fn to_columns(&self) -> ColumnMatrix {
        let mut columns: Vec<Vec<(u32, f32)>> = vec![Vec::new(); self.n_cols];
        for (row_id, row) in self.rows.iter().enumerate() {
            for &(col, value) in row {
                columns[col as usize].push((row_id as u32, value));
            }
        }
        // Rows are visited in order, so each column is already sorted.
        ColumnMatrix {
            n_rows: self.rows.len(),
            columns,
        }
    }
}

/// Column-major sparse matrix: per column, `(row, value)` pairs sorted by
/// row, zeros omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMatrix {
    n_rows: usize,
    columns: Vec<Vec<(u32, f32)>>,
}

impl ColumnMatrix {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Non-zero entries of one column.
    pub fn column(&self, index: usize) -> &[(u32, f32)] {
        &self.columns[index]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
