//! TF-IDF vectorization.
//!
//! Turns tokenized messages into L2-normalized TF-IDF rows. The vocabulary
//! is learned from the training fold only, sorted for stable column order,
//! and optionally pruned of near-ubiquitous terms via `max_df`. IDF uses
//! the smoothed form `ln((1 + n) / (1 + df)) + 1`, which keeps every weight
//! strictly positive and tolerates unseen terms at prediction time.

use crate::sparse::{SparseMatrix, SparseRow};
use crate::tokenize::tokenize;
use crisistriage_core::{Result, TriageError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Vectorizer hyperparameters; the axes the grid search explores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorizerParams {
    /// Longest n-gram to emit. 1 keeps unigrams only, 2 adds bigrams.
    pub ngram_max: usize,
    /// Drop terms present in more than this fraction of documents.
    pub max_df: f64,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        VectorizerParams {
            ngram_max: 1,
            max_df: 1.0,
        }
    }
}

impl fmt::Display for VectorizerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ngram_max={}, max_df={:.2}", self.ngram_max, self.max_df)
    }
}

impl VectorizerParams {
    fn validate(&self) -> Result<()> {
        if self.ngram_max == 0 {
            return Err(TriageError::Config(
                "ngram_max must be at least 1".to_string(),
            ));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(TriageError::Config(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        Ok(())
    }
}

/// TF-IDF vectorizer fitted on a training corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    params: VectorizerParams,
    /// Vocabulary terms, sorted; index in this vec is the feature column.
    terms: Vec<String>,
    index: HashMap<String, u32>,
    idf: Vec<f32>,
    n_documents: usize,
}

impl TfidfVectorizer {
    /// Creates an unfitted vectorizer. Call [`TfidfVectorizer::fit`] before
    /// transforming; an unfitted vectorizer maps every document to an empty
    /// row.
    pub fn new(params: VectorizerParams) -> Self {
        TfidfVectorizer {
            params,
            terms: Vec::new(),
            index: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
        }
    }

    pub fn params(&self) -> VectorizerParams {
        self.params
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Vocabulary terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Learns the vocabulary and IDF weights from `documents`.
    pub fn fit(&mut self, documents: &[&str]) -> Result<()> {
        self.params.validate()?;
        if documents.is_empty() {
            return Err(TriageError::Training(
                "cannot fit vectorizer on an empty corpus".to_string(),
            ));
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for document in documents {
            let tokens = tokenize(document);
            let unique: HashSet<String> = self.ngrams(&tokens).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len();
        let cutoff = self.params.max_df * n as f64;
        let mut kept: Vec<String> = document_frequency
            .iter()
            .filter(|(_, &df)| df as f64 <= cutoff)
            .map(|(term, _)| term.clone())
            .collect();
        kept.sort_unstable();
        if kept.is_empty() {
            return Err(TriageError::Training(
                "vocabulary is empty after document-frequency filtering".to_string(),
            ));
        }

        self.idf = kept
            .iter()
            .map(|term| {
                let df = document_frequency[term];
                (((1 + n) as f64 / (1 + df) as f64).ln() + 1.0) as f32
            })
            .collect();
        self.index = kept
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i as u32))
            .collect();
        self.terms = kept;
        self.n_documents = n;
        Ok(())
    }

    /// Maps a document onto the fitted vocabulary. Terms outside the
    /// vocabulary are ignored; a document with no known terms yields an
    /// empty (all-zero) row.
    pub fn transform(&self, document: &str) -> SparseRow {
        let tokens = tokenize(document);
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for term in self.ngrams(&tokens) {
            if let Some(&column) = self.index.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .map(|(column, count)| (column, count * self.idf[column as usize]))
            .collect();
        row.sort_unstable_by_key(|&(column, _)| column);

        let norm = row.iter().map(|&(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for entry in row.iter_mut() {
                entry.1 /= norm;
            }
        }
        row
    }

    /// Transforms a batch of documents into a sparse matrix.
    pub fn transform_all(&self, documents: &[&str]) -> SparseMatrix {
        let mut matrix = SparseMatrix::new(self.vocabulary_size());
        for document in documents {
            matrix.push_row(self.transform(document));
        }
        matrix
    }

    /// Emits unigrams up to `ngram_max`-grams; longer grams join their
    /// tokens with a single space.
    fn ngrams(&self, tokens: &[String]) -> Vec<String> {
        let mut grams: Vec<String> = tokens.to_vec();
        for n in 2..=self.params.ngram_max {
            if tokens.len() < n {
                break;
            }
            for window in tokens.windows(n) {
                grams.push(window.join(" "));
            }
        }
        grams
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
