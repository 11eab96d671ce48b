//! Feature matrix for the shallow classifier: TF-IDF terms followed by three
//! dense text statistics.
#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

use crate::clean::clean_corpus_text;
use crate::error::TrainError;
use crate::tfidf::{TfidfParams, TfidfVectorizer};

/// Names of the dense columns appended after the term columns.
pub const NUMERIC_FEATURES: [&str; 3] = ["word_count", "char_count", "avg_word_length"];

/// Row-compressed sparse matrix with column-sorted rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    entries: Vec<(usize, f64)>,
}

impl Default for SparseMatrix {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SparseMatrix {
    #[must_use]
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            entries: Vec::new(),
        }
    }

    /// Append a row of `(column, value)` pairs sorted by column.
    pub fn push_row(&mut self, row: &[(usize, f64)]) {
        self.entries
            .extend(row.iter().copied().filter(|&(col, v)| col < self.n_cols && v != 0.0));
        self.indptr.push(self.entries.len());
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.indptr.len().saturating_sub(1)
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[(usize, f64)] {
        &self.entries[self.indptr[row]..self.indptr[row + 1]]
    }

    /// Stored value, or `0.0` for an implicit zero.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let entries = self.row(row);
        entries
            .binary_search_by_key(&col, |&(c, _)| c)
            .map_or(0.0, |i| entries[i].1)
    }
}

/// `word_count`, `char_count`, and `avg_word_length` of cleaned text.
/// The average is zero for text without words.
#[must_use]
pub fn numeric_features(cleaned: &str) -> [f64; 3] {
    let words = cleaned.split_whitespace().count() as f64;
    let chars = cleaned.chars().count() as f64;
    let avg = if words > 0.0 { chars / words } else { 0.0 };
    [words, chars, avg]
}

/// Sparse term columns with the dense statistics appended, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    terms: SparseMatrix,
    numeric: Vec<[f64; 3]>,
}

impl FeatureMatrix {
    /// # Panics
    ///
    /// Panics if the two parts disagree on row count.
    #[must_use]
    pub fn new(terms: SparseMatrix, numeric: Vec<[f64; 3]>) -> Self {
        assert_eq!(terms.n_rows(), numeric.len(), "feature parts must be row-aligned");
        Self { terms, numeric }
    }

    /// Vectorize unseen cleaned text with a fitted vectorizer.
    #[must_use]
    pub fn from_cleaned(vectorizer: &TfidfVectorizer, cleaned: &[String]) -> Self {
        let numeric = cleaned.iter().map(|c| numeric_features(c)).collect();
        Self::new(vectorizer.transform(cleaned), numeric)
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.numeric.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.terms.n_cols() + NUMERIC_FEATURES.len()
    }

    #[must_use]
    pub fn terms(&self) -> &SparseMatrix {
        &self.terms
    }

    #[must_use]
    pub fn get(&self, row: usize, feature: usize) -> f64 {
        let n_terms = self.terms.n_cols();
        if feature < n_terms {
            self.terms.get(row, feature)
        } else {
            self.numeric[row][feature - n_terms]
        }
    }

    /// Dense copy of one row.
    #[must_use]
    pub fn dense_row(&self, row: usize) -> Vec<f64> {
        let mut out = vec![0.0; self.n_features()];
        for &(col, v) in self.terms.row(row) {
            out[col] = v;
        }
        let n_terms = self.terms.n_cols();
        out[n_terms..].copy_from_slice(&self.numeric[row]);
        out
    }
}

/// Cleaned corpus text plus its fitted vectorizer and feature matrix.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub cleaned: Vec<String>,
    pub vectorizer: TfidfVectorizer,
    pub matrix: FeatureMatrix,
}

/// Clean every comment, fit the vectorizer, and append the dense statistics.
///
/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] if the vocabulary ends up empty.
pub fn build_features(comments: &[String], params: TfidfParams) -> Result<FeatureSet, TrainError> {
    let cleaned: Vec<String> = comments.iter().map(|c| clean_corpus_text(c)).collect();
    let numeric = cleaned.iter().map(|c| numeric_features(c)).collect();
    let (vectorizer, terms) = TfidfVectorizer::fit_transform(&cleaned, params)?;
    let matrix = FeatureMatrix::new(terms, numeric);
    tracing::info!(
        rows = matrix.n_rows(),
        features = matrix.n_features(),
        nnz = matrix.terms().nnz(),
        "built feature matrix"
    );
    Ok(FeatureSet {
        cleaned,
        vectorizer,
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matrix_is_empty() {
        let mut matrix = SparseMatrix::default();
        assert_eq!(matrix.n_rows(), 0);
        assert_eq!(matrix.nnz(), 0);
        matrix.push_row(&[]);
        assert_eq!(matrix.n_rows(), 1);
        assert!(matrix.row(0).is_empty());
    }

    #[test]
    fn numeric_features_handle_empty_text() {
        assert_eq!(numeric_features(""), [0.0, 0.0, 0.0]);
        assert_eq!(numeric_features("ab cdef"), [2.0, 7.0, 3.5]);
    }

    #[test]
    fn sparse_lookup_returns_implicit_zeros() {
        let mut m = SparseMatrix::new(4);
        m.push_row(&[(1, 0.5), (3, 0.25)]);
        m.push_row(&[]);
        assert_eq!(m.n_rows(), 2);
        assert!((m.get(0, 3) - 0.25).abs() < f64::EPSILON);
        assert!(m.get(0, 2).abs() < f64::EPSILON);
        assert!(m.row(1).is_empty());
    }

    #[test]
    fn dense_columns_follow_term_columns() {
        let comments: Vec<String> = ["The service was great", "Great service, slow food", "food"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let features = build_features(&comments, TfidfParams::default()).unwrap();
        let matrix = &features.matrix;

        assert_eq!(features.cleaned[0], "service great");
        let n_terms = features.vectorizer.vocabulary_len();
        assert_eq!(matrix.n_features(), n_terms + 3);
        assert!((matrix.get(0, n_terms) - 2.0).abs() < f64::EPSILON);
        assert!((matrix.get(0, n_terms + 1) - 13.0).abs() < f64::EPSILON);
        assert!((matrix.get(0, n_terms + 2) - 6.5).abs() < f64::EPSILON);
        assert_eq!(matrix.dense_row(2).len(), matrix.n_features());
    }
}
