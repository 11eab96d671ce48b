//! Word n-gram TF-IDF vectorizer.
//!
//! Tokens are runs of two or more word characters. Vocabulary terms must
//! appear in at least `min_df` documents; when more than `max_features`
//! survive, the most frequent across the corpus are kept. Weights use a
//! smoothed idf, `ln((1 + n) / (1 + df)) + 1`, and every row is L2-normalized.
#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TrainError;
use crate::features::SparseMatrix;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfidfParams {
    pub max_features: usize,
    pub min_df: usize,
    pub ngram_min: usize,
    pub ngram_max: usize,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            max_features: 20_000,
            min_df: 2,
            ngram_min: 1,
            ngram_max: 2,
        }
    }
}

/// Fitted vocabulary and idf weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    params: TfidfParams,
    /// Term to column index; indices follow alphabetical term order.
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and idf from `docs` and return their weighted matrix.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::TrainingFailure`] when no term survives pruning.
    pub fn fit_transform(
        docs: &[String],
        params: TfidfParams,
    ) -> Result<(Self, SparseMatrix), TrainError> {
        let analyzed: Vec<Vec<String>> = docs.iter().map(|d| analyze(d, &params)).collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            let mut seen: Vec<&str> = terms.iter().map(String::as_str).collect();
            for &term in &seen {
                *term_freq.entry(term).or_default() += 1;
            }
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        let mut kept: Vec<(&str, usize)> = term_freq
            .into_iter()
            .filter(|(term, _)| doc_freq.get(term).copied().unwrap_or_default() >= params.min_df)
            .collect();
        if kept.is_empty() {
            return Err(TrainError::training(
                "tfidf",
                format!("no terms remain with min_df = {}", params.min_df),
            ));
        }
        if kept.len() > params.max_features {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(params.max_features);
        }

        let mut terms: Vec<&str> = kept.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let n_docs = docs.len() as f64;
        let idf = terms
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or_default() as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        let vectorizer = Self {
            params,
            vocabulary,
            idf,
        };
        let matrix = vectorizer.weigh(&analyzed);
        tracing::info!(
            documents = docs.len(),
            vocabulary = vectorizer.vocabulary_len(),
            "fitted tfidf vocabulary"
        );
        Ok((vectorizer, matrix))
    }

    /// Weigh unseen documents with the fitted vocabulary.
    #[must_use]
    pub fn transform(&self, docs: &[String]) -> SparseMatrix {
        let analyzed: Vec<Vec<String>> = docs.iter().map(|d| analyze(d, &self.params)).collect();
        self.weigh(&analyzed)
    }

    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    #[must_use]
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    #[must_use]
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|idx| self.idf[idx])
    }

    fn weigh(&self, analyzed: &[Vec<String>]) -> SparseMatrix {
        let mut matrix = SparseMatrix::new(self.vocabulary.len());
        for terms in analyzed {
            let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
            for term in terms {
                if let Some(&idx) = self.vocabulary.get(term) {
                    *counts.entry(idx).or_default() += 1.0;
                }
            }
            let mut row: Vec<(usize, f64)> = counts
                .into_iter()
                .map(|(idx, tf)| (idx, tf * self.idf[idx]))
                .collect();
            let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, v) in &mut row {
                    *v /= norm;
                }
            }
            matrix.push_row(&row);
        }
        matrix
    }
}

/// Word n-grams of `doc`, lower-cased, in document order.
fn analyze(doc: &str, params: &TfidfParams) -> Vec<String> {
    let lower = doc.to_lowercase();
    let tokens: Vec<&str> = TOKEN.find_iter(&lower).map(|m| m.as_str()).collect();
    let mut out = Vec::new();
    for n in params.ngram_min.max(1)..=params.ngram_max {
        for window in tokens.windows(n) {
            out.push(window.join(" "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn builds_unigrams_and_bigrams_above_min_df() {
        let corpus = docs(&["good service fast", "good service slow", "bad food"]);
        let (vectorizer, matrix) =
            TfidfVectorizer::fit_transform(&corpus, TfidfParams::default()).unwrap();

        assert_eq!(vectorizer.vocabulary_len(), 3);
        assert_eq!(vectorizer.term_index("good"), Some(0));
        assert_eq!(vectorizer.term_index("good service"), Some(1));
        assert_eq!(vectorizer.term_index("service"), Some(2));
        assert!(vectorizer.term_index("bad").is_none());
        assert_eq!(matrix.n_rows(), 3);
        assert!(matrix.row(2).is_empty());
    }

    #[test]
    fn idf_is_smoothed_and_rows_are_unit_length() {
        let corpus = docs(&["alpha beta", "alpha gamma", "beta gamma", "alpha"]);
        let params = TfidfParams {
            ngram_max: 1,
            ..TfidfParams::default()
        };
        let (vectorizer, matrix) = TfidfVectorizer::fit_transform(&corpus, params).unwrap();

        let expected = (5.0_f64 / 4.0).ln() + 1.0;
        assert!((vectorizer.idf("alpha").unwrap() - expected).abs() < 1e-12);
        for i in 0..matrix.n_rows() {
            let norm: f64 = matrix.row(i).iter().map(|(_, v)| v * v).sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let corpus = docs(&["aa bb bb cc cc", "aa bb cc", "bb cc dd", "dd aa"]);
        let params = TfidfParams {
            max_features: 2,
            ngram_max: 1,
            ..TfidfParams::default()
        };
        let (vectorizer, _) = TfidfVectorizer::fit_transform(&corpus, params).unwrap();
        assert_eq!(vectorizer.term_index("bb"), Some(0));
        assert_eq!(vectorizer.term_index("cc"), Some(1));
        assert!(vectorizer.term_index("aa").is_none());
    }

    #[test]
    fn transform_ignores_unknown_terms() {
        let corpus = docs(&["red apple", "red pear"]);
        let (vectorizer, _) =
            TfidfVectorizer::fit_transform(&corpus, TfidfParams::default()).unwrap();
        let matrix = vectorizer.transform(&docs(&["blue red red", "zz"]));
        assert_eq!(matrix.row(0).len(), 1);
        assert_eq!(matrix.row(0)[0].0, 0);
        assert!((matrix.row(0)[0].1 - 1.0).abs() < 1e-12);
        assert!(matrix.row(1).is_empty());
    }

    #[test]
    fn empty_vocabulary_is_a_training_failure() {
        let err = TfidfVectorizer::fit_transform(&docs(&["one", "two"]), TfidfParams::default())
            .unwrap_err();
        assert!(matches!(err, TrainError::TrainingFailure { .. }));
    }
}
