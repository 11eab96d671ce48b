//! Rule-based sentiment scoring over resolved tables.

use std::path::Path;

use critiq_core::Table;
use critiq_resolver::{ColumnResolver, Resolution};

use crate::error::SentimentError;
use crate::nlp::{EnglishPipeline, NlpPipeline};
use crate::normalize::normalize;
use crate::polarity::{LexiconPolarity, PolarityScorer};
use crate::types::{SentimentBatch, SentimentLabel, SentimentResult, TextSentiment};

/// Normalizes and scores comments with injected NLP and polarity capabilities.
///
/// Holds only read-only resources; build once and share by reference.
#[derive(Debug, Clone)]
pub struct SentimentScorer<N = EnglishPipeline, P = LexiconPolarity> {
    nlp: N,
    polarity: P,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SentimentScorer {
    /// Built-in English stop words and polarity lexicon.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(EnglishPipeline::default(), LexiconPolarity::default())
    }

    /// Load the built-in pipeline and lexicon, or replacements from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] if a given resource file is missing or
    /// malformed.
    pub fn load(stop_words: Option<&Path>, lexicon: Option<&Path>) -> Result<Self, SentimentError> {
        Ok(Self::new(
            EnglishPipeline::load(stop_words)?,
            LexiconPolarity::load(lexicon)?,
        ))
    }
}

impl<N: NlpPipeline, P: PolarityScorer> SentimentScorer<N, P> {
    pub fn new(nlp: N, polarity: P) -> Self {
        Self { nlp, polarity }
    }

    #[must_use]
    pub fn normalize(&self, raw: Option<&str>) -> String {
        normalize(&self.nlp, raw)
    }

    /// Score one comment. Falls back to the raw text when normalization
    /// leaves nothing.
    #[must_use]
    pub fn score_text(&self, raw: Option<&str>) -> TextSentiment {
        let cleaned = self.normalize(raw);
        let compound = if cleaned.is_empty() {
            self.polarity.compound(raw.unwrap_or_default())
        } else {
            self.polarity.compound(&cleaned)
        };
        let (label, score) = SentimentLabel::from_compound(compound);
        TextSentiment {
            label,
            score,
            compound,
        }
    }

    /// Score every projected row of a resolution.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::UnresolvableComment`] when no column is
    /// bound to `comment`.
    pub fn score_resolution(&self, resolution: &Resolution) -> Result<SentimentBatch, SentimentError> {
        if !resolution.has_comment() {
            return Err(SentimentError::UnresolvableComment {
                columns: resolution.source_columns.clone(),
            });
        }

        let rows: Vec<SentimentResult> = resolution
            .records
            .iter()
            .map(|record| {
                let comment = record.comment.as_text();
                let sentiment = self.score_text(comment.as_deref());
                SentimentResult {
                    record_id: record.record_id.clone(),
                    comment: comment.unwrap_or_default(),
                    label: sentiment.label,
                    score: sentiment.score,
                    compound: sentiment.compound,
                    category: record.category.clone(),
                    timestamp: record.timestamp.clone(),
                }
            })
            .collect();

        let batch = SentimentBatch::from_rows(rows);
        tracing::info!(
            rows = batch.rows.len(),
            overall_score = batch.overall_score,
            "scored comment batch"
        );
        Ok(batch)
    }

    /// Resolve `table` and score it.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::UnresolvableComment`] listing the table's
    /// columns when no comment column can be bound.
    pub fn score_table(
        &self,
        resolver: &ColumnResolver,
        table: &Table,
    ) -> Result<SentimentBatch, SentimentError> {
        self.score_resolution(&resolver.resolve(table))
    }
}
