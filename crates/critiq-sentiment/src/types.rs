use critiq_core::Cell;
use serde::{Deserialize, Serialize};

/// Five-level sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    StrongPositive,
    Supportive,
    Neutral,
    Critical,
    StrongNegative,
}

impl SentimentLabel {
    /// Map a compound score to a label and its 1..=5 score.
    ///
    /// Thresholds are inclusive on the lower bound and checked top-down.
    #[must_use]
    pub fn from_compound(compound: f64) -> (Self, u8) {
        if compound >= 0.6 {
            (SentimentLabel::StrongPositive, 5)
        } else if compound >= 0.2 {
            (SentimentLabel::Supportive, 4)
        } else if compound >= -0.2 {
            (SentimentLabel::Neutral, 3)
        } else if compound >= -0.6 {
            (SentimentLabel::Critical, 2)
        } else {
            (SentimentLabel::StrongNegative, 1)
        }
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, SentimentLabel::StrongPositive | SentimentLabel::Supportive)
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(self, SentimentLabel::Critical | SentimentLabel::StrongNegative)
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SentimentLabel::StrongPositive => "StrongPositive",
            SentimentLabel::Supportive => "Supportive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Critical => "Critical",
            SentimentLabel::StrongNegative => "StrongNegative",
        };
        f.write_str(name)
    }
}

/// Classification of one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSentiment {
    pub label: SentimentLabel,
    /// 1 (strong negative) to 5 (strong positive).
    pub score: u8,
    /// Compound polarity in `[-1.0, 1.0]`.
    pub compound: f64,
}

/// One scored row, carrying the resolved context columns through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub record_id: Cell,
    /// Raw comment text; empty when the cell was absent.
    pub comment: String,
    pub label: SentimentLabel,
    pub score: u8,
    pub compound: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Cell>,
}

/// Label distribution over a batch, bucketed into three groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub total: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub positive_pct: f64,
    pub neutral_pct: f64,
    pub negative_pct: f64,
}

impl SentimentSummary {
    /// Count rows per bucket. Percentages are rounded to one decimal and are
    /// all zero for an empty batch.
    #[must_use]
    pub fn from_rows(rows: &[SentimentResult]) -> Self {
        let total = rows.len();
        let positive = rows.iter().filter(|r| r.label.is_positive()).count();
        let negative = rows.iter().filter(|r| r.label.is_negative()).count();
        let neutral = total - positive - negative;
        Self {
            total,
            positive,
            neutral,
            negative,
            positive_pct: percent(positive, total),
            neutral_pct: percent(neutral, total),
            negative_pct: percent(negative, total),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Scored rows of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBatch {
    pub rows: Vec<SentimentResult>,
    /// Mean of per-row integer scores; `0.0` for an empty batch.
    pub overall_score: f64,
    pub summary: SentimentSummary,
}

impl SentimentBatch {
    #[must_use]
    pub fn from_rows(rows: Vec<SentimentResult>) -> Self {
        let overall_score = if rows.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let denom = rows.len() as f64;
            let sum: f64 = rows.iter().map(|r| f64::from(r.score)).sum();
            sum / denom
        };
        let summary = SentimentSummary::from_rows(&rows);
        Self {
            rows,
            overall_score,
            summary,
        }
    }
}
