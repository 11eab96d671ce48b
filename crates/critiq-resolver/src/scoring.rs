//! Per-role content heuristics. Higher is a better fit.
#![allow(clippy::cast_precision_loss)]

use std::collections::HashSet;

use critiq_core::{Cell, Column};

use crate::timestamp::cell_is_timestamp;
use crate::types::CanonicalRole;

/// Non-null values sampled for comment and category scoring.
pub const TEXT_SAMPLE: usize = 200;
/// Non-null values sampled for record-id scoring.
pub const ID_SAMPLE: usize = 500;
/// Minimum parse rate for a timestamp winner to be kept.
pub const TIMESTAMP_MIN_SCORE: f64 = 0.5;

/// Score `column` for `role`.
#[must_use]
pub fn score(role: CanonicalRole, column: &Column) -> f64 {
    match role {
        CanonicalRole::Comment => comment_score(column),
        CanonicalRole::Timestamp => timestamp_score(column),
        CanonicalRole::Category => category_score(column),
        CanonicalRole::RecordId => record_id_score(column),
    }
}

/// `2 * text_typed + mean length - 3 * numeric fraction` over the sample.
#[must_use]
pub fn comment_score(column: &Column) -> f64 {
    let sample = sample(column, TEXT_SAMPLE);
    if sample.is_empty() {
        return 0.0;
    }
    let n = sample.len() as f64;
    let mean_len = sample
        .iter()
        .map(|c| c.as_text().map_or(0, |s| s.chars().count()) as f64)
        .sum::<f64>()
        / n;
    2.0 * text_typed(column) + mean_len - 3.0 * numeric_fraction(&sample)
}

/// Fraction of all cells (nulls included) that parse as a timestamp.
#[must_use]
pub fn timestamp_score(column: &Column) -> f64 {
    if column.cells.is_empty() {
        return 0.0;
    }
    let parsed = column.cells.iter().filter(|c| cell_is_timestamp(c)).count();
    parsed as f64 / column.cells.len() as f64
}

/// `2 * text_typed + (1 - distinct / non_null)` over the sample.
#[must_use]
pub fn category_score(column: &Column) -> f64 {
    let sample = sample(column, TEXT_SAMPLE);
    let unique_ratio = if sample.is_empty() {
        1.0
    } else {
        distinct_count(&sample) as f64 / sample.len() as f64
    };
    2.0 * text_typed(column) + (1.0 - unique_ratio)
}

/// `2 * numeric fraction + distinct / sampled` over the sample.
#[must_use]
pub fn record_id_score(column: &Column) -> f64 {
    let sample = sample(column, ID_SAMPLE);
    if sample.is_empty() {
        return 0.0;
    }
    2.0 * numeric_fraction(&sample) + distinct_count(&sample) as f64 / sample.len() as f64
}

fn sample(column: &Column, limit: usize) -> Vec<&Cell> {
    column.non_null().take(limit).collect()
}

/// 1.0 when the column holds any text cell, so mixed columns count as text.
fn text_typed(column: &Column) -> f64 {
    if column.cells.iter().any(Cell::is_text) {
        1.0
    } else {
        0.0
    }
}

fn numeric_fraction(sample: &[&Cell]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().filter(|c| c.is_numeric()).count() as f64 / sample.len() as f64
}

fn distinct_count(sample: &[&Cell]) -> usize {
    sample.iter().map(|c| distinct_key(c)).collect::<HashSet<_>>().len()
}

/// Hashable identity for a cell; `Int(1)` and `Text("1")` stay distinct.
fn distinct_key(cell: &Cell) -> (u8, String) {
    match cell {
        Cell::Null => (0, String::new()),
        Cell::Int(i) => (1, i.to_string()),
        Cell::Float(f) => (2, f.to_bits().to_string()),
        Cell::Text(s) => (3, s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_column(values: &[&str]) -> Column {
        Column::new("c", values.iter().map(|v| Cell::coerce(v)).collect())
    }

    #[test]
    fn comment_prefers_long_text_over_numbers() {
        let prose = text_column(&["this product arrived broken", "works as described"]);
        let numbers = text_column(&["1", "2"]);
        assert!(comment_score(&prose) > comment_score(&numbers));
        assert!((comment_score(&numbers) - (1.0 - 3.0)).abs() < 1e-9);
    }

    #[test]
    fn comment_of_all_null_column_is_zero() {
        let column = Column::new("c", vec![Cell::Null, Cell::Null]);
        assert!(comment_score(&column).abs() < f64::EPSILON);
    }

    #[test]
    fn timestamp_counts_nulls_in_denominator() {
        let column = Column::new(
            "t",
            vec![
                Cell::Text("2024-01-01".to_string()),
                Cell::Null,
                Cell::Text("not a date".to_string()),
                Cell::Text("2024-02-01".to_string()),
            ],
        );
        assert!((timestamp_score(&column) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn category_rewards_low_cardinality_text() {
        let repeated = text_column(&["billing", "billing", "shipping", "billing"]);
        let unique = text_column(&["a", "b", "c", "d"]);
        assert!((category_score(&repeated) - 2.5).abs() < 1e-9);
        assert!((category_score(&unique) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn category_of_empty_column_has_no_cardinality_bonus() {
        let column = Column::new("c", Vec::new());
        assert!(category_score(&column).abs() < f64::EPSILON);
    }

    #[test]
    fn record_id_rewards_numeric_unique_values() {
        let ids = text_column(&["1", "2", "3", "4"]);
        let words = text_column(&["x", "x", "y", "y"]);
        assert!((record_id_score(&ids) - 3.0).abs() < 1e-9);
        assert!((record_id_score(&words) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn sample_is_bounded() {
        let mut cells: Vec<Cell> = (0..ID_SAMPLE as i64).map(Cell::Int).collect();
        cells.extend(std::iter::repeat_n(Cell::Int(0), 100));
        let column = Column::new("id", cells);
        assert!((record_id_score(&column) - 3.0).abs() < 1e-9);
    }
}
