//! Per-class precision, recall, and F1.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Score predictions against truth. Undefined ratios count as `0.0`.
    ///
    /// Classes are the full `labels` set, including ones absent from both.
    #[must_use]
    pub fn new(truth: &[usize], predicted: &[usize], labels: &[String]) -> Self {
        let n_classes = labels.len();
        let mut tp = vec![0usize; n_classes];
        let mut pred_count = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];
        for (&t, &p) in truth.iter().zip(predicted) {
            support[t] += 1;
            pred_count[p] += 1;
            if t == p {
                tp[t] += 1;
            }
        }

        let per_class: Vec<ClassMetrics> = (0..n_classes)
            .map(|c| {
                let precision = ratio(tp[c], pred_count[c]);
                let recall = ratio(tp[c], support[c]);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support: support[c],
                }
            })
            .collect();

        let total: usize = support.iter().sum();
        let correct: usize = tp.iter().sum();
        let macro_avg = average(&per_class, |_| 1.0, n_classes as f64, total);
        let weighted_avg = average(&per_class, |m| m.support as f64, total as f64, total);

        Self {
            classes: labels.iter().cloned().zip(per_class).collect(),
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn average(
    metrics: &[ClassMetrics],
    weight: impl Fn(&ClassMetrics) -> f64,
    denom: f64,
    support: usize,
) -> ClassMetrics {
    if denom == 0.0 {
        return ClassMetrics {
            support,
            ..ClassMetrics::default()
        };
    }
    let sum = |f: fn(&ClassMetrics) -> f64| metrics.iter().map(|m| weight(m) * f(m)).sum::<f64>() / denom;
    ClassMetrics {
        precision: sum(|m| m.precision),
        recall: sum(|m| m.recall),
        f1: sum(|m| m.f1),
        support,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .keys()
            .map(String::len)
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or_default();
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in &self.classes {
            writeln!(
                f,
                "{label:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}
