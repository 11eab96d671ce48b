//! Gini classification tree grown on a bootstrap sample.
#![allow(clippy::cast_precision_loss)]

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::features::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Non-constant features examined per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        probs: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Arena-allocated tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree over `samples` (row indices, repeats allowed).
    pub fn fit(
        x: &FeatureMatrix,
        y: &[usize],
        n_classes: usize,
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { probs: Vec::new() }];
        let mut stack = vec![Pending {
            node: 0,
            samples,
            depth: 0,
        }];
        let mut features: Vec<usize> = (0..x.n_features()).collect();

        while let Some(Pending {
            node,
            samples,
            depth,
        }) = stack.pop()
        {
            let counts = class_counts(y, &samples, n_classes);
            let impurity = gini(&counts, samples.len());
            let depth_reached = params.max_depth.is_some_and(|max| depth >= max);

            let split = if depth_reached
                || samples.len() < params.min_samples_split
                || impurity <= f64::EPSILON
            {
                None
            } else {
                features.shuffle(rng);
                best_split(x, y, n_classes, &samples, &features, params)
            };

            let Some(split) = split else {
                nodes[node] = Node::Leaf {
                    probs: probabilities(&counts, samples.len()),
                };
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .copied()
                .partition(|&row| x.get(row, split.feature) <= split.threshold);

            tracing::trace!(
                node,
                feature = split.feature,
                impurity = split.impurity,
                "split node"
            );

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { probs: Vec::new() });
            nodes.push(Node::Leaf { probs: Vec::new() });
            nodes[node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            stack.push(Pending {
                node: right,
                samples: right_rows,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                samples: left_rows,
                depth: depth + 1,
            });
        }

        Self { nodes }
    }

    /// Class probabilities for one row.
    #[must_use]
    pub fn predict_proba(&self, x: &FeatureMatrix, row: usize) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { probs } => return probs,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x.get(row, *feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Lowest weighted child impurity over the examined features.
///
/// Features are visited in `order` until `max_features` non-constant ones have
/// been tried; constant features do not count toward that budget.
fn best_split(
    x: &FeatureMatrix,
    y: &[usize],
    n_classes: usize,
    samples: &[usize],
    order: &[usize],
    params: &TreeParams,
) -> Option<BestSplit> {
    let n = samples.len();
    let mut best: Option<BestSplit> = None;
    let mut tried = 0;
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

    for &feature in order {
        if tried >= params.max_features {
            break;
        }
        column.clear();
        column.extend(samples.iter().map(|&row| (x.get(row, feature), y[row])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));
        if column[0].0 >= column[n - 1].0 {
            continue;
        }
        tried += 1;

        let mut left = vec![0usize; n_classes];
        let mut right = class_counts(y, samples, n_classes);
        for i in 0..n - 1 {
            let class = column[i].1;
            left[class] += 1;
            right[class] -= 1;
            let n_left = i + 1;
            if column[i].0 >= column[i + 1].0 {
                continue;
            }
            let n_right = n - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;
            if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                best = Some(BestSplit {
                    feature,
                    threshold: (column[i].0 + column[i + 1].0) / 2.0,
                    impurity,
                });
            }
        }
    }
    best
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &row in samples {
        counts[y[row]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn probabilities(counts: &[usize], total: usize) -> Vec<f64> {
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}
