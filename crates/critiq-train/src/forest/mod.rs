//! Random forest classifier: bootstrap-sampled Gini trees built in parallel,
//! predictions by averaged class probabilities.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

mod tree;

pub use tree::{DecisionTree, TreeParams};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::TrainError;
use crate::features::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; `None` uses `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 300,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    n_classes: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on the rows in `train`. Tree `i` is seeded with `seed + i`, so the
    /// result is independent of thread scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::TrainingFailure`] for an empty ensemble, an empty
    /// training set, or training labels with fewer than two classes.
    pub fn fit(
        config: ForestConfig,
        x: &FeatureMatrix,
        y: &[usize],
        n_classes: usize,
        train: &[usize],
    ) -> Result<Self, TrainError> {
        if config.n_trees == 0 {
            return Err(TrainError::training("forest", "ensemble needs at least one tree"));
        }
        if train.is_empty() {
            return Err(TrainError::training("forest", "no training rows"));
        }
        let mut present: Vec<usize> = train.iter().map(|&row| y[row]).collect();
        present.sort_unstable();
        present.dedup();
        if present.len() < 2 {
            return Err(TrainError::training(
                "forest",
                format!("training data holds {} class(es); need at least 2", present.len()),
            ));
        }

        let n_features = x.n_features();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            min_samples_leaf: config.min_samples_leaf.max(1),
            max_features: config
                .max_features
                .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
                .clamp(1, n_features.max(1)),
        };

        tracing::info!(
            trees = config.n_trees,
            rows = train.len(),
            features = n_features,
            max_features = params.max_features,
            "fitting random forest"
        );

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let samples = if config.bootstrap {
                    bootstrap(train, &mut rng)
                } else {
                    train.to_vec()
                };
                DecisionTree::fit(x, y, n_classes, samples, &params, &mut rng)
            })
            .collect();

        Ok(Self {
            config,
            n_classes,
            n_features,
            trees,
        })
    }

    /// Mean of the trees' class probabilities for one row.
    #[must_use]
    pub fn predict_proba(&self, x: &FeatureMatrix, row: usize) -> Vec<f64> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.predict_proba(x, row)) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        sum.iter_mut().for_each(|v| *v /= n);
        sum
    }

    /// Most probable class; ties go to the lower class id.
    #[must_use]
    pub fn predict_one(&self, x: &FeatureMatrix, row: usize) -> usize {
        let probs = self.predict_proba(x, row);
        let mut best = 0;
        for (class, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = class;
            }
        }
        best
    }

    #[must_use]
    pub fn predict(&self, x: &FeatureMatrix, rows: &[usize]) -> Vec<usize> {
        rows.par_iter().map(|&row| self.predict_one(x, row)).collect()
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

fn bootstrap(rows: &[usize], rng: &mut ChaCha8Rng) -> Vec<usize> {
    (0..rows.len())
        .map(|_| rows[rng.random_range(0..rows.len())])
        .collect()
}
