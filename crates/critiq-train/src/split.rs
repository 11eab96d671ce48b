//! Seeded train/test partitioning.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::TrainError;

/// Row indices of each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn test_size(n: usize, test_fraction: f64) -> usize {
    (test_fraction * n as f64).ceil() as usize
}

/// Shuffle all rows and hold out the first `ceil(test_fraction * n)`.
#[must_use]
pub fn random_split(n: usize, test_fraction: f64, seed: u64) -> Split {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);
    let n_test = test_size(n, test_fraction).min(n);
    let train = order.split_off(n_test);
    Split { train, test: order }
}

/// Split preserving each class's share in both partitions.
///
/// The test partition holds `ceil(test_fraction * n)` rows, distributed over
/// classes by largest remainder.
///
/// # Errors
///
/// Returns [`TrainError::StratificationImpossible`] when a class has fewer
/// than two members or a partition is too small to hold every class.
pub fn stratified_split(
    labels: &[usize],
    label_names: &[String],
    test_fraction: f64,
    seed: u64,
) -> Result<Split, TrainError> {
    let n = labels.len();
    let n_classes = label_names.len();
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (row, &class) in labels.iter().enumerate() {
        members[class].push(row);
    }

    for (class, rows) in members.iter().enumerate() {
        if rows.len() < 2 {
            return Err(TrainError::StratificationImpossible {
                label: label_names[class].clone(),
                count: rows.len(),
            });
        }
    }

    let n_test = test_size(n, test_fraction);
    let n_train = n.saturating_sub(n_test);
    if n_test < n_classes || n_train < n_classes {
        let (label, count) = members
            .iter()
            .enumerate()
            .min_by_key(|(_, rows)| rows.len())
            .map(|(class, rows)| (label_names[class].clone(), rows.len()))
            .unwrap_or_default();
        return Err(TrainError::StratificationImpossible { label, count });
    }

    let counts: Vec<usize> = members.iter().map(Vec::len).collect();
    let test_counts = allocate(&counts, n_test, n);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, take) in members.into_iter().zip(test_counts) {
        rows.shuffle(&mut rng);
        let rest = rows.split_off(take);
        test.extend(rows);
        train.extend(rest);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    tracing::debug!(train = train.len(), test = test.len(), "stratified split");
    Ok(Split { train, test })
}

/// Share `total` out of `n` rows across classes by largest remainder.
/// Ties on the remainder go to the lower class index.
fn allocate(counts: &[usize], total: usize, n: usize) -> Vec<usize> {
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * total as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = total.saturating_sub(alloc.iter().sum());

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for class in order.into_iter().cycle() {
        if remaining == 0 {
            break;
        }
        if alloc[class] < counts[class] {
            alloc[class] += 1;
            remaining -= 1;
        }
    }
    alloc
}
