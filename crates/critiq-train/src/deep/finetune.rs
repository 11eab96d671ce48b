#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use candle_core::{Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::encode::EncodedCorpus;
use super::model::{snapshot, BertClassifier};
use crate::error::{StageExt, TrainError};
use crate::split::random_split;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FineTuneParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub validation_fraction: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub validation_loss: f64,
}

pub struct FineTuneOutcome {
    /// Parameters as of the epoch with the lowest validation loss.
    pub best_weights: HashMap<String, Tensor>,
    pub best_epoch: usize,
    pub best_validation_loss: f64,
    pub epochs: Vec<EpochMetrics>,
}

/// Train every variable in `varmap` through `model`, evaluating on a seeded
/// validation split after each epoch and keeping the best checkpoint.
///
/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] for an unusable split, a tensor
/// operation failure, or a non-finite loss.
pub fn fine_tune(
    model: &BertClassifier,
    varmap: &VarMap,
    data: &EncodedCorpus,
    params: &FineTuneParams,
    device: &Device,
) -> Result<FineTuneOutcome, TrainError> {
    if params.epochs == 0 || params.batch_size == 0 {
        return Err(TrainError::training(
            "deep.finetune",
            "epochs and batch size must be at least 1",
        ));
    }
    let split = random_split(data.len(), params.validation_fraction, params.seed);
    if split.train.is_empty() || split.test.is_empty() {
        return Err(TrainError::training(
            "deep.finetune",
            format!("{} encoded rows cannot fill a train and validation split", data.len()),
        ));
    }

    let mut optimizer = AdamW::new(
        varmap.all_vars(),
        ParamsAdamW {
            lr: params.learning_rate,
            weight_decay: 0.0,
            ..ParamsAdamW::default()
        },
    )
    .stage("deep.optimizer")?;

    tracing::info!(
        train = split.train.len(),
        validation = split.test.len(),
        epochs = params.epochs,
        batch_size = params.batch_size,
        "fine-tuning classifier"
    );

    let mut history = Vec::with_capacity(params.epochs);
    let mut best: Option<(usize, f64, HashMap<String, Tensor>)> = None;

    for epoch in 1..=params.epochs {
        let mut order = split.train.clone();
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(
            params.seed.wrapping_add(epoch as u64),
        ));

        let mut total = 0.0;
        for rows in order.chunks(params.batch_size) {
            let loss = batch_loss(model, data, rows, device, true)?;
            optimizer.backward_step(&loss).stage("deep.backward")?;
            total += scalar(&loss)? * rows.len() as f64;
        }
        let train_loss = total / order.len() as f64;
        let validation_loss = evaluate(model, data, &split.test, params.batch_size, device)?;
        if !train_loss.is_finite() || !validation_loss.is_finite() {
            return Err(TrainError::training(
                "deep.finetune",
                format!("loss diverged at epoch {epoch}"),
            ));
        }

        tracing::info!(epoch, train_loss, validation_loss, "epoch complete");
        history.push(EpochMetrics {
            epoch,
            train_loss,
            validation_loss,
        });

        if best.as_ref().is_none_or(|(_, loss, _)| validation_loss < *loss) {
            best = Some((epoch, validation_loss, snapshot(varmap)?));
        }
    }

    let (best_epoch, best_validation_loss, best_weights) =
        best.ok_or_else(|| TrainError::training("deep.finetune", "no epoch completed"))?;
    tracing::info!(best_epoch, best_validation_loss, "kept best checkpoint");
    Ok(FineTuneOutcome {
        best_weights,
        best_epoch,
        best_validation_loss,
        epochs: history,
    })
}

/// Row-weighted mean loss over `rows` without dropout.
fn evaluate(
    model: &BertClassifier,
    data: &EncodedCorpus,
    rows: &[usize],
    batch_size: usize,
    device: &Device,
) -> Result<f64, TrainError> {
    let mut total = 0.0;
    for chunk in rows.chunks(batch_size) {
        let loss = batch_loss(model, data, chunk, device, false)?;
        total += scalar(&loss)? * chunk.len() as f64;
    }
    Ok(total / rows.len() as f64)
}

fn batch_loss(
    model: &BertClassifier,
    data: &EncodedCorpus,
    rows: &[usize],
    device: &Device,
    train: bool,
) -> Result<Tensor, TrainError> {
    let batch = data.batch(rows, device)?;
    let logits = model
        .forward(&batch.input_ids, &batch.type_ids, &batch.attention_mask, train)
        .stage("deep.forward")?;
    candle_nn::loss::cross_entropy(&logits, &batch.labels).stage("deep.loss")
}

fn scalar(loss: &Tensor) -> Result<f64, TrainError> {
    loss.to_scalar::<f32>().map(f64::from).stage("deep.loss")
}
