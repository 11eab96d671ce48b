//! Fine-tuning a pretrained BERT checkpoint for comment classification.

mod config;
mod encode;
mod finetune;
mod model;
mod source;

pub use config::{BertConfig, HiddenAct};
pub use encode::{encode_corpus, fixed_length, load_tokenizer, Batch, EncodedCorpus};
pub use finetune::{fine_tune, EpochMetrics, FineTuneOutcome, FineTuneParams};
pub use model::{load_pretrained, snapshot, to_safetensors, BertClassifier};
pub use source::ModelFiles;

use std::fs;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use serde_json::{json, Map, Value};

use crate::artifacts::BERT_WEIGHTS;
use crate::error::{StageExt, TrainError};

#[derive(Debug, Clone, PartialEq)]
pub struct DeepConfig {
    /// Local model directory or hub id.
    pub model: String,
    pub max_length: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub validation_fraction: f64,
    pub seed: u64,
}

impl Default for DeepConfig {
    fn default() -> Self {
        Self {
            model: "nlpaueb/legal-bert-base-uncased".to_string(),
            max_length: 256,
            epochs: 2,
            batch_size: 8,
            learning_rate: 5e-5,
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

impl DeepConfig {
    fn fine_tune_params(&self) -> FineTuneParams {
        FineTuneParams {
            epochs: self.epochs,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            validation_fraction: self.validation_fraction,
            seed: self.seed,
        }
    }
}

/// Serialized artifacts of a fine-tuned model.
#[derive(Debug, Clone)]
pub struct DeepBundle {
    pub weights: Vec<u8>,
    pub tokenizer: Vec<u8>,
    pub config: Vec<u8>,
    pub best_validation_loss: f64,
    pub epochs: Vec<EpochMetrics>,
}

/// Resolve the pretrained model named by `config` and fine-tune it.
///
/// # Errors
///
/// Any [`TrainError`] from [`train_deep_from`] or model resolution.
pub fn train_deep(
    config: &DeepConfig,
    comments: &[String],
    labels: &[usize],
    label_names: &[String],
) -> Result<DeepBundle, TrainError> {
    let files = ModelFiles::resolve(&config.model)?;
    train_deep_from(&files, config, comments, labels, label_names)
}

/// Fine-tune from explicit model files. Comments are encoded raw; the
/// corpus cleaner is not applied on this path.
///
/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] for unreadable model files, an
/// empty encoded corpus, or any failure during fine-tuning.
pub fn train_deep_from(
    files: &ModelFiles,
    config: &DeepConfig,
    comments: &[String],
    labels: &[usize],
    label_names: &[String],
) -> Result<DeepBundle, TrainError> {
    let raw_config = fs::read_to_string(&files.config).stage("deep.config")?;
    let config_json: Value = serde_json::from_str(&raw_config).stage("deep.config")?;
    let bert_config = BertConfig::from_value(&config_json)?;

    let tokenizer = load_tokenizer(&files.tokenizer, config.max_length)?;
    let encoded = encode_corpus(&tokenizer, comments, labels, config.max_length)?;
    if encoded.is_empty() {
        return Err(TrainError::training("deep.encode", "no comment could be encoded"));
    }

    let device = Device::cuda_if_available(0).stage("deep.device")?;
    tracing::info!(device = ?device, labels = label_names.len(), "building classifier");
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let model = BertClassifier::new(&bert_config, label_names.len(), &vb).stage("deep.model")?;
    load_pretrained(&varmap, &files.weights, &device)?;

    let outcome = fine_tune(&model, &varmap, &encoded, &config.fine_tune_params(), &device)?;

    Ok(DeepBundle {
        weights: to_safetensors(&outcome.best_weights, BERT_WEIGHTS)?,
        tokenizer: fs::read(&files.tokenizer).stage("deep.tokenizer")?,
        config: labeled_config(config_json, label_names)?,
        best_validation_loss: outcome.best_validation_loss,
        epochs: outcome.epochs,
    })
}

/// The source `config.json` with `id2label`, `label2id`, and `num_labels`.
fn labeled_config(mut value: Value, label_names: &[String]) -> Result<Vec<u8>, TrainError> {
    let id2label: Map<String, Value> = label_names
        .iter()
        .enumerate()
        .map(|(i, l)| (i.to_string(), json!(l)))
        .collect();
    let label2id: Map<String, Value> = label_names
        .iter()
        .enumerate()
        .map(|(i, l)| (l.clone(), json!(i)))
        .collect();
    if let Value::Object(map) = &mut value {
        map.insert("id2label".into(), Value::Object(id2label));
        map.insert("label2id".into(), Value::Object(label2id));
        map.insert("num_labels".into(), json!(label_names.len()));
    }
    serde_json::to_vec_pretty(&value).map_err(|e| TrainError::encode("bert/config.json", e))
}

#[cfg(test)]
#[path = "deep_test.rs"]
mod tests;
