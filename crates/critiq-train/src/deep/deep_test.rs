use std::fs;
use std::path::Path;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use serde_json::json;

use super::encode::tests::{word_level, WORD_LEVEL};
use super::*;

fn tiny_config() -> Value {
    json!({
        "vocab_size": 8,
        "hidden_size": 8,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.0,
        "attention_probs_dropout_prob": 0.0,
        "max_position_embeddings": 16,
        "type_vocab_size": 2,
        "layer_norm_eps": 1e-12,
        "model_type": "bert"
    })
}

/// A randomly initialised checkpoint plus its config and tokenizer.
fn write_tiny_model(dir: &Path) {
    let config = tiny_config();
    fs::write(dir.join("config.json"), config.to_string()).unwrap();
    fs::write(dir.join("tokenizer.json"), WORD_LEVEL).unwrap();

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    BertClassifier::new(&BertConfig::from_value(&config).unwrap(), 2, &vb).unwrap();
    varmap.save(dir.join("model.safetensors")).unwrap();
}

fn corpus() -> (Vec<String>, Vec<usize>) {
    let rows = [
        ("good food", 1),
        ("great service", 1),
        ("good service", 1),
        ("great food", 1),
        ("good great", 1),
        ("bad food", 0),
        ("awful service", 0),
        ("bad service", 0),
        ("awful food", 0),
        ("bad awful", 0),
    ];
    (
        rows.iter().map(|(c, _)| (*c).to_string()).collect(),
        rows.iter().map(|(_, l)| *l).collect(),
    )
}

fn labels() -> Vec<String> {
    vec!["negative".to_string(), "positive".to_string()]
}

fn deep_config(model: &Path) -> DeepConfig {
    DeepConfig {
        model: model.to_string_lossy().into_owned(),
        max_length: 4,
        epochs: 2,
        batch_size: 4,
        learning_rate: 1e-3,
        ..DeepConfig::default()
    }
}

#[test]
fn forward_yields_one_logit_row_per_input() {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let config = BertConfig::from_value(&tiny_config()).unwrap();
    let model = BertClassifier::new(&config, 3, &vb).unwrap();

    let encoded = encode_corpus(
        &word_level(4),
        &["good food".to_string(), "bad".to_string()],
        &[0, 1],
        4,
    )
    .unwrap();
    let batch = encoded.batch(&[0, 1], &Device::Cpu).unwrap();
    let logits = model
        .forward(&batch.input_ids, &batch.type_ids, &batch.attention_mask, false)
        .unwrap();
    assert_eq!(logits.dims(), &[2, 3]);
}

#[test]
fn fine_tunes_a_tiny_checkpoint_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_model(dir.path());
    let (comments, ids) = corpus();

    let bundle = train_deep(&deep_config(dir.path()), &comments, &ids, &labels()).unwrap();

    assert_eq!(bundle.epochs.len(), 2);
    assert!(bundle.best_validation_loss.is_finite());
    let best = bundle
        .epochs
        .iter()
        .map(|e| e.validation_loss)
        .fold(f64::INFINITY, f64::min);
    assert!((bundle.best_validation_loss - best).abs() < 1e-12);

    let weights = candle_core::safetensors::load_buffer(&bundle.weights, &Device::Cpu).unwrap();
    assert!(weights.contains_key("classifier.weight"));
    assert!(weights.contains_key("bert.encoder.layer.0.attention.self.query.weight"));

    let config: Value = serde_json::from_slice(&bundle.config).unwrap();
    assert_eq!(config["id2label"]["1"], "positive");
    assert_eq!(config["label2id"]["negative"], 0);
    assert_eq!(config["num_labels"], 2);
    assert_eq!(bundle.tokenizer, WORD_LEVEL.as_bytes());
}

#[test]
fn checkpoint_without_matching_names_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_model(dir.path());
    let stray = VarMap::new();
    let vb = VarBuilder::from_varmap(&stray, DType::F32, &Device::Cpu);
    vb.get_with_hints(4, "unrelated.weight", candle_nn::Init::Const(0.0))
        .unwrap();
    stray.save(dir.path().join("model.safetensors")).unwrap();

    let (comments, ids) = corpus();
    let err = train_deep(&deep_config(dir.path()), &comments, &ids, &labels()).unwrap_err();
    assert!(matches!(err, TrainError::TrainingFailure { ref stage, .. } if stage == "deep.weights"));
}
