use serde::Deserialize;

use crate::error::TrainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum HiddenAct {
    #[default]
    #[serde(rename = "gelu")]
    Gelu,
    #[serde(rename = "gelu_new", alias = "gelu_pytorch_tanh")]
    GeluApprox,
    #[serde(rename = "relu")]
    Relu,
}

/// The subset of a BERT `config.json` the encoder needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BertConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default)]
    pub hidden_act: HiddenAct,
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob: f64,
    #[serde(default = "default_dropout")]
    pub attention_probs_dropout_prob: f64,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default)]
    pub classifier_dropout: Option<f64>,
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_dropout() -> f64 {
    0.1
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

impl BertConfig {
    /// Parse and check a `config.json` document.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::TrainingFailure`] for malformed JSON or a hidden
    /// size that does not divide evenly across attention heads.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, TrainError> {
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| TrainError::training("deep.config", e))?;
        if config.num_attention_heads == 0 || config.hidden_size % config.num_attention_heads != 0 {
            return Err(TrainError::training(
                "deep.config",
                format!(
                    "hidden_size {} is not divisible by {} attention heads",
                    config.hidden_size, config.num_attention_heads
                ),
            ));
        }
        Ok(config)
    }

    #[must_use]
    pub fn head_dim(&self) -> usize {
        self.hidden_size / self.num_attention_heads
    }

    /// Dropout before the classification layer.
    #[must_use]
    pub fn classifier_dropout(&self) -> f64 {
        self.classifier_dropout.unwrap_or(self.hidden_dropout_prob)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fills_defaults_for_optional_fields() {
        let value = json!({
            "vocab_size": 30,
            "hidden_size": 8,
            "num_hidden_layers": 1,
            "num_attention_heads": 2,
            "intermediate_size": 16,
            "max_position_embeddings": 16,
            "model_type": "bert"
        });
        let config = BertConfig::from_value(&value).unwrap();
        assert_eq!(config.type_vocab_size, 2);
        assert_eq!(config.hidden_act, HiddenAct::Gelu);
        assert_eq!(config.head_dim(), 4);
        assert!((config.classifier_dropout() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_uneven_heads() {
        let value = json!({
            "vocab_size": 30,
            "hidden_size": 10,
            "num_hidden_layers": 1,
            "num_attention_heads": 3,
            "intermediate_size": 16,
            "max_position_embeddings": 16
        });
        assert!(BertConfig::from_value(&value).is_err());
    }
}
