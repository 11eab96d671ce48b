//! BERT encoder with a pooled classification head, built from `candle_nn`
//! layers. Parameter names follow the Hugging Face
//! `BertForSequenceClassification` layout so pretrained checkpoints load by
//! name.
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{embedding, linear, Dropout, Embedding, Init, Linear, VarBuilder, VarMap};

use super::config::{BertConfig, HiddenAct};
use crate::error::{StageExt, TrainError};

const MASKED: f64 = -10_000.0;

struct LayerNorm {
    weight: Tensor,
    bias: Tensor,
    eps: f64,
}

impl LayerNorm {
    fn new(size: usize, eps: f64, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            weight: vb.get_with_hints(size, "weight", Init::Const(1.0))?,
            bias: vb.get_with_hints(size, "bias", Init::Const(0.0))?,
            eps,
        })
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mean = x.mean_keepdim(D::Minus1)?;
        let centered = x.broadcast_sub(&mean)?;
        let var = centered.sqr()?.mean_keepdim(D::Minus1)?;
        let normed = centered.broadcast_div(&(var + self.eps)?.sqrt()?)?;
        normed.broadcast_mul(&self.weight)?.broadcast_add(&self.bias)
    }
}

struct Embeddings {
    word: Embedding,
    position: Embedding,
    token_type: Embedding,
    norm: LayerNorm,
    dropout: Dropout,
}

impl Embeddings {
    fn new(config: &BertConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            word: embedding(config.vocab_size, config.hidden_size, vb.pp("word_embeddings"))?,
            position: embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type: embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            norm: LayerNorm::new(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
            dropout: Dropout::new(config.hidden_dropout_prob as f32),
        })
    }

    fn forward(&self, input_ids: &Tensor, type_ids: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let (_, seq_len) = input_ids.dims2()?;
        let positions = Tensor::arange(0u32, seq_len as u32, input_ids.device())?.unsqueeze(0)?;
        let summed = self
            .word
            .forward(input_ids)?
            .add(&self.token_type.forward(type_ids)?)?
            .broadcast_add(&self.position.forward(&positions)?)?;
        self.dropout.forward(&self.norm.forward(&summed)?, train)
    }
}

struct Layer {
    query: Linear,
    key: Linear,
    value: Linear,
    attn_out: Linear,
    attn_norm: LayerNorm,
    intermediate: Linear,
    output: Linear,
    out_norm: LayerNorm,
    attn_dropout: Dropout,
    dropout: Dropout,
    heads: usize,
    head_dim: usize,
    act: HiddenAct,
}

impl Layer {
    fn new(config: &BertConfig, vb: VarBuilder) -> candle_core::Result<Self> {
        let h = config.hidden_size;
        let attn = vb.pp("attention");
        Ok(Self {
            query: linear(h, h, attn.pp("self.query"))?,
            key: linear(h, h, attn.pp("self.key"))?,
            value: linear(h, h, attn.pp("self.value"))?,
            attn_out: linear(h, h, attn.pp("output.dense"))?,
            attn_norm: LayerNorm::new(h, config.layer_norm_eps, attn.pp("output.LayerNorm"))?,
            intermediate: linear(h, config.intermediate_size, vb.pp("intermediate.dense"))?,
            output: linear(config.intermediate_size, h, vb.pp("output.dense"))?,
            out_norm: LayerNorm::new(h, config.layer_norm_eps, vb.pp("output.LayerNorm"))?,
            attn_dropout: Dropout::new(config.attention_probs_dropout_prob as f32),
            dropout: Dropout::new(config.hidden_dropout_prob as f32),
            heads: config.num_attention_heads,
            head_dim: config.head_dim(),
            act: config.hidden_act,
        })
    }

    fn split_heads(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (b, s, _) = x.dims3()?;
        x.reshape((b, s, self.heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }

    fn forward(&self, x: &Tensor, mask: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let (b, s, h) = x.dims3()?;
        let q = self.split_heads(&self.query.forward(x)?)?;
        let k = self.split_heads(&self.key.forward(x)?)?;
        let v = self.split_heads(&self.value.forward(x)?)?;

        let scale = (self.head_dim as f64).sqrt();
        let scores = (q.matmul(&k.t()?.contiguous()?)? / scale)?.broadcast_add(mask)?;
        let probs = self
            .attn_dropout
            .forward(&candle_nn::ops::softmax(&scores, D::Minus1)?, train)?;
        let context = probs
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((b, s, h))?;

        let attended = self.dropout.forward(&self.attn_out.forward(&context)?, train)?;
        let x = self.attn_norm.forward(&attended.add(x)?)?;

        let inner = self.intermediate.forward(&x)?;
        let inner = match self.act {
            HiddenAct::Gelu => inner.gelu_erf()?,
            HiddenAct::GeluApprox => inner.gelu()?,
            HiddenAct::Relu => inner.relu()?,
        };
        let out = self.dropout.forward(&self.output.forward(&inner)?, train)?;
        self.out_norm.forward(&out.add(&x)?)
    }
}

/// Encoder, tanh pooler over the first token, and a linear label head.
pub struct BertClassifier {
    embeddings: Embeddings,
    layers: Vec<Layer>,
    pooler: Linear,
    dropout: Dropout,
    classifier: Linear,
    n_labels: usize,
}

impl BertClassifier {
    /// Declare every parameter in `vb`. With a [`VarMap`]-backed builder this
    /// creates freshly initialised trainable variables.
    ///
    /// # Errors
    ///
    /// Propagates tensor allocation failures.
    pub fn new(config: &BertConfig, n_labels: usize, vb: &VarBuilder) -> candle_core::Result<Self> {
        let bert = vb.pp("bert");
        let layers = (0..config.num_hidden_layers)
            .map(|i| Layer::new(config, bert.pp(format!("encoder.layer.{i}"))))
            .collect::<candle_core::Result<Vec<_>>>()?;
        Ok(Self {
            embeddings: Embeddings::new(config, bert.pp("embeddings"))?,
            layers,
            pooler: linear(config.hidden_size, config.hidden_size, bert.pp("pooler.dense"))?,
            dropout: Dropout::new(config.classifier_dropout() as f32),
            classifier: linear(config.hidden_size, n_labels, vb.pp("classifier"))?,
            n_labels,
        })
    }

    #[must_use]
    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    /// Logits of shape `(batch, n_labels)`. All inputs are `(batch, seq)` `u32`.
    ///
    /// # Errors
    ///
    /// Propagates shape and device errors.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        type_ids: &Tensor,
        attention_mask: &Tensor,
        train: bool,
    ) -> candle_core::Result<Tensor> {
        let (b, s) = attention_mask.dims2()?;
        let mask = attention_mask
            .to_dtype(DType::F32)?
            .affine(-MASKED, MASKED)?
            .reshape((b, 1, 1, s))?;

        let mut hidden = self.embeddings.forward(input_ids, type_ids, train)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden, &mask, train)?;
        }
        let first = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pooler.forward(&first)?.tanh()?;
        let pooled = self.dropout.forward(&pooled, train)?;
        self.classifier.forward(&pooled)
    }
}

/// Copy matching tensors from a safetensors checkpoint into `varmap`.
///
/// A variable matches a checkpoint tensor with the same name, the name without
/// its `bert.` prefix, or the legacy `gamma`/`beta` layer-norm names.
/// Variables without a same-shaped match keep their initial values.
///
/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] if the checkpoint is unreadable or
/// no variable matched.
pub fn load_pretrained(varmap: &VarMap, weights: &Path, device: &Device) -> Result<usize, TrainError> {
    let tensors = candle_core::safetensors::load(weights, device).stage("deep.weights")?;
    let vars = varmap
        .data()
        .lock()
        .map_err(|_| TrainError::training("deep.weights", "variable map lock poisoned"))?;

    let mut loaded = 0;
    for (name, var) in vars.iter() {
        let Some(source) = checkpoint_names(name).find_map(|n| tensors.get(&n)) else {
            tracing::debug!(var = %name, "no pretrained tensor");
            continue;
        };
        if source.dims() != var.dims() {
            tracing::warn!(
                var = %name,
                expected = ?var.dims(),
                found = ?source.dims(),
                "pretrained tensor shape mismatch; keeping initial values"
            );
            continue;
        }
        var.set(&source.to_dtype(DType::F32).stage("deep.weights")?)
            .stage("deep.weights")?;
        loaded += 1;
    }

    if loaded == 0 {
        return Err(TrainError::training(
            "deep.weights",
            format!("no parameters matched in {}", weights.display()),
        ));
    }
    tracing::info!(loaded, total = vars.len(), "loaded pretrained weights");
    Ok(loaded)
}

fn checkpoint_names(name: &str) -> impl Iterator<Item = String> + '_ {
    let bare = name.strip_prefix("bert.");
    let legacy = name
        .strip_suffix("LayerNorm.weight")
        .map(|p| format!("{p}LayerNorm.gamma"))
        .or_else(|| name.strip_suffix("LayerNorm.bias").map(|p| format!("{p}LayerNorm.beta")));
    let legacy_bare = legacy
        .as_deref()
        .and_then(|l| l.strip_prefix("bert."))
        .map(str::to_string);
    std::iter::once(name.to_string())
        .chain(bare.map(str::to_string))
        .chain(legacy)
        .chain(legacy_bare)
}

/// Detached copies of every variable, keyed by parameter name.
///
/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] on a poisoned lock or copy failure.
pub fn snapshot(varmap: &VarMap) -> Result<HashMap<String, Tensor>, TrainError> {
    let vars = varmap
        .data()
        .lock()
        .map_err(|_| TrainError::training("deep.snapshot", "variable map lock poisoned"))?;
    vars.iter()
        .map(|(name, var)| {
            var.as_tensor()
                .copy()
                .map(|t| (name.clone(), t))
                .stage("deep.snapshot")
        })
        .collect()
}

/// Encode named tensors as a safetensors document.
///
/// # Errors
///
/// Returns [`TrainError::Encode`] if a tensor cannot be moved to the CPU or
/// serialized.
pub fn to_safetensors(weights: &HashMap<String, Tensor>, artifact: &str) -> Result<Vec<u8>, TrainError> {
    let mut cpu = weights
        .iter()
        .map(|(name, t)| {
            t.to_device(&Device::Cpu)
                .map(|t| (name.clone(), t))
                .map_err(|e| TrainError::encode(artifact, e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    cpu.sort_by(|a, b| a.0.cmp(&b.0));
    safetensors::tensor::serialize(cpu.iter().map(|(n, t)| (n.as_str(), t)), &None)
        .map_err(|e| TrainError::encode(artifact, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_and_unprefixed_names_are_candidates() {
        let names: Vec<String> = checkpoint_names("bert.embeddings.LayerNorm.weight").collect();
        assert_eq!(
            names,
            vec![
                "bert.embeddings.LayerNorm.weight",
                "embeddings.LayerNorm.weight",
                "bert.embeddings.LayerNorm.gamma",
                "embeddings.LayerNorm.gamma",
            ]
        );
        let names: Vec<String> = checkpoint_names("classifier.bias").collect();
        assert_eq!(names, vec!["classifier.bias"]);
    }

    #[test]
    fn snapshot_serializes_every_variable_sorted() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let _ = linear(3, 2, vb.pp("classifier")).unwrap();

        let weights = snapshot(&varmap).unwrap();
        assert_eq!(weights.len(), 2);

        let bytes = to_safetensors(&weights, "bert/model.safetensors").unwrap();
        let parsed = safetensors::SafeTensors::deserialize(&bytes).unwrap();
        let mut names = parsed.names();
        names.sort();
        assert_eq!(names, vec!["classifier.bias", "classifier.weight"]);
        assert_eq!(parsed.tensor("classifier.weight").unwrap().shape(), &[2, 3]);
    }

    #[test]
    fn missing_checkpoint_is_a_training_failure() {
        let varmap = VarMap::new();
        let err = load_pretrained(&varmap, Path::new("/nonexistent/model.safetensors"), &Device::Cpu)
            .unwrap_err();
        assert!(matches!(err, TrainError::TrainingFailure { ref stage, .. } if stage == "deep.weights"));
    }
}
