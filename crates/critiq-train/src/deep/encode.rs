//! Fixed-length subword encoding of raw comments.

use std::path::Path;

use candle_core::{Device, Tensor};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::{StageExt, TrainError};

/// Load a `tokenizer.json` and set it to pad and truncate to `max_length`.
///
/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] if the file cannot be parsed.
pub fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer, TrainError> {
    let tokenizer = Tokenizer::from_file(path).stage("deep.tokenizer")?;
    fixed_length(tokenizer, max_length)
}

/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] if truncation cannot be configured.
pub fn fixed_length(mut tokenizer: Tokenizer, max_length: usize) -> Result<Tokenizer, TrainError> {
    let padding = PaddingParams {
        strategy: PaddingStrategy::Fixed(max_length),
        ..tokenizer.get_padding().cloned().unwrap_or_default()
    };
    tokenizer.with_padding(Some(padding));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..TruncationParams::default()
        }))
        .stage("deep.tokenizer")?;
    Ok(tokenizer)
}

/// Row-major token arrays for every encodable comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedCorpus {
    pub seq_len: usize,
    pub input_ids: Vec<u32>,
    pub type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub labels: Vec<u32>,
}

/// Tensors for one batch of rows.
pub struct Batch {
    pub input_ids: Tensor,
    pub type_ids: Tensor,
    pub attention_mask: Tensor,
    pub labels: Tensor,
}

impl EncodedCorpus {
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`TrainError::TrainingFailure`] if tensor creation fails.
    pub fn batch(&self, rows: &[usize], device: &Device) -> Result<Batch, TrainError> {
        let gather = |data: &[u32]| -> Result<Tensor, TrainError> {
            let values: Vec<u32> = rows
                .iter()
                .flat_map(|&r| &data[r * self.seq_len..(r + 1) * self.seq_len])
                .copied()
                .collect();
            Tensor::from_vec(values, (rows.len(), self.seq_len), device).stage("deep.batch")
        };
        let labels: Vec<u32> = rows.iter().map(|&r| self.labels[r]).collect();
        Ok(Batch {
            input_ids: gather(&self.input_ids)?,
            type_ids: gather(&self.type_ids)?,
            attention_mask: gather(&self.attention_mask)?,
            labels: Tensor::from_vec(labels, rows.len(), device).stage("deep.batch")?,
        })
    }
}

/// Encode raw comments with their label ids. Comments that fail to encode,
/// or come back at the wrong length, are skipped with a warning.
///
/// # Errors
///
/// Returns [`TrainError::TrainingFailure`] if a label id overflows `u32`.
pub fn encode_corpus(
    tokenizer: &Tokenizer,
    comments: &[String],
    labels: &[usize],
    max_length: usize,
) -> Result<EncodedCorpus, TrainError> {
    let mut out = EncodedCorpus {
        seq_len: max_length,
        ..EncodedCorpus::default()
    };
    for (row, (comment, &label)) in comments.iter().zip(labels).enumerate() {
        let encoding = match tokenizer.encode(comment.as_str(), true) {
            Ok(encoding) => encoding,
            Err(e) => {
                tracing::warn!(row, error = %e, "skipping comment that failed to tokenize");
                continue;
            }
        };
        if encoding.get_ids().len() != max_length {
            tracing::warn!(
                row,
                len = encoding.get_ids().len(),
                "skipping comment with unexpected encoded length"
            );
            continue;
        }
        out.input_ids.extend_from_slice(encoding.get_ids());
        out.type_ids.extend_from_slice(encoding.get_type_ids());
        out.attention_mask.extend_from_slice(encoding.get_attention_mask());
        out.labels.push(u32::try_from(label).stage("deep.encode")?);
    }
    tracing::info!(rows = out.len(), skipped = comments.len() - out.len(), "encoded corpus");
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const WORD_LEVEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": {"type": "Lowercase"},
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"[PAD]": 0, "[UNK]": 1, "good": 2, "great": 3, "bad": 4, "awful": 5, "food": 6, "service": 7},
            "unk_token": "[UNK]"
        }
    }"#;

    pub(crate) fn word_level(max_length: usize) -> Tokenizer {
        let tokenizer: Tokenizer = WORD_LEVEL.parse().unwrap();
        fixed_length(tokenizer, max_length).unwrap()
    }

    #[test]
    fn pads_and_truncates_to_fixed_length() {
        let tokenizer = word_level(4);
        let comments = vec![
            "Good food".to_string(),
            "bad bad awful service food".to_string(),
        ];
        let encoded = encode_corpus(&tokenizer, &comments, &[1, 0], 4).unwrap();

        assert_eq!(encoded.len(), 2);
        assert_eq!(&encoded.input_ids[..4], &[2, 6, 0, 0]);
        assert_eq!(&encoded.attention_mask[..4], &[1, 1, 0, 0]);
        assert_eq!(&encoded.input_ids[4..], &[4, 4, 5, 7]);
        assert_eq!(encoded.labels, vec![1, 0]);
    }

    #[test]
    fn batches_gather_selected_rows() {
        let tokenizer = word_level(3);
        let comments = vec!["good".to_string(), "bad".to_string(), "great".to_string()];
        let encoded = encode_corpus(&tokenizer, &comments, &[0, 1, 0], 3).unwrap();
        let batch = encoded.batch(&[2, 0], &Device::Cpu).unwrap();

        assert_eq!(batch.input_ids.dims(), &[2, 3]);
        let ids: Vec<Vec<u32>> = batch.input_ids.to_vec2().unwrap();
        assert_eq!(ids, vec![vec![3, 0, 0], vec![2, 0, 0]]);
        let labels: Vec<u32> = batch.labels.to_vec1().unwrap();
        assert_eq!(labels, vec![0, 0]);
    }
}
