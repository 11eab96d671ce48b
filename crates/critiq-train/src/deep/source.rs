//! Locating pretrained model files on disk or on the Hugging Face hub.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;

use crate::error::{StageExt, TrainError};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Files inside a local model directory.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::TrainingFailure`] naming the first missing file.
    pub fn from_dir(dir: &Path) -> Result<Self, TrainError> {
        let file = |name: &str| {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(TrainError::training(
                    "deep.source",
                    format!("{} is missing", path.display()),
                ))
            }
        };
        Ok(Self {
            config: file(CONFIG_FILE)?,
            tokenizer: file(TOKENIZER_FILE)?,
            weights: file(WEIGHTS_FILE)?,
        })
    }

    /// Download (or reuse cached) files for a hub model id.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::TrainingFailure`] if the hub is unreachable or a
    /// file is absent from the repository.
    pub fn from_hub(model_id: &str) -> Result<Self, TrainError> {
        let api = ApiBuilder::new().build().stage("deep.source")?;
        let repo = api.model(model_id.to_string());
        tracing::info!(model = model_id, "fetching pretrained model from hub");
        Ok(Self {
            config: repo.get(CONFIG_FILE).stage("deep.source")?,
            tokenizer: repo.get(TOKENIZER_FILE).stage("deep.source")?,
            weights: repo.get(WEIGHTS_FILE).stage("deep.source")?,
        })
    }

    /// `model` is a local directory when one exists at that path, otherwise
    /// a hub id.
    ///
    /// # Errors
    ///
    /// See [`ModelFiles::from_dir`] and [`ModelFiles::from_hub`].
    pub fn resolve(model: &str) -> Result<Self, TrainError> {
        let dir = Path::new(model);
        if dir.is_dir() {
            Self::from_dir(dir)
        } else {
            Self::from_hub(model)
        }
    }
}
