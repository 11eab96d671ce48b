use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("no corpus files found under {}", format_roots(roots))]
    CorpusMissing { roots: Vec<PathBuf> },

    #[error("corpus is empty after dropping null rows ({files} files read)")]
    CorpusEmpty { files: usize },

    #[error("cannot stratify label {label:?} with {count} member(s)")]
    StratificationImpossible { label: String, count: usize },

    #[error("training failed at {stage}: {reason}")]
    TrainingFailure { stage: String, reason: String },

    #[error("failed to persist {artifact}: {source}")]
    PersistenceFailure {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {artifact}: {reason}")]
    Encode { artifact: String, reason: String },
}

impl TrainError {
    pub fn training(stage: &str, reason: impl Display) -> Self {
        TrainError::TrainingFailure {
            stage: stage.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(artifact: &str, reason: impl Display) -> Self {
        TrainError::Encode {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Attach a stage name to a foreign error.
pub(crate) trait StageExt<T> {
    fn stage(self, stage: &str) -> Result<T, TrainError>;
}

impl<T, E: Display> StageExt<T> for Result<T, E> {
    fn stage(self, stage: &str) -> Result<T, TrainError> {
        self.map_err(|e| TrainError::training(stage, e))
    }
}

fn format_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
