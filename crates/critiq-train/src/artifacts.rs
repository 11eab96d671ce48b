//! Named-blob persistence for trained model bundles.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::TrainError;

pub const RF_MODEL: &str = "rf/model.bin";
pub const RF_VECTORIZER: &str = "rf/vectorizer.bin";
pub const RF_LABELS: &str = "rf/labels.json";
pub const RF_REPORT: &str = "rf/report.json";
pub const BERT_WEIGHTS: &str = "bert/model.safetensors";
pub const BERT_TOKENIZER: &str = "bert/tokenizer.json";
pub const BERT_CONFIG: &str = "bert/config.json";
pub const MANIFEST: &str = "manifest.json";

/// Write and read named byte blobs. Names use `/` separators.
pub trait ArtifactStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TrainError::PersistenceFailure`] if the blob cannot be stored.
    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), TrainError>;

    /// # Errors
    ///
    /// Returns [`TrainError::PersistenceFailure`] if the blob cannot be read.
    fn read(&self, name: &str) -> Result<Vec<u8>, TrainError>;
}

/// Blobs as files under a root directory. Each write lands in `<name>.tmp`
/// first and is renamed into place.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        name.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), TrainError> {
        let failure = |source| TrainError::PersistenceFailure {
            artifact: name.to_string(),
            source,
        };
        let path = self.path_of(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(failure)?;
        }
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).map_err(failure)?;
        fs::rename(&tmp, &path).map_err(failure)?;
        tracing::debug!(artifact = name, bytes = bytes.len(), path = %path.display(), "wrote artifact");
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, TrainError> {
        fs::read(self.path_of(name)).map_err(|source| TrainError::PersistenceFailure {
            artifact: name.to_string(),
            source,
        })
    }
}

/// Serialize `value` as pretty JSON and store it.
///
/// # Errors
///
/// Returns [`TrainError::Encode`] or [`TrainError::PersistenceFailure`].
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn ArtifactStore,
    name: &str,
    value: &T,
) -> Result<(), TrainError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| TrainError::encode(name, e))?;
    store.write(name, &bytes)
}

/// Serialize `value` with bincode and store it.
///
/// # Errors
///
/// Returns [`TrainError::Encode`] or [`TrainError::PersistenceFailure`].
pub fn write_bincode<T: Serialize + ?Sized>(
    store: &dyn ArtifactStore,
    name: &str,
    value: &T,
) -> Result<(), TrainError> {
    let bytes = bincode::serialize(value).map_err(|e| TrainError::encode(name, e))?;
    store.write(name, &bytes)
}

/// Read a bincode blob back.
///
/// # Errors
///
/// Returns [`TrainError::Encode`] for undecodable bytes or
/// [`TrainError::PersistenceFailure`] when the blob is unreadable.
pub fn read_bincode<T: for<'de> Deserialize<'de>>(
    store: &dyn ArtifactStore,
    name: &str,
) -> Result<T, TrainError> {
    let bytes = store.read(name)?;
    bincode::deserialize(&bytes).map_err(|e| TrainError::encode(name, e))
}

/// Record of one completed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub corpus_rows: usize,
    pub corpus_sha256: String,
    pub labels: Vec<String>,
    pub forest_trees: usize,
    pub vocabulary_size: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub best_validation_loss: Option<f64>,
    pub artifacts: Vec<String>,
}

/// SHA-256 over `cleaned<TAB>label<LF>` lines, hex encoded.
#[must_use]
pub fn corpus_fingerprint(cleaned: &[String], labels: &[String]) -> String {
    let mut hasher = Sha256::new();
    for (text, label) in cleaned.iter().zip(labels) {
        hasher.update(text.as_bytes());
        hasher.update(b"\t");
        hasher.update(label.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_nested_names_and_reads_them_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.write("rf/labels.json", b"[\"a\"]").unwrap();

        assert_eq!(store.read("rf/labels.json").unwrap(), b"[\"a\"]");
        assert!(dir.path().join("rf").join("labels.json").is_file());
        assert!(!dir.path().join("rf").join("labels.json.tmp").exists());
    }

    #[test]
    fn overwrites_existing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.write("manifest.json", b"old").unwrap();
        store.write("manifest.json", b"new").unwrap();
        assert_eq!(store.read("manifest.json").unwrap(), b"new");
    }

    #[test]
    fn missing_blob_is_a_persistence_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        match store.read("bert/model.safetensors").unwrap_err() {
            TrainError::PersistenceFailure { artifact, .. } => {
                assert_eq!(artifact, "bert/model.safetensors");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bincode_blobs_round_trip_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        write_bincode(&store, "rf/ids.bin", &vec![3_usize, 1, 2]).unwrap();
        let ids: Vec<usize> = read_bincode(&store, "rf/ids.bin").unwrap();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn fingerprint_depends_on_text_and_label() {
        let text = vec!["good food".to_string()];
        let a = corpus_fingerprint(&text, &["pos".to_string()]);
        let b = corpus_fingerprint(&text, &["neg".to_string()]);
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, corpus_fingerprint(&text, &["pos".to_string()]));
    }
}
