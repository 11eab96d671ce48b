//! Supervised comment classifiers for critiq.
//!
//! Reads a labeled corpus from two directory roots, trains a TF-IDF random
//! forest and a fine-tuned BERT classifier, and persists both bundles through
//! an [`ArtifactStore`].

pub mod artifacts;
pub mod clean;
pub mod corpus;
pub mod deep;
pub mod error;
pub mod features;
pub mod forest;
pub mod hybrid;
pub mod report;
pub mod split;
pub mod tfidf;

pub use artifacts::{ArtifactStore, FsArtifactStore, RunManifest};
pub use clean::clean_corpus_text;
pub use corpus::{discover_files, read_corpus, LabeledCorpus};
pub use deep::{train_deep, DeepBundle, DeepConfig};
pub use error::TrainError;
pub use features::{build_features, FeatureMatrix, FeatureSet, SparseMatrix};
pub use forest::{ForestConfig, RandomForest};
pub use hybrid::{train_hybrid, HybridOutcome, ShallowClassifier, TrainConfig};
pub use report::{ClassMetrics, ClassificationReport};
pub use split::{random_split, stratified_split, Split};
pub use tfidf::{TfidfParams, TfidfVectorizer};
