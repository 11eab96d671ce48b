//! End-to-end training run: corpus, shallow forest, optional deep model,
//! then persistence of both bundles and a run manifest.

use std::path::PathBuf;

use chrono::Utc;
use critiq_core::AppConfig;
use uuid::Uuid;

use crate::artifacts::{
    corpus_fingerprint, read_bincode, write_bincode, write_json, ArtifactStore, RunManifest,
    BERT_CONFIG, BERT_TOKENIZER, BERT_WEIGHTS, MANIFEST, RF_LABELS, RF_MODEL, RF_REPORT,
    RF_VECTORIZER,
};
use crate::clean::clean_corpus_text;
use crate::corpus::read_corpus;
use crate::deep::{train_deep, DeepBundle, DeepConfig, EpochMetrics};
use crate::error::TrainError;
use crate::features::{build_features, FeatureMatrix};
use crate::forest::{ForestConfig, RandomForest};
use crate::report::ClassificationReport;
use crate::split::stratified_split;
use crate::tfidf::{TfidfParams, TfidfVectorizer};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub data_dir: PathBuf,
    pub gold_dir: PathBuf,
    pub seed: u64,
    pub test_fraction: f64,
    pub tfidf: TfidfParams,
    pub forest: ForestConfig,
    /// `None` skips the deep stage.
    pub deep: Option<DeepConfig>,
}

impl TrainConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            gold_dir: config.gold_dir.clone(),
            seed: config.seed,
            test_fraction: config.test_fraction,
            tfidf: TfidfParams {
                max_features: config.max_features,
                min_df: config.min_df,
                ..TfidfParams::default()
            },
            forest: ForestConfig {
                n_trees: config.forest_trees,
                seed: config.seed,
                ..ForestConfig::default()
            },
            deep: Some(DeepConfig {
                model: config.bert_model.clone(),
                max_length: config.bert_max_length,
                epochs: config.bert_epochs,
                batch_size: config.bert_batch_size,
                learning_rate: config.bert_learning_rate,
                validation_fraction: config.test_fraction,
                seed: config.seed,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HybridOutcome {
    pub report: ClassificationReport,
    pub manifest: RunManifest,
    pub deep_epochs: Vec<EpochMetrics>,
}

/// Train both classifiers and persist them through `store`.
///
/// Nothing is written unless every training stage succeeds. A failed write
/// leaves earlier artifacts in place.
///
/// # Errors
///
/// Any [`TrainError`] raised by a stage; the first one aborts the run.
pub fn train_hybrid(config: &TrainConfig, store: &dyn ArtifactStore) -> Result<HybridOutcome, TrainError> {
    tracing::info!(stage = "corpus", "training run started");
    let corpus = read_corpus(&config.data_dir, &config.gold_dir)?;
    let labels = corpus.label_set();
    let y = corpus.label_ids(&labels);

    tracing::info!(stage = "features", classes = labels.len(), "building features");
    let features = build_features(&corpus.comments, config.tfidf)?;
    let split = stratified_split(&y, &labels, config.test_fraction, config.seed)?;

    tracing::info!(stage = "forest", "training shallow classifier");
    let forest = RandomForest::fit(config.forest, &features.matrix, &y, labels.len(), &split.train)?;
    let predicted = forest.predict(&features.matrix, &split.test);
    let truth: Vec<usize> = split.test.iter().map(|&row| y[row]).collect();
    let report = ClassificationReport::new(&truth, &predicted, &labels);
    tracing::info!(stage = "forest", accuracy = report.accuracy, "evaluated on held-out rows");

    let deep = match &config.deep {
        Some(deep) => {
            tracing::info!(stage = "deep", model = %deep.model, "training deep classifier");
            Some(train_deep(deep, &corpus.comments, &y, &labels)?)
        }
        None => {
            tracing::info!(stage = "deep", "deep training skipped");
            None
        }
    };

    tracing::info!(stage = "persist", "writing artifacts");
    let mut written = Vec::new();
    let mut record = |name: &str| written.push(name.to_string());

    write_bincode(store, RF_MODEL, &forest)?;
    record(RF_MODEL);
    write_bincode(store, RF_VECTORIZER, &features.vectorizer)?;
    record(RF_VECTORIZER);
    write_json(store, RF_LABELS, &labels)?;
    record(RF_LABELS);
    write_json(store, RF_REPORT, &report)?;
    record(RF_REPORT);

    if let Some(DeepBundle {
        weights,
        tokenizer,
        config: bert_config,
        ..
    }) = &deep
    {
        store.write(BERT_WEIGHTS, weights)?;
        record(BERT_WEIGHTS);
        store.write(BERT_TOKENIZER, tokenizer)?;
        record(BERT_TOKENIZER);
        store.write(BERT_CONFIG, bert_config)?;
        record(BERT_CONFIG);
    }

    let manifest = RunManifest {
        run_id: Uuid::new_v4(),
        completed_at: Utc::now(),
        corpus_rows: corpus.len(),
        corpus_sha256: corpus_fingerprint(&features.cleaned, &corpus.labels),
        labels: labels.clone(),
        forest_trees: forest.n_trees(),
        vocabulary_size: features.vectorizer.vocabulary_len(),
        best_validation_loss: deep.as_ref().map(|d| d.best_validation_loss),
        artifacts: written,
    };
    write_json(store, MANIFEST, &manifest)?;
    tracing::info!(run_id = %manifest.run_id, artifacts = manifest.artifacts.len(), "training run complete");

    Ok(HybridOutcome {
        report,
        manifest,
        deep_epochs: deep.map(|d| d.epochs).unwrap_or_default(),
    })
}

/// A persisted forest bundle, reloaded for inference.
#[derive(Debug, Clone)]
pub struct ShallowClassifier {
    pub forest: RandomForest,
    pub vectorizer: TfidfVectorizer,
    pub labels: Vec<String>,
}

impl ShallowClassifier {
    /// # Errors
    ///
    /// Returns [`TrainError::PersistenceFailure`] or [`TrainError::Encode`] if
    /// an artifact is missing or undecodable.
    pub fn load(store: &dyn ArtifactStore) -> Result<Self, TrainError> {
        let labels = serde_json::from_slice(&store.read(RF_LABELS)?)
            .map_err(|e| TrainError::encode(RF_LABELS, e))?;
        Ok(Self {
            forest: read_bincode(store, RF_MODEL)?,
            vectorizer: read_bincode(store, RF_VECTORIZER)?,
            labels,
        })
    }

    /// Predicted label for each raw comment.
    #[must_use]
    pub fn classify(&self, comments: &[String]) -> Vec<String> {
        let cleaned: Vec<String> = comments.iter().map(|c| clean_corpus_text(c)).collect();
        let matrix = FeatureMatrix::from_cleaned(&self.vectorizer, &cleaned);
        let rows: Vec<usize> = (0..matrix.n_rows()).collect();
        self.forest
            .predict(&matrix, &rows)
            .into_iter()
            .map(|id| self.labels.get(id).cloned().unwrap_or_default())
            .collect()
    }
}
