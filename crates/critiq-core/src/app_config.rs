use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub data_dir: PathBuf,
    pub gold_dir: PathBuf,
    pub models_dir: PathBuf,
    pub aliases_path: Option<PathBuf>,
    pub lexicon_path: Option<PathBuf>,
    pub stopwords_path: Option<PathBuf>,
    pub seed: u64,
    pub test_fraction: f64,
    pub max_features: usize,
    pub min_df: usize,
    pub forest_trees: usize,
    pub bert_model: String,
    pub bert_max_length: usize,
    pub bert_epochs: usize,
    pub bert_batch_size: usize,
    pub bert_learning_rate: f64,
}
