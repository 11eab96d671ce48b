use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("unknown").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CRITIQ_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.data_dir, PathBuf::from("data"));
    assert_eq!(cfg.gold_dir, PathBuf::from("gold_data"));
    assert_eq!(cfg.models_dir, PathBuf::from("models"));
    assert!(cfg.aliases_path.is_none());
    assert!(cfg.lexicon_path.is_none());
    assert!(cfg.stopwords_path.is_none());
    assert_eq!(cfg.seed, 42);
    assert!((cfg.test_fraction - 0.2).abs() < f64::EPSILON);
    assert_eq!(cfg.max_features, 20_000);
    assert_eq!(cfg.min_df, 2);
    assert_eq!(cfg.forest_trees, 300);
    assert_eq!(cfg.bert_model, "nlpaueb/legal-bert-base-uncased");
    assert_eq!(cfg.bert_max_length, 256);
    assert_eq!(cfg.bert_epochs, 2);
    assert_eq!(cfg.bert_batch_size, 8);
    assert!((cfg.bert_learning_rate - 5e-5).abs() < f64::EPSILON);
}

#[test]
fn build_app_config_reads_directory_overrides() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_DATA_DIR", "/srv/corpus");
    map.insert("CRITIQ_GOLD_DIR", "/srv/gold");
    map.insert("CRITIQ_MODELS_DIR", "/srv/models");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.data_dir, PathBuf::from("/srv/corpus"));
    assert_eq!(cfg.gold_dir, PathBuf::from("/srv/gold"));
    assert_eq!(cfg.models_dir, PathBuf::from("/srv/models"));
}

#[test]
fn build_app_config_ignores_blank_optional_paths() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_ALIASES_PATH", "  ");
    map.insert("CRITIQ_LEXICON_PATH", "/etc/critiq/vader_lexicon.txt");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.aliases_path.is_none());
    assert_eq!(
        cfg.lexicon_path,
        Some(PathBuf::from("/etc/critiq/vader_lexicon.txt"))
    );
}

#[test]
fn build_app_config_fails_on_blank_required_values() {
    for var in ["CRITIQ_DATA_DIR", "CRITIQ_MODELS_DIR", "CRITIQ_BERT_MODEL"] {
        let mut map = HashMap::new();
        map.insert(var, " ");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == var),
            "expected MissingEnvVar({var}), got: {result:?}"
        );
    }
}

#[test]
fn build_app_config_fails_on_invalid_critiq_env() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_ENV", "producton");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CRITIQ_ENV"),
        "expected InvalidEnvVar(CRITIQ_ENV), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_on_non_numeric_seed() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_SEED", "forty-two");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CRITIQ_SEED"),
        "expected InvalidEnvVar(CRITIQ_SEED), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_test_fraction_out_of_range() {
    for raw in ["0", "1", "1.5", "-0.2"] {
        let mut map = HashMap::new();
        map.insert("CRITIQ_TEST_FRACTION", raw);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CRITIQ_TEST_FRACTION"),
            "expected InvalidEnvVar(CRITIQ_TEST_FRACTION) for {raw}, got: {result:?}"
        );
    }
}

#[test]
fn build_app_config_accepts_test_fraction_override() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_TEST_FRACTION", "0.25");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!((cfg.test_fraction - 0.25).abs() < f64::EPSILON);
}

#[test]
fn build_app_config_rejects_zero_trees() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_FOREST_TREES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CRITIQ_FOREST_TREES"),
        "expected InvalidEnvVar(CRITIQ_FOREST_TREES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_batch_size() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_BERT_BATCH_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CRITIQ_BERT_BATCH_SIZE"),
        "expected InvalidEnvVar(CRITIQ_BERT_BATCH_SIZE), got: {result:?}"
    );
}

#[test]
fn build_app_config_bert_overrides() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_BERT_MODEL", "/models/bert-tiny");
    map.insert("CRITIQ_BERT_MAX_LENGTH", "64");
    map.insert("CRITIQ_BERT_EPOCHS", "3");
    map.insert("CRITIQ_BERT_LEARNING_RATE", "0.0001");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.bert_model, "/models/bert-tiny");
    assert_eq!(cfg.bert_max_length, 64);
    assert_eq!(cfg.bert_epochs, 3);
    assert!((cfg.bert_learning_rate - 1e-4).abs() < f64::EPSILON);
}

#[test]
fn build_app_config_fails_on_invalid_learning_rate() {
    let mut map = HashMap::new();
    map.insert("CRITIQ_BERT_LEARNING_RATE", "fast");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CRITIQ_BERT_LEARNING_RATE"),
        "expected InvalidEnvVar(CRITIQ_BERT_LEARNING_RATE), got: {result:?}"
    );
}
