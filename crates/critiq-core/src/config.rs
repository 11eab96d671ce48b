use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed or is out of range.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Use it in tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed or is out of range.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Set-but-blank counts as missing for values that have no usable empty form.
    let non_blank = |var: &str, default: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(v) if v.trim().is_empty() => Err(ConfigError::MissingEnvVar(var.to_string())),
            Ok(v) => Ok(v),
            Err(_) => Ok(default.to_string()),
        }
    };

    let optional_path = |var: &str| -> Option<PathBuf> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("CRITIQ_ENV", "development"))?;
    let log_level = or_default("CRITIQ_LOG_LEVEL", "info");

    let data_dir = PathBuf::from(non_blank("CRITIQ_DATA_DIR", "data")?);
    let gold_dir = PathBuf::from(non_blank("CRITIQ_GOLD_DIR", "gold_data")?);
    let models_dir = PathBuf::from(non_blank("CRITIQ_MODELS_DIR", "models")?);
    let aliases_path = optional_path("CRITIQ_ALIASES_PATH");
    let lexicon_path = optional_path("CRITIQ_LEXICON_PATH");
    let stopwords_path = optional_path("CRITIQ_STOPWORDS_PATH");

    let seed = parse_u64("CRITIQ_SEED", "42")?;

    let test_fraction = parse_f64("CRITIQ_TEST_FRACTION", "0.2")?;
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(invalid(
            "CRITIQ_TEST_FRACTION",
            format!("{test_fraction} is outside the open interval (0, 1)"),
        ));
    }

    let max_features = parse_usize("CRITIQ_MAX_FEATURES", "20000")?;
    let min_df = parse_usize("CRITIQ_MIN_DF", "2")?;

    let forest_trees = parse_usize("CRITIQ_FOREST_TREES", "300")?;
    if forest_trees == 0 {
        return Err(invalid(
            "CRITIQ_FOREST_TREES",
            "forest needs at least one tree".to_string(),
        ));
    }

    let bert_model = non_blank("CRITIQ_BERT_MODEL", "nlpaueb/legal-bert-base-uncased")?;
    let bert_max_length = parse_usize("CRITIQ_BERT_MAX_LENGTH", "256")?;
    let bert_epochs = parse_usize("CRITIQ_BERT_EPOCHS", "2")?;
    let bert_batch_size = parse_usize("CRITIQ_BERT_BATCH_SIZE", "8")?;
    if bert_batch_size == 0 {
        return Err(invalid(
            "CRITIQ_BERT_BATCH_SIZE",
            "batch size must be positive".to_string(),
        ));
    }
    let bert_learning_rate = parse_f64("CRITIQ_BERT_LEARNING_RATE", "5e-5")?;

    Ok(AppConfig {
        env,
        log_level,
        data_dir,
        gold_dir,
        models_dir,
        aliases_path,
        lexicon_path,
        stopwords_path,
        seed,
        test_fraction,
        max_features,
        min_df,
        forest_trees,
        bert_model,
        bert_max_length,
        bert_epochs,
        bert_batch_size,
        bert_learning_rate,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CRITIQ_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
