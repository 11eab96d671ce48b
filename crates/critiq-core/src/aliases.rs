use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Extra column-name aliases, keyed by canonical role.
///
/// Entries extend the built-in alias lists; they never replace them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasOverrides {
    pub comment: Vec<String>,
    pub timestamp: Vec<String>,
    pub category: Vec<String>,
    pub record_id: Vec<String>,
}

/// Load and validate alias overrides from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or contains a
/// blank alias.
pub fn load_alias_overrides(path: &Path) -> Result<AliasOverrides, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AliasFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_alias_overrides(&content)
}

fn parse_alias_overrides(content: &str) -> Result<AliasOverrides, ConfigError> {
    let overrides: AliasOverrides = serde_yaml::from_str(content)?;
    validate_overrides(&overrides)?;
    Ok(overrides)
}

fn validate_overrides(overrides: &AliasOverrides) -> Result<(), ConfigError> {
    let roles = [
        ("comment", &overrides.comment),
        ("timestamp", &overrides.timestamp),
        ("category", &overrides.category),
        ("record_id", &overrides.record_id),
    ];

    for (role, aliases) in roles {
        if aliases.iter().any(|alias| alias.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "alias list for '{role}' contains a blank entry"
            )));
        }
    }

    Ok(())
}
