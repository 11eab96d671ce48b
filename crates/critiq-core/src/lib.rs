//! Shared building blocks for the critiq workspace.
//!
//! Holds the in-memory [`Table`] model every other crate consumes, the
//! delimited-file reader that produces it, and the environment-driven
//! [`AppConfig`].

pub mod aliases;
pub mod app_config;
pub mod config;
pub mod table;

pub use aliases::{load_alias_overrides, AliasOverrides};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use table::{Cell, Column, Table, TableFormat};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read alias file {path}: {source}")]
    AliasFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse alias file: {0}")]
    AliasFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported table format: {0}")]
    UnsupportedFormat(String),
}
