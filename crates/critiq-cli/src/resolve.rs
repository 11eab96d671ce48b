//! `critiq resolve`: column role inference for one table.

use std::path::Path;

use anyhow::Context;
use critiq_core::{load_alias_overrides, AppConfig, Table};
use critiq_resolver::{AliasTable, CanonicalRole, ColumnResolver, Resolution};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ResolveOutput<'a> {
    /// Bound roles in display order.
    pub columns: Vec<CanonicalRole>,
    #[serde(flatten)]
    pub resolution: &'a Resolution,
}

/// Built-in aliases, extended from `CRITIQ_ALIASES_PATH` when set.
///
/// # Errors
///
/// Returns an error if the alias file cannot be read or parsed.
pub(crate) fn build_resolver(config: &AppConfig) -> anyhow::Result<ColumnResolver> {
    let aliases = match &config.aliases_path {
        Some(path) => {
            let overrides = load_alias_overrides(path)
                .with_context(|| format!("failed to load aliases from {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded alias overrides");
            AliasTable::with_overrides(&overrides)
        }
        None => AliasTable::default(),
    };
    Ok(ColumnResolver::new(aliases))
}

pub(crate) fn read_table(file: &Path) -> anyhow::Result<Table> {
    Table::from_path(file).with_context(|| format!("failed to read table {}", file.display()))
}

pub(crate) fn run_resolve(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let resolver = build_resolver(config)?;
    let table = read_table(file)?;
    let resolution = resolver.resolve(&table);
    let output = ResolveOutput {
        columns: resolution.columns(),
        resolution: &resolution,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
