//! Candidate discovery by column name.

use critiq_core::Table;

/// Lower-cased, trimmed form of a column name used for alias matching.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Columns whose names match any alias, exact matches first.
///
/// Pass one collects exact matches in column order; pass two collects columns
/// whose normalized name contains an alias. The result is de-duplicated and
/// keeps first-seen order.
#[must_use]
pub fn find_candidates(table: &Table, aliases: &[String]) -> Vec<String> {
    let normalized: Vec<(String, &str)> = table
        .columns()
        .iter()
        .map(|c| (normalize_name(&c.name), c.name.as_str()))
        .collect();

    let mut out: Vec<String> = Vec::new();

    for (norm, original) in &normalized {
        if aliases.iter().any(|alias| alias == norm) {
            push_unique(&mut out, original);
        }
    }

    for (norm, original) in &normalized {
        if aliases.iter().any(|alias| norm.contains(alias.as_str())) {
            push_unique(&mut out, original);
        }
    }

    out
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|existing| existing == name) {
        out.push(name.to_string());
    }
}
