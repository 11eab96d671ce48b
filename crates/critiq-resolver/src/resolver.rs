use std::collections::BTreeMap;

use critiq_core::{Cell, Table};

use crate::aliases::AliasTable;
use crate::candidates::find_candidates;
use crate::scoring::{score, TIMESTAMP_MIN_SCORE};
use crate::types::{
    CandidateScore, CanonicalRecord, CanonicalRole, RejectedCandidate, Resolution, RoleBinding,
};

/// Binds table columns to canonical roles.
///
/// Holds only a read-only alias table, so one instance can be shared across
/// threads and reused for any number of tables.
#[derive(Debug, Clone, Default)]
pub struct ColumnResolver {
    aliases: AliasTable,
}

impl ColumnResolver {
    #[must_use]
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    #[must_use]
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Resolve every role independently, then project the table.
    ///
    /// Never fails: unbound roles land in `missing`, a timestamp winner below
    /// [`TIMESTAMP_MIN_SCORE`] lands in `rejected`, and an unbound `record_id`
    /// is synthesized as `1..=n_rows`.
    #[must_use]
    pub fn resolve(&self, table: &Table) -> Resolution {
        let mut binding = RoleBinding::default();
        let mut rejected = Vec::new();
        let mut candidates = BTreeMap::new();

        for role in CanonicalRole::DISPLAY_ORDER {
            let scored = self.score_candidates(table, role);
            let winner = best_candidate(&scored);

            match winner {
                Some(best) if role == CanonicalRole::Timestamp && best.score < TIMESTAMP_MIN_SCORE => {
                    tracing::info!(
                        role = %role,
                        column = %best.column,
                        score = best.score,
                        threshold = TIMESTAMP_MIN_SCORE,
                        "timestamp candidate rejected below parse-rate threshold"
                    );
                    rejected.push(RejectedCandidate {
                        role,
                        column: best.column.clone(),
                        score: best.score,
                        threshold: TIMESTAMP_MIN_SCORE,
                    });
                }
                Some(best) => binding.set(role, Some(best.column.clone())),
                None => tracing::debug!(role = %role, "no candidate columns"),
            }

            candidates.insert(role, scored);
        }

        for (column, roles) in binding.shared_columns() {
            let roles: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
            tracing::warn!(column, roles = ?roles, "column bound to more than one role");
        }

        let missing: Vec<CanonicalRole> = CanonicalRole::DISPLAY_ORDER
            .iter()
            .copied()
            .filter(|&role| binding.get(role).is_none())
            .collect();

        let records = project(table, &binding);

        Resolution {
            source_columns: table.column_names().into_iter().map(str::to_string).collect(),
            binding,
            missing,
            rejected,
            candidates,
            records,
        }
    }

    fn score_candidates(&self, table: &Table, role: CanonicalRole) -> Vec<CandidateScore> {
        find_candidates(table, self.aliases.for_role(role))
            .into_iter()
            .filter_map(|name| {
                let column = table.column(&name)?;
                let value = score(role, column);
                tracing::debug!(role = %role, column = %name, score = value, "scored candidate");
                Some(CandidateScore {
                    column: name,
                    score: value,
                })
            })
            .collect()
    }
}

/// Highest score wins; on ties the earlier candidate is kept.
fn best_candidate(scored: &[CandidateScore]) -> Option<&CandidateScore> {
    let mut best: Option<&CandidateScore> = None;
    for candidate in scored {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best
}

fn project(table: &Table, binding: &RoleBinding) -> Vec<CanonicalRecord> {
    let ids = bound_cells(table, binding, CanonicalRole::RecordId);
    let comments = bound_cells(table, binding, CanonicalRole::Comment);
    let categories = bound_cells(table, binding, CanonicalRole::Category);
    let timestamps = bound_cells(table, binding, CanonicalRole::Timestamp);

    let at = |cells: &[Cell], row: usize| cells.get(row).cloned().unwrap_or(Cell::Null);

    (0..table.n_rows())
        .map(|row| CanonicalRecord {
            record_id: match ids {
                Some(cells) => at(cells, row),
                None => Cell::Int(i64::try_from(row + 1).unwrap_or(i64::MAX)),
            },
            comment: comments.map_or(Cell::Null, |cells| at(cells, row)),
            category: categories.map(|cells| at(cells, row)),
            timestamp: timestamps.map(|cells| at(cells, row)),
            source_row_index: row,
        })
        .collect()
}

fn bound_cells<'a>(table: &'a Table, binding: &RoleBinding, role: CanonicalRole) -> Option<&'a [Cell]> {
    binding
        .get(role)
        .and_then(|name| table.column(name))
        .map(|column| column.cells.as_slice())
}
