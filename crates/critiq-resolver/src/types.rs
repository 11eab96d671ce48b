use std::collections::BTreeMap;

use critiq_core::Cell;
use serde::{Deserialize, Serialize};

/// Semantic role a source column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalRole {
    Comment,
    Timestamp,
    Category,
    RecordId,
}

impl CanonicalRole {
    /// Fixed display order used for bound columns and `missing`.
    pub const DISPLAY_ORDER: [CanonicalRole; 4] = [
        CanonicalRole::RecordId,
        CanonicalRole::Comment,
        CanonicalRole::Timestamp,
        CanonicalRole::Category,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalRole::Comment => "comment",
            CanonicalRole::Timestamp => "timestamp",
            CanonicalRole::Category => "category",
            CanonicalRole::RecordId => "record_id",
        }
    }
}

impl std::fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source column bound to each role, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub record_id: Option<String>,
    pub comment: Option<String>,
    pub timestamp: Option<String>,
    pub category: Option<String>,
}

impl RoleBinding {
    #[must_use]
    pub fn get(&self, role: CanonicalRole) -> Option<&str> {
        match role {
            CanonicalRole::Comment => self.comment.as_deref(),
            CanonicalRole::Timestamp => self.timestamp.as_deref(),
            CanonicalRole::Category => self.category.as_deref(),
            CanonicalRole::RecordId => self.record_id.as_deref(),
        }
    }

    pub fn set(&mut self, role: CanonicalRole, column: Option<String>) {
        match role {
            CanonicalRole::Comment => self.comment = column,
            CanonicalRole::Timestamp => self.timestamp = column,
            CanonicalRole::Category => self.category = column,
            CanonicalRole::RecordId => self.record_id = column,
        }
    }

    /// Bound `(role, column)` pairs in display order.
    #[must_use]
    pub fn bound(&self) -> Vec<(CanonicalRole, &str)> {
        CanonicalRole::DISPLAY_ORDER
            .iter()
            .filter_map(|&role| self.get(role).map(|col| (role, col)))
            .collect()
    }

    /// Columns bound to more than one role.
    ///
    /// Roles are resolved independently, so one column can win two roles.
    #[must_use]
    pub fn shared_columns(&self) -> Vec<(&str, Vec<CanonicalRole>)> {
        let mut by_column: BTreeMap<&str, Vec<CanonicalRole>> = BTreeMap::new();
        for (role, column) in self.bound() {
            by_column.entry(column).or_default().push(role);
        }
        by_column.into_iter().filter(|(_, roles)| roles.len() > 1).collect()
    }
}

/// Heuristic score of one candidate column for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub column: String,
    pub score: f64,
}

/// A winning candidate discarded by a quality gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub role: CanonicalRole,
    pub column: String,
    pub score: f64,
    pub threshold: f64,
}

/// One projected row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub record_id: Cell,
    pub comment: Cell,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Cell>,
    pub source_row_index: usize,
}

/// Full output of resolving one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Column names of the resolved table, in table order.
    pub source_columns: Vec<String>,
    pub binding: RoleBinding,
    /// Roles with no source column, in display order. Includes `record_id`
    /// when ids were synthesized.
    pub missing: Vec<CanonicalRole>,
    pub rejected: Vec<RejectedCandidate>,
    /// Scored candidates per role, in discovery order.
    pub candidates: BTreeMap<CanonicalRole, Vec<CandidateScore>>,
    pub records: Vec<CanonicalRecord>,
}

impl Resolution {
    /// Canonical column names present in the projection, in display order.
    #[must_use]
    pub fn columns(&self) -> Vec<CanonicalRole> {
        CanonicalRole::DISPLAY_ORDER
            .iter()
            .copied()
            .filter(|&role| role == CanonicalRole::RecordId || self.binding.get(role).is_some())
            .collect()
    }

    #[must_use]
    pub fn is_missing(&self, role: CanonicalRole) -> bool {
        self.missing.contains(&role)
    }

    #[must_use]
    pub fn has_comment(&self) -> bool {
        self.binding.comment.is_some()
    }
}
