//! Column-name aliases per canonical role.

use critiq_core::AliasOverrides;

use crate::types::CanonicalRole;

const COMMENT_ALIASES: &[&str] = &[
    "comment",
    "comments",
    "comment_text",
    "review",
    "feedback",
    "remark",
    "remarks",
    "body",
    "content",
    "text",
];

const TIMESTAMP_ALIASES: &[&str] = &[
    "timestamp",
    "time",
    "datetime",
    "date",
    "created_at",
    "posted_at",
];

const CATEGORY_ALIASES: &[&str] = &["category", "label", "tag", "class", "topic", "type"];

const RECORD_ID_ALIASES: &[&str] = &[
    "comment_id",
    "id",
    "commentid",
    "review_id",
    "row_id",
    "index",
];

/// Alias lists for every role. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    comment: Vec<String>,
    timestamp: Vec<String>,
    category: Vec<String>,
    record_id: Vec<String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        Self {
            comment: owned(COMMENT_ALIASES),
            timestamp: owned(TIMESTAMP_ALIASES),
            category: owned(CATEGORY_ALIASES),
            record_id: owned(RECORD_ID_ALIASES),
        }
    }
}

impl AliasTable {
    /// Built-in aliases extended with user overrides.
    ///
    /// Overrides are lower-cased, trimmed, and appended after the built-ins;
    /// entries already present are skipped.
    #[must_use]
    pub fn with_overrides(overrides: &AliasOverrides) -> Self {
        let mut table = Self::default();
        extend_unique(&mut table.comment, &overrides.comment);
        extend_unique(&mut table.timestamp, &overrides.timestamp);
        extend_unique(&mut table.category, &overrides.category);
        extend_unique(&mut table.record_id, &overrides.record_id);
        table
    }

    #[must_use]
    pub fn for_role(&self, role: CanonicalRole) -> &[String] {
        match role {
            CanonicalRole::Comment => &self.comment,
            CanonicalRole::Timestamp => &self.timestamp,
            CanonicalRole::Category => &self.category,
            CanonicalRole::RecordId => &self.record_id,
        }
    }
}

fn extend_unique(target: &mut Vec<String>, extra: &[String]) {
    for alias in extra {
        let alias = alias.trim().to_lowercase();
        if !alias.is_empty() && !target.contains(&alias) {
            target.push(alias);
        }
    }
}
