//! Column role inference for tables of unknown schema.
//!
//! Maps arbitrary column names onto the canonical roles `comment`,
//! `timestamp`, `category`, and `record_id` using alias matching followed by
//! content scoring, then projects the table onto those roles.

pub mod aliases;
pub mod candidates;
pub mod resolver;
pub mod scoring;
pub mod timestamp;
pub mod types;

pub use aliases::AliasTable;
pub use resolver::ColumnResolver;
pub use types::{
    CandidateScore, CanonicalRecord, CanonicalRole, RejectedCandidate, Resolution, RoleBinding,
};
