//! Labeled corpus discovery and loading.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use critiq_core::{Cell, Table};
use walkdir::WalkDir;

use crate::error::TrainError;

const COMMENT_COLUMNS: &[&str] = &["comment", "text"];
const LABEL_COLUMNS: &[&str] = &["label", "sentiment", "argument_label"];

/// Comment/label pairs gathered from every corpus file, in file then row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledCorpus {
    pub comments: Vec<String>,
    pub labels: Vec<String>,
    pub files: usize,
}

impl LabeledCorpus {
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Sorted distinct labels. A label's position is its class id.
    #[must_use]
    pub fn label_set(&self) -> Vec<String> {
        self.labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Class id of every row against `label_set`.
    #[must_use]
    pub fn label_ids(&self, label_set: &[String]) -> Vec<usize> {
        self.labels
            .iter()
            .map(|l| label_set.binary_search(l).unwrap_or_default())
            .collect()
    }

    /// Append the usable rows of one table.
    ///
    /// The comment column is `comment`, else `text`, else the first column;
    /// the label column is `label`, else `sentiment`, else `argument_label`,
    /// else the last column. Rows with a null comment or label are dropped.
    pub fn push_table(&mut self, table: &Table) {
        let (Some(comment), Some(label)) = (
            pick_column(table, COMMENT_COLUMNS, Pick::First),
            pick_column(table, LABEL_COLUMNS, Pick::Last),
        ) else {
            return;
        };
        for (c, l) in comment.iter().zip(label) {
            if let (Some(c), Some(l)) = (c.as_text(), l.as_text()) {
                self.comments.push(c);
                self.labels.push(l);
            }
        }
    }
}

enum Pick {
    First,
    Last,
}

fn pick_column<'a>(table: &'a Table, names: &[&str], fallback: Pick) -> Option<&'a [Cell]> {
    let columns = table.columns();
    let named = names.iter().find_map(|wanted| {
        columns
            .iter()
            .find(|c| c.name.trim().to_lowercase() == *wanted)
    });
    let column = named.or(match fallback {
        Pick::First => columns.first(),
        Pick::Last => columns.last(),
    })?;
    Some(column.cells.as_slice())
}

/// Delimited files under each root, recursively, sorted by path.
///
/// Missing roots contribute nothing.
#[must_use]
pub fn discover_files(roots: &[&Path]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        if !root.exists() {
            tracing::debug!(root = %root.display(), "corpus root does not exist");
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable corpus entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_delimited(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

fn is_delimited(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv"))
}

/// Load and concatenate every corpus file under the two roots.
///
/// Files that fail to parse are skipped with a warning.
///
/// # Errors
///
/// Returns [`TrainError::CorpusMissing`] when no file is found and
/// [`TrainError::CorpusEmpty`] when no usable row remains.
pub fn read_corpus(data_dir: &Path, gold_dir: &Path) -> Result<LabeledCorpus, TrainError> {
    let files = discover_files(&[data_dir, gold_dir]);
    if files.is_empty() {
        return Err(TrainError::CorpusMissing {
            roots: vec![data_dir.to_path_buf(), gold_dir.to_path_buf()],
        });
    }

    let mut corpus = LabeledCorpus::default();
    for path in &files {
        match Table::from_path(path) {
            Ok(table) => {
                let before = corpus.len();
                corpus.push_table(&table);
                corpus.files += 1;
                tracing::debug!(
                    file = %path.display(),
                    rows = corpus.len() - before,
                    "loaded corpus file"
                );
            }
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "skipping corpus file"),
        }
    }

    if corpus.is_empty() {
        return Err(TrainError::CorpusEmpty {
            files: corpus.files,
        });
    }
    tracing::info!(files = corpus.files, rows = corpus.len(), "corpus loaded");
    Ok(corpus)
}
