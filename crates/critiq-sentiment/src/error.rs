use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("no comment column could be resolved from columns [{}]", columns.join(", "))]
    UnresolvableComment { columns: Vec<String> },

    #[error("resource file not found: {}", path.display())]
    ResourceMissing { path: PathBuf },

    #[error("failed to read resource {}: {source}", path.display())]
    ResourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid entry in {} at line {line}: {reason}", path.display())]
    ResourceParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Read a resource file, mapping a missing file to [`SentimentError::ResourceMissing`].
pub(crate) fn read_resource(path: &std::path::Path) -> Result<String, SentimentError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SentimentError::ResourceMissing {
                path: path.to_path_buf(),
            }
        } else {
            SentimentError::ResourceIo {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
