//! Search error types following panic-free policy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while walking the search root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// An entry could not be read (missing, permission denied, vanished)
    #[error("{}: {reason}", path.display())]
    Access { path: PathBuf, reason: String },

    /// Traversal failed without a specific path
    #[error("{0}")]
    Walk(String),
}

impl From<walkdir::Error> for SearchError {
    fn from(err: walkdir::Error) -> Self {
        match (err.path(), err.io_error()) {
            (Some(path), Some(io)) => SearchError::Access {
                path: path.to_path_buf(),
                reason: io.to_string(),
            },
            _ => SearchError::Walk(err.to_string()),
        }
    }
}
