use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountStoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("account file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("refusing to overwrite existing file {path}")]
    AlreadyExists { path: PathBuf },
}

impl AccountStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::Io {
            operation,
            path,
            source,
        }
    }
}
