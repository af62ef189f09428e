//! Error types for cdnify-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a [`Disk`](crate::storage::Disk) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Local filesystem failure, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote endpoint could not be reached or answered unexpectedly.
    #[error("request for '{key}' failed: {message}")]
    Http { key: String, message: String },
}

/// All errors that abort a deploy run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The build command reported failure.
    #[error("build command failed: {command}")]
    Build { command: String },

    /// The upload manifest exists but is not a JSON object.
    #[error("invalid manifest at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest value is not a string.
    #[error("invalid manifest at {path}: value for '{key}' is not a string")]
    ManifestEntry { path: PathBuf, key: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage backend failed while checking or writing an object.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The storage backend reported that a write did not succeed.
    #[error("upload of '{key}' to disk '{disk}' was rejected")]
    UploadRejected { disk: String, key: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`StorageError::Io`].
pub(crate) fn storage_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.into(),
        source,
    }
}
