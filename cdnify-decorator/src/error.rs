//! Error types for cdnify-decorator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading a build-tool rewrite manifest.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Filesystem error while reading the manifest.
    #[error("rewrite manifest io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not a flat JSON object of strings.
    #[error("failed to parse rewrite manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
