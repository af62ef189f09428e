//! Error types for cdnify-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load, with the file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The `cdn` list is empty.
    #[error("no CDN origins configured")]
    NoOrigins,

    /// A named origin in the `cdn` map is not a string.
    #[error("CDN origin '{name}' must be a string")]
    InvalidOrigin { name: String },

    /// `--disk` / `command.disk` names a disk that is neither built in nor configured.
    #[error("disk '{name}' is not supported; expected one of: {valid}")]
    UnknownDisk { name: String, valid: String },

    /// A built-in remote disk was selected but has no `disks:` entry.
    #[error("disk '{name}' has no configuration under `disks:`")]
    DiskNotConfigured { name: String },
}
