//! # cdnify-sync
//!
//! Build step, manifest loading and skip-aware upload of stamped assets.
//!
//! Call [`pipeline::run`] for a whole deploy, or drive a
//! [`ManifestSynchronizer`] step by step.

pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod shell;
pub mod storage;
pub mod synchronizer;

pub use error::{StorageError, SyncError};
pub use manifest::Manifest;
pub use pipeline::{DeployPlan, SyncReport};
pub use shell::{ShellRunner, SystemShell};
pub use storage::{Disk, HttpDisk, LocalDisk};
pub use synchronizer::{
    EntryOutcome, ManifestSynchronizer, SyncState, UploadCounters, UploadTarget,
};
