//! Manifest-driven upload.
//!
//! ## Per-entry protocol
//!
//! 1. Local source = source root + stamped path without its query string.
//! 2. Remote key = dest root + stamped path with `?id=` moved into the name.
//! 3. Local file missing → skipped.
//! 4. Remote object exists and not forced → skipped.
//! 5. `put` the bytes; a refused or failed write aborts the remaining entries.
//! 6. Otherwise uploaded.
//!
//! Steps 3–6 increment exactly one counter, or abort the run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use cdnify_decorator::{collapse_slashes, strip_query, PathDecorator};

use crate::error::{io_err, SyncError};
use crate::manifest::{self, Manifest};
use crate::shell::{self, ShellRunner};
use crate::storage::Disk;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Running totals for one upload run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadCounters {
    pub skipped: usize,
    pub uploaded: usize,
}

/// How a single manifest entry resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// The stamped file is not on the local disk.
    MissingLocal { asset: String, source: PathBuf },
    /// The object is already on the disk and the run is not forced.
    ExistsRemote { asset: String, key: String },
    /// The bytes were written.
    Uploaded { asset: String, key: String },
}

/// Where a deploy run currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    Building,
    ManifestLoaded,
    Uploading,
    Completed,
    Failed,
}

/// Location parameters for an upload run.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    /// Local directory the stamped paths are relative to.
    pub source_root: PathBuf,
    /// Key prefix on the disk.
    pub dest_root: String,
    /// Re-upload objects that already exist.
    pub force: bool,
}

impl UploadTarget {
    /// `<source_root>/<stamped without query>`.
    pub fn local_path(&self, stamped: &str) -> PathBuf {
        let relative = collapse_slashes(strip_query(stamped));
        self.source_root.join(relative.trim_start_matches('/'))
    }

    /// `<dest_root>/<renamed stamped>`, without a leading `/`.
    pub fn remote_key(&self, stamped: &str, decorator: &PathDecorator) -> String {
        let renamed = decorator.rename_query_string(stamped);
        let key = collapse_slashes(&format!("{}/{}", self.dest_root, renamed));
        key.trim_start_matches('/').to_string()
    }
}

// ---------------------------------------------------------------------------
// ManifestSynchronizer
// ---------------------------------------------------------------------------

/// Drives one deploy run: build, load manifest, upload.
///
/// Counters and outcomes stay readable after a failed run and cover only
/// the entries processed before the failure.
#[derive(Debug, Default)]
pub struct ManifestSynchronizer {
    state: SyncState,
    counters: UploadCounters,
    outcomes: Vec<EntryOutcome>,
}

impl ManifestSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn counters(&self) -> UploadCounters {
        self.counters
    }

    pub fn outcomes(&self) -> &[EntryOutcome] {
        &self.outcomes
    }

    /// Run the build command once.
    pub fn build(&mut self, shell: &dyn ShellRunner, command: &str) -> Result<(), SyncError> {
        self.state = SyncState::Building;
        let result = shell::build(shell, command);
        self.settle(result)
    }

    /// Load `<public_root><relative>`; missing file → empty manifest.
    pub fn load_manifest(
        &mut self,
        public_root: &Path,
        relative: &str,
    ) -> Result<Manifest, SyncError> {
        let result = manifest::load_at(public_root, relative);
        if result.is_ok() {
            self.state = SyncState::ManifestLoaded;
        }
        self.settle(result)
    }

    /// Upload every manifest entry in order, skipping what is missing or present.
    pub fn upload(
        &mut self,
        manifest: &Manifest,
        target: &UploadTarget,
        disk: &dyn Disk,
        decorator: &PathDecorator,
    ) -> Result<UploadCounters, SyncError> {
        self.state = SyncState::Uploading;
        self.counters = UploadCounters::default();
        self.outcomes.clear();

        tracing::info!("start asset upload to {}", disk.name());
        for (asset, stamped) in manifest.iter() {
            let result = self.upload_entry(asset, stamped, target, disk, decorator);
            self.settle(result)?;
        }
        tracing::info!("end asset upload to {}", disk.name());

        self.state = SyncState::Completed;
        Ok(self.counters)
    }

    fn upload_entry(
        &mut self,
        asset: &str,
        stamped: &str,
        target: &UploadTarget,
        disk: &dyn Disk,
        decorator: &PathDecorator,
    ) -> Result<(), SyncError> {
        let source = target.local_path(stamped);
        let key = target.remote_key(stamped, decorator);

        if !source.is_file() {
            tracing::debug!("skipping, local file doesn't exist ({asset})");
            self.counters.skipped += 1;
            self.outcomes.push(EntryOutcome::MissingLocal {
                asset: asset.to_string(),
                source,
            });
            return Ok(());
        }

        if !target.force && disk.exists(&key)? {
            tracing::debug!("skipping, asset exists on {} ({asset})", disk.name());
            self.counters.skipped += 1;
            self.outcomes.push(EntryOutcome::ExistsRemote {
                asset: asset.to_string(),
                key,
            });
            return Ok(());
        }

        tracing::info!("sending asset to {} ({key})", disk.name());
        let bytes = std::fs::read(&source).map_err(|e| io_err(&source, e))?;
        if !disk.put(&key, &bytes)? {
            return Err(SyncError::UploadRejected {
                disk: disk.name().to_string(),
                key,
            });
        }

        self.counters.uploaded += 1;
        self.outcomes.push(EntryOutcome::Uploaded {
            asset: asset.to_string(),
            key,
        });
        Ok(())
    }

    /// Record `Failed` on error and pass the result through.
    fn settle<T>(&mut self, result: Result<T, SyncError>) -> Result<T, SyncError> {
        if let Err(e) = &result {
            tracing::debug!("deploy failed while {:?}: {e}", self.state);
            self.state = SyncState::Failed;
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
