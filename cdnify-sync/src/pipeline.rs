//! Deploy pipeline entrypoint used by the CLI.
//!
//! `Idle → Building (optional) → ManifestLoaded → Uploading → Completed`,
//! with `Failed` reachable from every working state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cdnify_decorator::PathDecorator;

use crate::error::SyncError;
use crate::shell::ShellRunner;
use crate::storage::Disk;
use crate::synchronizer::{EntryOutcome, ManifestSynchronizer, UploadCounters, UploadTarget};

/// Everything a deploy run needs to know, already merged from config and flags.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub public_root: PathBuf,
    /// Manifest path relative to the public root.
    pub manifest: String,
    pub target: UploadTarget,
    /// `None` skips the build step.
    pub build_command: Option<String>,
}

/// Outcome of a completed deploy run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub counters: UploadCounters,
    pub outcomes: Vec<EntryOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Run a deploy with a fresh synchronizer.
pub fn run(
    plan: &DeployPlan,
    shell: &dyn ShellRunner,
    disk: &dyn Disk,
    decorator: &PathDecorator,
) -> Result<SyncReport, SyncError> {
    run_with(&mut ManifestSynchronizer::new(), plan, shell, disk, decorator)
}

/// Run a deploy on `sync`, leaving its state and counters inspectable afterwards.
pub fn run_with(
    sync: &mut ManifestSynchronizer,
    plan: &DeployPlan,
    shell: &dyn ShellRunner,
    disk: &dyn Disk,
    decorator: &PathDecorator,
) -> Result<SyncReport, SyncError> {
    let started_at = Utc::now();

    match plan.build_command.as_deref() {
        Some(command) => sync.build(shell, command)?,
        None => tracing::info!("build step skipped"),
    }

    let manifest = sync.load_manifest(&plan.public_root, &plan.manifest)?;
    tracing::info!("{} manifest entries", manifest.len());

    let counters = sync.upload(&manifest, &plan.target, disk, decorator)?;

    Ok(SyncReport {
        counters,
        outcomes: sync.outcomes().to_vec(),
        started_at,
        finished_at: Utc::now(),
    })
}
