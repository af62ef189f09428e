//! `cdnify-deploy`: build, read the manifest and upload stamped assets.
//!
//! Precedence for every setting: flag, then `cdnify.yaml` `command:`, then
//! the detected build tool.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use cdnify_core::{config, BuildTool, CdnifyConfig};
use cdnify_decorator::PathDecorator;
use cdnify_detector::detect_build_tool;
use cdnify_sync::{
    pipeline, storage, DeployPlan, EntryOutcome, SyncReport, SystemShell, UploadTarget,
};

use crate::console::Console;

/// Compile, version and upload static assets to a storage disk.
#[derive(Parser, Debug)]
#[command(name = "cdnify-deploy", version, long_about = None)]
pub struct DeployArgs {
    /// Directory under the public root the manifest values point into.
    #[arg(long, value_name = "PATH")]
    pub source: Option<String>,

    /// Key prefix on the destination disk.
    #[arg(long, value_name = "PATH")]
    pub dest: Option<String>,

    /// Destination disk (`local`, `s3`, `rackspace` or a configured name).
    #[arg(long, value_name = "NAME")]
    pub disk: Option<String>,

    /// Re-upload assets that already exist on the disk.
    #[arg(long)]
    pub force: bool,

    /// Manifest path relative to the public root.
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<String>,

    /// Do not run the build command.
    #[arg(long)]
    pub skip_build: bool,

    /// Print progress and per-asset lines.
    #[arg(long)]
    pub detail: bool,

    /// Project root (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Configuration file (default: `<root>/cdnify.yaml`).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Answer yes to the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

/// A deploy with every setting merged.
#[derive(Debug)]
struct Resolved {
    root: PathBuf,
    disk: String,
    tool: BuildTool,
    plan: DeployPlan,
}

impl DeployArgs {
    pub fn run(self, console: &Console) -> Result<()> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| config::config_path_at(&root));
        let config = config::load_at(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?;

        let disk_name = self
            .disk
            .clone()
            .unwrap_or_else(|| config.command.disk.clone());
        let disk = storage::open(&config, &disk_name, &root)
            .with_context(|| format!("disk '{disk_name}' is not usable"))?;

        let detected = detect_build_tool(&root).context("build tool detection failed")?;
        tracing::info!(
            "build tool {} ({:?} confidence)",
            detected.tool,
            detected.confidence
        );

        // Uploads only need the query-string rename; the build manifest is
        // read by the pipeline itself.
        let decorator = PathDecorator::for_uploads(&config);

        let resolved = self.resolve(root, disk_name, detected.tool, &config);

        console.comment("cdnify-deploy");
        console.info(&format!(
            "This will compile and upload assets from {} to your chosen data store ({})...",
            resolved.plan.manifest, resolved.disk
        ));
        match &resolved.plan.build_command {
            Some(command) => {
                console.info(&format!("Build command ({}): {command}", resolved.tool))
            }
            None => console.comment("Build step skipped."),
        }

        if !self.yes && !confirm("Do you wish to continue?")? {
            console.comment("Nothing was done.");
            return Ok(());
        }

        let shell = SystemShell::new(&resolved.root);
        let report = pipeline::run(&resolved.plan, &shell, &*disk, &decorator)
            .with_context(|| format!("deploy to '{}' failed", resolved.disk))?;

        print_outcomes(console, &resolved.disk, &report);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            console.summary(&format!(
                "Uploaded {} assets, skipped {}.",
                report.counters.uploaded, report.counters.skipped
            ));
        }
        console.info("Finished...");
        Ok(())
    }

    fn resolve(
        &self,
        root: PathBuf,
        disk: String,
        tool: BuildTool,
        config: &CdnifyConfig,
    ) -> Resolved {
        let defaults = &config.command;
        let public_root = root.join(&config.public_root);

        let source = self
            .source
            .clone()
            .or_else(|| defaults.source.clone())
            .unwrap_or_else(|| tool.source_dir().to_string());
        let manifest = self
            .manifest
            .clone()
            .or_else(|| defaults.manifest.clone())
            .unwrap_or_else(|| tool.manifest_path().to_string());
        let dest = self.dest.clone().unwrap_or_else(|| defaults.dest.clone());

        let skip_build = self.skip_build || defaults.skip_build;
        let build_command = (!skip_build).then(|| {
            defaults
                .build
                .clone()
                .unwrap_or_else(|| tool.build_command().to_string())
        });

        let target = UploadTarget {
            source_root: join_relative(&public_root, &source),
            dest_root: dest,
            force: self.force || defaults.force,
        };

        Resolved {
            root,
            disk,
            tool,
            plan: DeployPlan {
                public_root,
                manifest,
                target,
                build_command,
            },
        }
    }
}

/// `base/<relative>`; a leading `/` on `relative` is ignored.
fn join_relative(base: &Path, relative: &str) -> PathBuf {
    base.join(relative.trim_start_matches('/'))
}

/// Ask a yes/no question on stdin; anything but `y`/`yes` is a no.
fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_outcomes(console: &Console, disk: &str, report: &SyncReport) {
    for outcome in &report.outcomes {
        match outcome {
            EntryOutcome::MissingLocal { asset, .. } => {
                console.comment(&format!("Skipping. Local file doesn't exist. ({asset})"))
            }
            EntryOutcome::ExistsRemote { asset, .. } => {
                console.comment(&format!("Skipping. Asset exists on {disk}. ({asset})"))
            }
            EntryOutcome::Uploaded { key, .. } => {
                console.info(&format!("Sent asset to {disk}. ({key})"))
            }
        }
    }
}
