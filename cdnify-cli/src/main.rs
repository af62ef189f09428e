//! cdnify-deploy: compile, version and upload static assets.
//!
//! # Usage
//!
//! ```text
//! cdnify-deploy [--source=PATH] [--dest=PATH] [--disk=NAME] [--force]
//!               [--manifest=PATH] [--skip-build] [--detail]
//!               [--root=DIR] [--config=FILE] [--yes] [--json]
//! ```

mod console;
mod deploy;

use std::process::ExitCode;

use clap::Parser;

use console::Console;
use deploy::DeployArgs;

const GENERIC_FAILURE: &str =
    "Encountered an unknown error processing this request, please try again.";

fn main() -> ExitCode {
    let args = DeployArgs::parse();
    init_tracing(args.detail);

    let console = Console::new(args.detail);
    match args.run(&console) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The chain is for `--detail` / `RUST_LOG`; users see one line.
            tracing::info!("deploy failed: {e:#}");
            console.error(GENERIC_FAILURE);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `info` with `--detail`.
fn init_tracing(detail: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if detail { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
