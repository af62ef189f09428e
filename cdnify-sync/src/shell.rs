//! Build step: one shell command that compiles and stamps assets.

use std::path::PathBuf;
use std::process::Command;

use crate::error::SyncError;

/// Runs a shell command line; `true` means it succeeded.
pub trait ShellRunner {
    fn run(&self, command: &str) -> bool;
}

/// Runs commands through the platform shell in a fixed working directory.
#[derive(Debug, Clone)]
pub struct SystemShell {
    cwd: PathBuf,
}

impl SystemShell {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

impl ShellRunner for SystemShell {
    fn run(&self, command: &str) -> bool {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };

        match cmd.current_dir(&self.cwd).status() {
            Ok(status) => {
                if !status.success() {
                    tracing::info!("`{command}` exited with {status}");
                }
                status.success()
            }
            Err(e) => {
                tracing::info!("could not spawn `{command}`: {e}");
                false
            }
        }
    }
}

/// Run `command` once; failure aborts the deploy.
pub fn build(shell: &dyn ShellRunner, command: &str) -> Result<(), SyncError> {
    tracing::info!("start build command ({command})");
    if !shell.run(command) {
        return Err(SyncError::Build {
            command: command.to_string(),
        });
    }
    tracing::info!("end build command ({command})");
    Ok(())
}
