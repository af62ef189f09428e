//! Console sink with the three deploy channels.
//!
//! ```text
//! [-nfo-] progress          (stdout, --detail only)
//! [-msg-] per-asset notes   (stdout, --detail only)
//! [-err-] failures          (stderr, always)
//! ```

use colored::Colorize;

#[derive(Debug, Clone, Copy)]
pub struct Console {
    detail: bool,
}

impl Console {
    pub fn new(detail: bool) -> Self {
        Self { detail }
    }

    pub fn info(&self, message: &str) {
        if self.detail {
            println!("{} {message}", "[-nfo-]".green());
        }
    }

    pub fn comment(&self, message: &str) {
        if self.detail {
            println!("{} {message}", "[-msg-]".yellow());
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "[-err-]".red().bold());
    }

    /// Printed regardless of `--detail`.
    pub fn summary(&self, message: &str) {
        println!("{} {message}", "[-nfo-]".green().bold());
    }
}
