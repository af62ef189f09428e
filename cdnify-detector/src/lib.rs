//! Build-tool detection for `cdnify-detector`.
//!
//! `detect_build_tool(path)` inspects indicator files in a project root and
//! returns which front-end pipeline stamps its assets. Config files win over
//! `package.json` dependencies; the modern pipeline wins when both appear.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cdnify_core::BuildTool;
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Confidence level of a detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    /// The build tool's own config file is present.
    High,
    /// Only a `package.json` dependency points at the tool.
    Medium,
    /// Nothing found.
    None,
}

/// A detected build pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBuild {
    pub tool: BuildTool,
    /// File that decided the result, relative to the project root.
    pub indicator: Option<PathBuf>,
    pub confidence: Confidence,
}

/// Errors from build-tool detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageJson {
    fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect which build tool the project at `path` uses.
pub fn detect_build_tool(path: &Path) -> Result<DetectedBuild, DetectError> {
    if let Some(d) = detect_config_file(path, "webpack.mix.js", BuildTool::Mix) { return Ok(d); }
    if let Some(d) = detect_config_file(path, "gulpfile.js", BuildTool::Elixir) { return Ok(d); }
    if let Some(d) = detect_package_json(path)? { return Ok(d); }

    Ok(DetectedBuild {
        tool: BuildTool::Unknown,
        indicator: None,
        confidence: Confidence::None,
    })
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

fn detect_config_file(path: &Path, name: &str, tool: BuildTool) -> Option<DetectedBuild> {
    if !path.join(name).is_file() { return None; }
    Some(DetectedBuild {
        tool,
        indicator: Some(PathBuf::from(name)),
        confidence: Confidence::High,
    })
}

fn detect_package_json(path: &Path) -> Result<Option<DetectedBuild>, DetectError> {
    let file = path.join("package.json");
    if !file.exists() { return Ok(None); }
    let content = fs::read_to_string(&file)?;
    let package: PackageJson =
        serde_json::from_str(&content).map_err(|e| DetectError::ParseError {
            path: file.clone(),
            message: e.to_string(),
        })?;

    let tool = if package.depends_on("laravel-mix") {
        BuildTool::Mix
    } else if package.depends_on("laravel-elixir") {
        BuildTool::Elixir
    } else {
        return Ok(None);
    };

    Ok(Some(DetectedBuild {
        tool,
        indicator: Some(PathBuf::from("package.json")),
        confidence: Confidence::Medium,
    }))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
