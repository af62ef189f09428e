//! Domain types shared by the decorator, the synchronizer and the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a runtime environment (`production`, `staging`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Environment(pub String);

impl Environment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// CDN origins
// ---------------------------------------------------------------------------

/// Ordered, non-empty list of CDN origin URLs.
///
/// Immutable once built; the rotation cursor lives on the decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnOrigins(Vec<String>);

impl CdnOrigins {
    /// Returns [`ConfigError::NoOrigins`] for an empty list.
    pub fn new(origins: Vec<String>) -> Result<Self, ConfigError> {
        if origins.is_empty() {
            return Err(ConfigError::NoOrigins);
        }
        Ok(Self(origins))
    }

    /// One empty origin: joining it leaves a path as it is.
    pub fn same_origin() -> Self {
        Self(vec![String::new()])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a list built through [`CdnOrigins::new`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Origin at `index`, wrapping modulo the list length.
    pub fn get(&self, index: usize) -> &str {
        &self.0[index % self.0.len()]
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Build tool
// ---------------------------------------------------------------------------

/// Front-end build tool that compiles and version-stamps assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    /// Modern webpack-based pipeline (`mix-manifest.json`, `?id=` hashes).
    Mix,
    /// Legacy gulp pipeline (`build/rev-manifest.json`, hashed file names).
    Elixir,
    /// Nothing detected; callers fall back to the modern defaults.
    #[default]
    Unknown,
}

impl BuildTool {
    /// Shell command that compiles and stamps assets for production.
    pub fn build_command(&self) -> &'static str {
        match self {
            BuildTool::Elixir => "gulp --production",
            BuildTool::Mix | BuildTool::Unknown => "npm run production",
        }
    }

    /// Manifest location relative to the public root.
    pub fn manifest_path(&self) -> &'static str {
        match self {
            BuildTool::Elixir => "/build/rev-manifest.json",
            BuildTool::Mix | BuildTool::Unknown => "/mix-manifest.json",
        }
    }

    /// Directory under the public root that manifest values are relative to.
    pub fn source_dir(&self) -> &'static str {
        match self {
            BuildTool::Elixir => "/build",
            BuildTool::Mix | BuildTool::Unknown => "",
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildTool::Mix => write!(f, "mix"),
            BuildTool::Elixir => write!(f, "elixir"),
            BuildTool::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_display() {
        assert_eq!(Environment::from("production").to_string(), "production");
    }

    #[test]
    fn origins_reject_empty_list() {
        let err = CdnOrigins::new(vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::NoOrigins));
    }

    #[test]
    fn origins_get_wraps() {
        let origins =
            CdnOrigins::new(vec!["https://a".to_string(), "https://b".to_string()]).unwrap();
        assert_eq!(origins.get(0), "https://a");
        assert_eq!(origins.get(3), "https://b");
        assert_eq!(origins.len(), 2);
    }

    #[test]
    fn same_origin_is_a_single_empty_origin() {
        let origins = CdnOrigins::same_origin();
        assert_eq!(origins.len(), 1);
        assert_eq!(origins.first(), "");
        assert_eq!(origins.get(5), "");
    }

    #[test]
    fn unknown_build_tool_prefers_modern_defaults() {
        assert_eq!(BuildTool::Unknown.build_command(), BuildTool::Mix.build_command());
        assert_eq!(BuildTool::Unknown.manifest_path(), "/mix-manifest.json");
        assert_eq!(BuildTool::Elixir.manifest_path(), "/build/rev-manifest.json");
    }
}
