//! `cdnify.yaml` configuration.
//!
//! # Layout
//!
//! ```text
//! <project root>/
//!   cdnify.yaml      (optional; built-in defaults apply when absent)
//!   public/          (public root, configurable)
//! ```
//!
//! # API pattern
//!
//! - `load_at(path)`: explicit file; used in tests with `TempDir`
//! - `load(root)`: `<root>/cdnify.yaml`, delegates to `load_at`

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{CdnOrigins, Environment};

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = "cdnify.yaml";

/// Disk names accepted without a `disks:` entry.
pub const BUILTIN_DISKS: &[&str] = &["local", "s3", "rackspace"];

/// Root used by the `local` disk when it is not configured.
pub const DEFAULT_LOCAL_ROOT: &str = "storage/app";

// ---------------------------------------------------------------------------
// 1. Model
// ---------------------------------------------------------------------------

/// CDN origins as written in YAML: a plain list, or a `name: url` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OriginsSpec {
    List(Vec<String>),
    Named(serde_yaml::Mapping),
}

impl Default for OriginsSpec {
    fn default() -> Self {
        OriginsSpec::List(Vec::new())
    }
}

/// Query parameter that carries the content hash, and the separator used
/// when moving it into the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryStringConfig {
    pub key: String,
    pub separator: String,
}

impl Default for QueryStringConfig {
    fn default() -> Self {
        Self {
            key: "id".to_string(),
            separator: "-".to_string(),
        }
    }
}

/// Defaults for `cdnify-deploy`; every field can be overridden by a flag.
///
/// `source` and `manifest` fall back to the detected build tool when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub dest: String,
    pub disk: String,
    pub force: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    pub skip_build: bool,
    /// Explicit build command; replaces the detected one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
}

impl Default for CommandDefaults {
    fn default() -> Self {
        Self {
            source: None,
            dest: String::new(),
            disk: "s3".to_string(),
            force: false,
            manifest: None,
            skip_build: false,
            build: None,
        }
    }
}

/// Storage driver for a named disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum DiskConfig {
    /// Files under a directory, relative paths resolved against the project root.
    Local { root: PathBuf },
    /// S3-compatible REST endpoint (`HEAD` / `PUT` per key).
    Http {
        endpoint: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_timeout_secs() -> u64 {
    30
}

/// Root of `cdnify.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnifyConfig {
    pub cdn: OriginsSpec,
    /// Current environment when `APP_ENV` is not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Environments in which paths get a CDN prefix.
    pub environments: BTreeSet<String>,
    pub build_rewrite: bool,
    pub round_robin: bool,
    pub rename_query_strings: bool,
    pub query_string: QueryStringConfig,
    pub public_root: PathBuf,
    pub command: CommandDefaults,
    pub disks: BTreeMap<String, DiskConfig>,
}

impl Default for CdnifyConfig {
    fn default() -> Self {
        Self {
            cdn: OriginsSpec::default(),
            environment: None,
            environments: ["staging", "production"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            build_rewrite: true,
            round_robin: false,
            rename_query_strings: false,
            query_string: QueryStringConfig::default(),
            public_root: PathBuf::from("public"),
            command: CommandDefaults::default(),
            disks: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Derived values
// ---------------------------------------------------------------------------

impl CdnifyConfig {
    /// The configured origins in declaration order.
    pub fn origins(&self) -> Result<CdnOrigins, ConfigError> {
        let list = match &self.cdn {
            OriginsSpec::List(list) => list.clone(),
            OriginsSpec::Named(map) => map
                .iter()
                .map(|(name, url)| {
                    url.as_str().map(str::to_string).ok_or_else(|| {
                        ConfigError::InvalidOrigin {
                            name: name.as_str().unwrap_or("?").to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        CdnOrigins::new(list)
    }

    /// `app_env` (normally `$APP_ENV`) wins over the `environment` key;
    /// `production` when neither is set.
    pub fn current_environment(&self, app_env: Option<String>) -> Environment {
        app_env
            .filter(|e| !e.is_empty())
            .or_else(|| self.environment.clone())
            .map(Environment::from)
            .unwrap_or_else(|| Environment::from("production"))
    }

    pub fn active_environments(&self) -> BTreeSet<Environment> {
        self.environments
            .iter()
            .map(|e| Environment::from(e.as_str()))
            .collect()
    }

    /// Built-in plus configured disk names, sorted.
    pub fn disk_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = BUILTIN_DISKS.iter().map(|s| s.to_string()).collect();
        names.extend(self.disks.keys().cloned());
        names.into_iter().collect()
    }

    /// Resolve a disk name to its driver configuration.
    ///
    /// `local` works unconfigured; `s3` / `rackspace` need a `disks:` entry.
    pub fn disk(&self, name: &str) -> Result<DiskConfig, ConfigError> {
        if let Some(config) = self.disks.get(name) {
            return Ok(config.clone());
        }
        match name {
            "local" => Ok(DiskConfig::Local {
                root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            }),
            n if BUILTIN_DISKS.contains(&n) => Err(ConfigError::DiskNotConfigured {
                name: name.to_string(),
            }),
            _ => Err(ConfigError::UnknownDisk {
                name: name.to_string(),
                valid: self.disk_names().join(", "),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// `<root>/cdnify.yaml`. Pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load configuration from `path`.
///
/// A missing file yields [`CdnifyConfig::default`];
/// malformed YAML yields `ConfigError::Parse` with the path.
pub fn load_at(path: &Path) -> Result<CdnifyConfig, ConfigError> {
    if !path.exists() {
        return Ok(CdnifyConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(CdnifyConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `load_at(<root>/cdnify.yaml)` convenience wrapper.
pub fn load(root: &Path) -> Result<CdnifyConfig, ConfigError> {
    load_at(&config_path_at(root))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
