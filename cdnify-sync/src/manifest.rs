//! Upload manifest: the bundler's logical → stamped asset map.
//!
//! Read from `<public root><manifest path>`. Entry order is the file's own
//! key order. A missing file is an empty manifest.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{io_err, SyncError};

/// Ordered logical-name → build-stamped-name entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, String)>,
}

impl Manifest {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `<public_root>/<relative>`; a leading `/` on `relative` is ignored.
pub fn manifest_path_at(public_root: &Path, relative: &str) -> PathBuf {
    public_root.join(relative.trim_start_matches('/'))
}

/// Load the manifest at `<public_root><relative>`.
///
/// Returns an empty manifest if the file does not exist.
pub fn load_at(public_root: &Path, relative: &str) -> Result<Manifest, SyncError> {
    let path = manifest_path_at(public_root, relative);
    if !path.exists() {
        tracing::debug!("no manifest at {}; nothing to upload", path.display());
        return Ok(Manifest::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    parse(&path, &contents)
}

fn parse(path: &Path, contents: &str) -> Result<Manifest, SyncError> {
    let object: Map<String, Value> =
        serde_json::from_str(contents).map_err(|source| SyncError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut entries = Vec::with_capacity(object.len());
    for (key, value) in object {
        let Value::String(stamped) = value else {
            return Err(SyncError::ManifestEntry {
                path: path.to_path_buf(),
                key,
            });
        };
        entries.push((key, stamped));
    }
    Ok(Manifest { entries })
}
