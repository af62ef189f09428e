//! Build-tool rewrite capability.
//!
//! The build tool writes a manifest mapping logical asset paths to their
//! version-stamped form. Which flavour is present is decided once, at
//! startup, by [`BuildRewrite::detect`]:
//!
//! | Variant  | Manifest                          | Key        | Result                 |
//! |----------|-----------------------------------|------------|------------------------|
//! | `Modern` | `<public>/mix-manifest.json`      | `/js/a.js` | value as written       |
//! | `Legacy` | `<public>/build/rev-manifest.json`| `js/a.js`  | `/build/` + value      |
//! | `None`   | none                              | any        | path unchanged         |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::RewriteError;

pub const MODERN_MANIFEST: &str = "mix-manifest.json";
pub const LEGACY_MANIFEST: &str = "build/rev-manifest.json";
const LEGACY_BUILD_DIR: &str = "build";

/// A loaded logical → stamped path table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteManifest {
    entries: HashMap<String, String>,
}

impl RewriteManifest {
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

    /// Read a flat JSON object of strings from `path`.
    pub fn load_at(path: &Path) -> Result<Self, RewriteError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RewriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = serde_json::from_str(&contents).map_err(|source| RewriteError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { entries })
    }

    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which build-tool rewrite is available, selected at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BuildRewrite {
    Modern(RewriteManifest),
    Legacy(RewriteManifest),
    #[default]
    None,
}

impl BuildRewrite {
    /// Probe `public_root` for a modern manifest first, then a legacy one.
    pub fn detect(public_root: &Path) -> Result<Self, RewriteError> {
        let modern = public_root.join(MODERN_MANIFEST);
        if modern.is_file() {
            tracing::debug!("build rewrite: modern manifest at {}", modern.display());
            return Ok(Self::Modern(RewriteManifest::load_at(&modern)?));
        }
        let legacy = public_root.join(LEGACY_MANIFEST);
        if legacy.is_file() {
            tracing::debug!("build rewrite: legacy manifest at {}", legacy.display());
            return Ok(Self::Legacy(RewriteManifest::load_at(&legacy)?));
        }
        tracing::debug!("build rewrite: no manifest under {}", public_root.display());
        Ok(Self::None)
    }

    /// Manifest file the variant reads, relative to the public root.
    pub fn manifest_file(&self) -> Option<PathBuf> {
        match self {
            Self::Modern(_) => Some(PathBuf::from(MODERN_MANIFEST)),
            Self::Legacy(_) => Some(PathBuf::from(LEGACY_MANIFEST)),
            Self::None => None,
        }
    }

    /// Map a logical path to its stamped form.
    ///
    /// Paths missing from the manifest are returned unchanged.
    pub fn rewrite(&self, path: &str) -> String {
        let rewritten = match self {
            Self::None => return path.to_string(),
            Self::Modern(manifest) => {
                let key = format!("/{}", path.trim_start_matches('/'));
                manifest.get(&key).map(|stamped| {
                    if stamped.starts_with('/') {
                        stamped.to_string()
                    } else {
                        format!("/{stamped}")
                    }
                })
            }
            Self::Legacy(manifest) => manifest
                .get(path.trim_start_matches('/'))
                .map(|stamped| {
                    format!(
                        "/{}/{}",
                        LEGACY_BUILD_DIR,
                        stamped.trim_start_matches('/')
                    )
                }),
        };
        rewritten.unwrap_or_else(|| {
            tracing::warn!("asset '{path}' is not in the build manifest; left unchanged");
            path.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detect_prefers_modern_manifest() {
        let public = TempDir::new().unwrap();
        fs::create_dir_all(public.path().join("build")).unwrap();
        fs::write(public.path().join(MODERN_MANIFEST), r#"{"/js/app.js":"/js/app.js?id=1"}"#)
            .unwrap();
        fs::write(public.path().join(LEGACY_MANIFEST), r#"{"js/app.js":"js/app-1.js"}"#).unwrap();

        let rewrite = BuildRewrite::detect(public.path()).unwrap();
        assert!(matches!(rewrite, BuildRewrite::Modern(_)));
        assert_eq!(rewrite.rewrite("js/app.js"), "/js/app.js?id=1");
    }

    #[test]
    fn detect_falls_back_to_legacy_manifest() {
        let public = TempDir::new().unwrap();
        fs::create_dir_all(public.path().join("build")).unwrap();
        fs::write(public.path().join(LEGACY_MANIFEST), r#"{"css/app.css":"css/app-9f2.css"}"#)
            .unwrap();

        let rewrite = BuildRewrite::detect(public.path()).unwrap();
        assert!(matches!(rewrite, BuildRewrite::Legacy(_)));
        assert_eq!(rewrite.rewrite("/css/app.css"), "/build/css/app-9f2.css");
    }

    #[test]
    fn detect_none_without_manifests() {
        let public = TempDir::new().unwrap();
        let rewrite = BuildRewrite::detect(public.path()).unwrap();
        assert_eq!(rewrite, BuildRewrite::None);
        assert_eq!(rewrite.rewrite("/js/app.js"), "/js/app.js");
        assert!(rewrite.manifest_file().is_none());
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let public = TempDir::new().unwrap();
        fs::write(public.path().join(MODERN_MANIFEST), "{not json").unwrap();
        let err = BuildRewrite::detect(public.path()).unwrap_err();
        assert!(matches!(err, RewriteError::Parse { .. }));
        assert!(err.to_string().contains(MODERN_MANIFEST));
    }

    #[test]
    fn unknown_asset_is_left_unchanged() {
        let rewrite = BuildRewrite::Modern(RewriteManifest::from_entries([(
            "/js/app.js",
            "/js/app.js?id=1",
        )]));
        assert_eq!(rewrite.rewrite("/img/logo.png"), "/img/logo.png");
    }
}
