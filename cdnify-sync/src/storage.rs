//! Storage disks that stamped assets are uploaded to.
//!
//! ## `LocalDisk::put`: atomic write
//!
//! 1. Reject keys that climb out of the root (`..`).
//! 2. Create the parent directory.
//! 3. Write to `<path>.cdnify.tmp`.
//! 4. Rename to the final path (atomic on POSIX); remove the tmp on failure.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use cdnify_core::{CdnifyConfig, ConfigError, DiskConfig};

use crate::error::{storage_io_err, StorageError};

/// A named blob store.
pub trait Disk {
    /// Name the disk was selected by (`local`, `s3`, ...).
    fn name(&self) -> &str;

    fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Store `bytes` under `key`; `Ok(false)` means the backend refused the write.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<bool, StorageError>;
}

/// Open the disk called `name`, resolving relative local roots against `project_root`.
pub fn open(
    config: &CdnifyConfig,
    name: &str,
    project_root: &Path,
) -> Result<Box<dyn Disk>, ConfigError> {
    let disk: Box<dyn Disk> = match config.disk(name)? {
        DiskConfig::Local { root } => Box::new(LocalDisk::new(name, project_root.join(root))),
        DiskConfig::Http {
            endpoint,
            headers,
            timeout_secs,
        } => Box::new(HttpDisk::new(
            name,
            endpoint,
            headers,
            Duration::from_secs(timeout_secs),
        )),
    };
    Ok(disk)
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

/// Objects stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    name: String,
    root: PathBuf,
}

impl LocalDisk {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `None` for keys containing `..` or a root component.
    fn key_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl Disk for LocalDisk {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.key_path(key).is_some_and(|p| p.is_file()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<bool, StorageError> {
        let Some(path) = self.key_path(key) else {
            tracing::info!("refusing key outside disk root: {key}");
            return Ok(false);
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| storage_io_err(parent, e))?;
        }

        let tmp = PathBuf::from(format!("{}.cdnify.tmp", path.display()));
        std::fs::write(&tmp, bytes).map_err(|e| storage_io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(storage_io_err(&path, e));
        }
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// HTTP object store
// ---------------------------------------------------------------------------

/// S3-compatible REST endpoint: `HEAD` for existence, `PUT` for writes.
#[derive(Debug)]
pub struct HttpDisk {
    name: String,
    endpoint: String,
    headers: BTreeMap<String, String>,
    agent: ureq::Agent,
}

impl HttpDisk {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        headers: BTreeMap<String, String>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            headers,
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }

    fn request(&self, method: &str, key: &str) -> ureq::Request {
        self.headers
            .iter()
            .fold(self.agent.request(method, &self.url(key)), |req, (k, v)| {
                req.set(k, v)
            })
    }
}

impl Disk for HttpDisk {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.request("HEAD", key).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(ureq::Error::Status(code, _)) => Err(StorageError::Http {
                key: key.to_string(),
                message: format!("HEAD returned status {code}"),
            }),
            Err(ureq::Error::Transport(t)) => Err(StorageError::Http {
                key: key.to_string(),
                message: t.to_string(),
            }),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<bool, StorageError> {
        let request = self
            .request("PUT", key)
            .set("Content-Type", content_type(key));
        match request.send_bytes(bytes) {
            Ok(response) => Ok((200..300).contains(&response.status())),
            Err(ureq::Error::Status(code, _)) => {
                tracing::info!("PUT {key} returned status {code}");
                Ok(false)
            }
            Err(ureq::Error::Transport(t)) => Err(StorageError::Http {
                key: key.to_string(),
                message: t.to_string(),
            }),
        }
    }
}

/// MIME type for common web assets, by extension.
fn content_type(key: &str) -> &'static str {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "js" | "mjs" => "application/javascript",
        "css" => "text/css",
        "json" | "map" => "application/json",
        "html" | "htm" => "text/html",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
