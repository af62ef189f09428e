//! Query-string → file-name versioning.
//!
//! `app.js?id=abcdef` becomes `app-abcdef.js`. The extension is whatever
//! follows the **last** dot of the final path segment, so `app.min.js?id=x`
//! becomes `app.min-x.js`. A file with no dot (or only a leading one, like
//! `.htaccess`) has no extension and the hash is appended to the name.
//!
//! The query string and fragment are always dropped. Input that cannot be
//! parsed as a URL is returned unchanged. Paths come out the way `url`
//! serialises them (percent-encoded, dot segments resolved) whether the
//! input was absolute or relative.

use url::{form_urlencoded, Position, Url};

/// Base used to validate relative paths; never appears in output.
const PARSE_BASE: &str = "http://cdnify.invalid/";

/// Rename with the default `id` key and `-` separator.
pub fn rename_query_string(path: &str) -> String {
    rename_query_string_with(path, "id", "-")
}

/// Move the value of query parameter `key` into the file name, joined by `separator`.
pub fn rename_query_string_with(path: &str, key: &str, separator: &str) -> String {
    let Some(parts) = UrlParts::parse(path, key) else {
        return path.to_string();
    };

    let (dir, stem, ext) = split_file_name(&parts.path);
    let mut name = stem.to_string();
    if let Some(hash) = parts.hash.as_deref() {
        name.push_str(separator);
        name.push_str(hash);
    }
    if let Some(ext) = ext {
        name.push('.');
        name.push_str(ext);
    }

    let renamed = match dir {
        Some(dir) => collapse_slashes(&format!("{dir}/{name}")),
        None => name,
    };
    format!("{}{}", parts.prefix, renamed)
}

/// The path portion of `path`: query string and fragment removed.
pub fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Collapse runs of `/` into a single `/`.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }
    out
}

struct UrlParts {
    /// `scheme://authority` for absolute URLs, `//authority` for
    /// protocol-relative ones, empty for paths.
    prefix: String,
    path: String,
    hash: Option<String>,
}

impl UrlParts {
    fn parse(input: &str, key: &str) -> Option<Self> {
        match Url::parse(input) {
            Ok(url) if url.has_host() => Some(Self {
                prefix: url[..Position::BeforePath].to_string(),
                path: url.path().to_string(),
                hash: query_value(&url, key),
            }),
            // `mailto:`, `data:` and friends have no file name to rename.
            Ok(_) => None,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let joined = Url::parse(PARSE_BASE).ok()?.join(input).ok()?;
                let (prefix, path) = if input.starts_with("//") && joined.has_host() {
                    let authority = &joined[Position::BeforeUsername..Position::BeforePath];
                    (format!("//{authority}"), joined.path())
                } else if input.starts_with('/') {
                    (String::new(), joined.path())
                } else {
                    let path = joined.path();
                    (String::new(), path.strip_prefix('/').unwrap_or(path))
                };
                Some(Self {
                    prefix,
                    path: path.to_string(),
                    hash: query_value(&joined, key),
                })
            }
            Err(_) => None,
        }
    }
}

/// Value of `key`, re-encoded so it is safe as part of a file name.
fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .filter(|(_, v)| !v.is_empty())
        .map(|(_, v)| form_urlencoded::byte_serialize(v.as_bytes()).collect())
}

/// `(directory, stem, extension)`; directory is `None` when the path has no `/`.
fn split_file_name(path: &str) -> (Option<&str>, &str, Option<&str>) {
    let (dir, file) = match path.rfind('/') {
        Some(i) => (Some(&path[..i]), &path[i + 1..]),
        None => (None, path),
    };
    match file.rfind('.') {
        Some(i) if i > 0 => (dir, &file[..i], Some(&file[i + 1..])),
        _ => (dir, file, None),
    }
}
