//! # cdnify-decorator
//!
//! Decides how static-asset paths are emitted: rewritten through the build
//! tool's manifest, renamed from `?id=` to file-name versioning, and prefixed
//! with a (possibly rotating) CDN origin in the environments that want one.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cdnify_core::{CdnifyConfig, Environment};
//! use cdnify_decorator::{BuildRewrite, PathDecorator};
//!
//! fn script_tag(config: &CdnifyConfig) -> Option<String> {
//!     let rewrite = BuildRewrite::detect(&config.public_root).ok()?;
//!     let env = Environment::from("production");
//!     let mut cdn = PathDecorator::from_config(config, env, rewrite).ok()?;
//!     let src = cdn.get("/js/app.js", true)?;
//!     Some(format!(r#"<script src="{src}"></script>"#))
//! }
//! ```

pub mod decorator;
pub mod error;
pub mod rename;
pub mod rewrite;
pub mod rotation;

pub use decorator::{DecoratorSettings, Overrides, PathDecorator};
pub use error::RewriteError;
pub use rename::{collapse_slashes, rename_query_string, rename_query_string_with, strip_query};
pub use rewrite::{BuildRewrite, RewriteManifest};
pub use rotation::RoundRobin;
