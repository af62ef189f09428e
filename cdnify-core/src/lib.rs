//! cdnify core library: domain types, configuration and errors.
//!
//! - [`types`]: newtypes, [`CdnOrigins`], [`BuildTool`]
//! - [`config`]: `cdnify.yaml` model and loader
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{CdnifyConfig, CommandDefaults, DiskConfig, QueryStringConfig};
pub use error::ConfigError;
pub use types::{BuildTool, CdnOrigins, Environment};
