//! [`PathDecorator`]: CDN prefixing, build rewrites and origin rotation.
//!
//! ## `resolve`: 4-step transform
//!
//! 1. Nothing staged → `None` (emit no URL).
//! 2. Build rewrite on → stamped path, then query-string rename if enabled.
//! 3. Current environment active → `resolve_origin()` + path.
//! 4. Otherwise the (possibly rewritten) path as is.
//!
//! Setters take `Option<T>`: `None` means "no override" and keeps the
//! current value. [`PathDecorator::get`] applies overrides for one call and
//! restores the previous settings on every exit path; the rotation cursor
//! is never restored.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use cdnify_core::{CdnOrigins, CdnifyConfig, ConfigError, Environment};

use crate::rename::rename_query_string_with;
use crate::rewrite::BuildRewrite;
use crate::rotation::RoundRobin;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Mutable toggles of a decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorSettings {
    pub environments: BTreeSet<Environment>,
    pub build_rewrite: bool,
    pub rename_query_strings: bool,
    pub round_robin: bool,
    pub query_key: String,
    pub query_separator: String,
}

impl DecoratorSettings {
    pub fn from_config(config: &CdnifyConfig) -> Self {
        Self {
            environments: config.active_environments(),
            build_rewrite: config.build_rewrite,
            rename_query_strings: config.rename_query_strings,
            round_robin: config.round_robin,
            query_key: config.query_string.key.clone(),
            query_separator: config.query_string.separator.clone(),
        }
    }
}

impl Default for DecoratorSettings {
    fn default() -> Self {
        Self::from_config(&CdnifyConfig::default())
    }
}

/// Per-call overrides for [`PathDecorator::get`].
///
/// A bare `bool` converts to "override `build_rewrite` only".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub build_rewrite: Option<bool>,
    pub environments: Option<BTreeSet<Environment>>,
    pub round_robin: Option<bool>,
}

impl From<bool> for Overrides {
    fn from(build_rewrite: bool) -> Self {
        Self {
            build_rewrite: Some(build_rewrite),
            ..Self::default()
        }
    }
}

impl From<Option<bool>> for Overrides {
    fn from(build_rewrite: Option<bool>) -> Self {
        Self {
            build_rewrite,
            ..Self::default()
        }
    }
}

/// The part of the settings `get` saves and restores.
#[derive(Debug)]
struct Snapshot {
    environments: BTreeSet<Environment>,
    build_rewrite: bool,
    round_robin: bool,
}

// ---------------------------------------------------------------------------
// PathDecorator
// ---------------------------------------------------------------------------

/// Decides how a static-asset path is emitted for the current environment.
#[derive(Debug)]
pub struct PathDecorator {
    origins: CdnOrigins,
    current: Environment,
    defaults: DecoratorSettings,
    settings: DecoratorSettings,
    rewrite: BuildRewrite,
    rotation: RoundRobin,
    path: Option<String>,
}

impl PathDecorator {
    pub fn new(
        origins: CdnOrigins,
        current: Environment,
        settings: DecoratorSettings,
        rewrite: BuildRewrite,
    ) -> Self {
        Self {
            origins,
            current,
            defaults: settings.clone(),
            settings,
            rewrite,
            rotation: RoundRobin::new(),
            path: None,
        }
    }

    /// Seed origins and toggles from configuration.
    pub fn from_config(
        config: &CdnifyConfig,
        current: Environment,
        rewrite: BuildRewrite,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.origins()?,
            current,
            DecoratorSettings::from_config(config),
            rewrite,
        ))
    }

    /// Decorator for the upload side: query-string settings from `config`,
    /// no active environment and no build rewrite, so CDN origins are not
    /// needed.
    pub fn for_uploads(config: &CdnifyConfig) -> Self {
        let settings = DecoratorSettings {
            environments: BTreeSet::new(),
            build_rewrite: false,
            ..DecoratorSettings::from_config(config)
        };
        Self::new(
            CdnOrigins::same_origin(),
            config.current_environment(None),
            settings,
            BuildRewrite::None,
        )
    }

    // -- configuration ------------------------------------------------------

    pub fn settings(&self) -> &DecoratorSettings {
        &self.settings
    }

    pub fn environment(&self) -> &Environment {
        &self.current
    }

    pub fn staged_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Reset toggles and environments to the values the decorator was built with.
    pub fn defaults(&mut self) -> &mut Self {
        self.settings = self.defaults.clone();
        self
    }

    pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    pub fn set_environments(&mut self, environments: Option<BTreeSet<Environment>>) -> &mut Self {
        if let Some(environments) = environments {
            self.settings.environments = environments;
        }
        self
    }

    pub fn set_build_rewrite(&mut self, enabled: Option<bool>) -> &mut Self {
        if let Some(enabled) = enabled {
            self.settings.build_rewrite = enabled;
        }
        self
    }

    pub fn set_round_robin(&mut self, enabled: Option<bool>) -> &mut Self {
        if let Some(enabled) = enabled {
            self.settings.round_robin = enabled;
        }
        self
    }

    pub fn set_rename_query_strings(&mut self, enabled: Option<bool>) -> &mut Self {
        if let Some(enabled) = enabled {
            self.settings.rename_query_strings = enabled;
        }
        self
    }

    // -- resolution ---------------------------------------------------------

    /// Origin for the next resolution. Advances the rotation when round robin is on.
    pub fn resolve_origin(&self) -> &str {
        if !self.settings.round_robin {
            return self.origins.first();
        }
        let index = self.rotation.advance(self.origins.len());
        tracing::trace!("round robin origin #{index}");
        self.origins.get(index)
    }

    /// Transform the staged path; `None` when nothing is staged.
    pub fn resolve(&self) -> Option<String> {
        let staged = self.path.as_deref().filter(|p| !p.is_empty())?;

        let mut path = staged.to_string();
        if self.settings.build_rewrite {
            path = self.rewrite.rewrite(&path);
            if self.settings.rename_query_strings {
                path = self.rename_query_string(&path);
            }
        }

        if self.settings.environments.contains(&self.current) {
            return Some(join_origin(self.resolve_origin(), &path));
        }
        Some(path)
    }

    /// Resolve `path` with one-off overrides; settings are restored afterwards.
    pub fn get(
        &mut self,
        path: impl Into<String>,
        overrides: impl Into<Overrides>,
    ) -> Option<String> {
        let path = path.into();
        self.with_overrides(overrides, |decorator| decorator.set_path(path).resolve())
    }

    /// Run `f` with `overrides` applied, restoring the saved settings when
    /// `f` returns or unwinds.
    pub fn with_overrides<R>(
        &mut self,
        overrides: impl Into<Overrides>,
        f: impl FnOnce(&mut PathDecorator) -> R,
    ) -> R {
        let overrides = overrides.into();
        let mut scope = self.scoped();
        scope
            .set_build_rewrite(overrides.build_rewrite)
            .set_environments(overrides.environments)
            .set_round_robin(overrides.round_robin);
        f(&mut *scope)
    }

    /// Query-string rename using the configured key and separator.
    pub fn rename_query_string(&self, path: &str) -> String {
        rename_query_string_with(
            path,
            &self.settings.query_key,
            &self.settings.query_separator,
        )
    }

    fn scoped(&mut self) -> ScopedSettings<'_> {
        let saved = Snapshot {
            environments: self.settings.environments.clone(),
            build_rewrite: self.settings.build_rewrite,
            round_robin: self.settings.round_robin,
        };
        ScopedSettings {
            decorator: self,
            saved: Some(saved),
        }
    }
}

/// `origin + path` without doubling the slash between them.
fn join_origin(origin: &str, path: &str) -> String {
    if origin.ends_with('/') && path.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), path)
    } else {
        format!("{origin}{path}")
    }
}

// ---------------------------------------------------------------------------
// Scoped restore
// ---------------------------------------------------------------------------

/// Restores the saved settings on drop.
struct ScopedSettings<'a> {
    decorator: &'a mut PathDecorator,
    saved: Option<Snapshot>,
}

impl Deref for ScopedSettings<'_> {
    type Target = PathDecorator;

    fn deref(&self) -> &PathDecorator {
        self.decorator
    }
}

impl DerefMut for ScopedSettings<'_> {
    fn deref_mut(&mut self) -> &mut PathDecorator {
        self.decorator
    }
}

impl Drop for ScopedSettings<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            let settings = &mut self.decorator.settings;
            settings.environments = saved.environments;
            settings.build_rewrite = saved.build_rewrite;
            settings.round_robin = saved.round_robin;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::RewriteManifest;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn envs(names: &[&str]) -> BTreeSet<Environment> {
        names.iter().map(|n| Environment::from(*n)).collect()
    }

    fn decorator(current: &str, origins: &[&str]) -> PathDecorator {
        let origins =
            CdnOrigins::new(origins.iter().map(|o| o.to_string()).collect()).expect("origins");
        let settings = DecoratorSettings {
            build_rewrite: false,
            ..DecoratorSettings::default()
        };
        PathDecorator::new(origins, Environment::from(current), settings, BuildRewrite::None)
    }

    #[test]
    fn resolve_without_staged_path_is_none() {
        let d = decorator("production", &["https://cdn.example.com"]);
        assert_eq!(d.resolve(), None);
    }

    #[test]
    fn resolve_with_empty_path_is_none() {
        let mut d = decorator("production", &["https://cdn.example.com"]);
        assert_eq!(d.set_path("").resolve(), None);
    }

    #[test]
    fn active_environment_gets_prefixed() {
        let mut d = decorator("production", &["https://cdn.example.com"]);
        assert_eq!(
            d.set_path("/app.js").resolve().as_deref(),
            Some("https://cdn.example.com/app.js")
        );
    }

    #[test]
    fn inactive_environment_is_left_alone() {
        let mut d = decorator("development", &["https://cdn.example.com"]);
        assert_eq!(d.set_path("/app.js").resolve().as_deref(), Some("/app.js"));
    }

    #[test]
    fn origin_trailing_slash_is_not_doubled() {
        let mut d = decorator("production", &["https://cdn.example.com/"]);
        assert_eq!(
            d.set_path("/app.js").resolve().as_deref(),
            Some("https://cdn.example.com/app.js")
        );
    }

    #[test]
    fn round_robin_off_always_uses_first_origin() {
        let d = decorator("production", &["https://a", "https://b", "https://c"]);
        assert!((0..10).all(|_| d.resolve_origin() == "https://a"));
    }

    #[test]
    fn round_robin_cycles_in_order() {
        let mut d = decorator("production", &["https://a", "https://b", "https://c"]);
        d.set_round_robin(Some(true));
        let seen: Vec<_> = (0..4).map(|_| d.resolve_origin().to_string()).collect();
        assert_eq!(seen, ["https://a", "https://b", "https://c", "https://a"]);
    }

    #[test]
    fn none_overrides_keep_prior_values() {
        let mut d = decorator("production", &["https://a"]);
        let before = d.settings().clone();
        d.set_environments(None)
            .set_build_rewrite(None)
            .set_round_robin(None)
            .set_rename_query_strings(None);
        assert_eq!(d.settings(), &before);
    }

    #[test]
    fn defaults_resets_toggles() {
        let mut d = decorator("production", &["https://a"]);
        let built = d.settings().clone();
        d.set_round_robin(Some(true))
            .set_environments(Some(envs(&["qa"])))
            .defaults();
        assert_eq!(d.settings(), &built);
    }

    #[test]
    fn get_applies_overrides_then_restores() {
        let mut d = decorator("development", &["https://cdn.example.com"]);
        let before = d.settings().clone();

        let overrides = Overrides {
            environments: Some(envs(&["development"])),
            round_robin: Some(true),
            build_rewrite: Some(true),
        };
        assert_eq!(
            d.get("/app.js", overrides).as_deref(),
            Some("https://cdn.example.com/app.js")
        );
        assert_eq!(d.settings(), &before);
        assert_eq!(d.set_path("/app.js").resolve().as_deref(), Some("/app.js"));
    }

    #[test]
    fn get_restores_when_result_is_none() {
        let mut d = decorator("production", &["https://a"]);
        let before = d.settings().clone();
        assert_eq!(d.get("", true), None);
        assert_eq!(d.settings(), &before);
    }

    #[test]
    fn with_overrides_restores_after_panic() {
        let mut d = decorator("production", &["https://a"]);
        let before = d.settings().clone();

        let result = catch_unwind(AssertUnwindSafe(|| {
            d.with_overrides(Overrides::from(true), |inner| {
                assert!(inner.settings().build_rewrite);
                panic!("resolution blew up");
            })
        }));
        assert!(result.is_err());
        assert_eq!(d.settings(), &before);
    }

    #[test]
    fn get_does_not_restore_rotation() {
        let mut d = decorator("production", &["https://a", "https://b"]);
        let rr = Overrides {
            round_robin: Some(true),
            ..Overrides::default()
        };
        assert_eq!(d.get("/x.js", rr.clone()).as_deref(), Some("https://a/x.js"));
        assert_eq!(d.get("/x.js", rr).as_deref(), Some("https://b/x.js"));
        assert!(!d.settings().round_robin);
    }

    #[test]
    fn bool_shorthand_overrides_build_rewrite_only() {
        let overrides = Overrides::from(false);
        assert_eq!(overrides.build_rewrite, Some(false));
        assert!(overrides.environments.is_none());
        assert!(overrides.round_robin.is_none());
    }

    #[test]
    fn upload_decorator_needs_no_origins() {
        let mut config = CdnifyConfig::default();
        config.query_string.key = "v".to_string();
        config.query_string.separator = ".".to_string();
        assert!(config.origins().is_err());

        let mut d = PathDecorator::for_uploads(&config);
        assert_eq!(d.rename_query_string("/js/app.js?v=9"), "/js/app.9.js");
        assert_eq!(d.set_path("/js/app.js").resolve().as_deref(), Some("/js/app.js"));
    }

    #[test]
    fn build_rewrite_then_rename() {
        let origins = CdnOrigins::new(vec!["https://cdn.example.com".to_string()]).unwrap();
        let rewrite = BuildRewrite::Modern(RewriteManifest::from_entries([(
            "/js/app.js",
            "/js/app.js?id=5f3a",
        )]));
        let settings = DecoratorSettings {
            rename_query_strings: true,
            ..DecoratorSettings::default()
        };
        let mut d = PathDecorator::new(origins, Environment::from("staging"), settings, rewrite);

        assert_eq!(
            d.set_path("js/app.js").resolve().as_deref(),
            Some("https://cdn.example.com/js/app-5f3a.js")
        );
        d.set_rename_query_strings(Some(false));
        assert_eq!(
            d.resolve().as_deref(),
            Some("https://cdn.example.com/js/app.js?id=5f3a")
        );
        assert_eq!(
            d.get("/js/app.js", false).as_deref(),
            Some("https://cdn.example.com/js/app.js")
        );
    }
}
