//! Layered configuration
//!
//! Values are resolved in this order (highest priority wins):
//!
//! 1. **Code / CLI flags** - set on the struct after loading
//! 2. **Environment variables** - `ROLEGATE_*`
//! 3. **Config file** - `rolegate.toml`
//! 4. **Defaults**
//!
//! ```no_run
//! use rolegate_core::config::RolegateConfig;
//!
//! let config = RolegateConfig::load()?;
//! config.validate()?;
//! let routes = config.route_map()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod callback;
pub mod resolver;
pub mod routes;
pub mod session;

pub use crate::logging::LoggingConfig;
pub use callback::CallbackConfig;
pub use resolver::ResolverConfig;
pub use routes::RoutesConfig;
pub use session::SessionConfig;

use crate::rbac::RouteMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "rolegate.toml";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolegateConfig {
    pub session: SessionConfig,
    pub callback: CallbackConfig,
    pub resolver: ResolverConfig,
    pub routes: RoutesConfig,
    pub logging: LoggingConfig,
}

impl RolegateConfig {
    /// Load defaults, `rolegate.toml` if present, then the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`load`](Self::load) with an explicit file
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        } else {
            log::debug!("No config file at {}; using defaults", path.display());
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Parse a TOML file; sections and keys left out keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.session.merge(other.session);
        self.callback.merge(other.callback);
        self.resolver.merge(other.resolver);
        self.routes.merge(other.routes);
        self.logging.merge(other.logging);
    }

    pub fn apply_env_vars(&mut self) {
        self.session.apply_env_vars();
        self.callback.apply_env_vars();
        self.resolver.apply_env_vars();
        self.routes.apply_env_vars();
        self.logging.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        self.callback.validate()?;
        self.resolver.validate()?;
        self.routes.validate()?;
        self.logging.validate()?;

        let routes = self.route_map()?;
        for (name, path) in [
            ("callback.route", &self.callback.route),
            ("callback.dashboard_entry", &self.callback.dashboard_entry),
            ("callback.login_route", &self.callback.login_route),
        ] {
            if let Some(owner) = routes.owner_of(path) {
                anyhow::bail!("Invalid {}: {} lies inside the {} namespace", name, path, owner);
            }
        }

        Ok(())
    }

    /// Validated role → namespace table
    pub fn route_map(&self) -> Result<RouteMap> {
        self.routes.route_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};
    use crate::rbac::Role;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = RolegateConfig::default();
        assert_eq!(config.callback.route, "/auth/callback");
        assert_eq!(config.callback.success_delay_ms, 1500);
        assert_eq!(config.callback.error_delay_ms, 3000);
        assert_eq!(config.resolver.timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.route_map().unwrap(), RouteMap::standard());
    }

    #[test]
    fn test_config_validation() {
        assert!(RolegateConfig::default().validate().is_ok());

        let mut config = RolegateConfig::default();
        config.resolver.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RolegateConfig::default();
        config.callback.login_route = "login".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_login_inside_role_namespace_rejected() {
        let mut config = RolegateConfig::default();
        config.callback.login_route = "/admin/login".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ADMIN"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolegate.toml");
        std::fs::write(
            &path,
            r#"
[callback]
success_delay_ms = 10

[routes]
mitra = "/partners"

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = RolegateConfig::from_file(&path).unwrap();
        assert_eq!(config.callback.success_delay_ms, 10);
        assert_eq!(config.callback.error_delay_ms, 3000);
        assert_eq!(config.callback.login_route, "/login");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.route_map().unwrap().prefix(Role::Mitra), Some("/partners"));
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RolegateConfig::from_file(dir.path().join("absent.toml"));
        assert!(config.is_err());

        let loaded = RolegateConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.callback, CallbackConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolegate.toml");
        std::fs::write(&path, "[callback\nroute = 1").unwrap();
        assert!(RolegateConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_invalid_routes_fail_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolegate.toml");
        std::fs::write(&path, "[routes]\nmahasiswa = \"/admin\"\n").unwrap();

        let config = RolegateConfig::load_from(&path).unwrap();
        assert!(config.route_map().is_err());
        assert!(config.validate().is_err());
    }
}
