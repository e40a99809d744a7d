//! Callback route configuration

use crate::callback::CallbackSettings;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// `[callback]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// Path the identity provider redirects back to
    /// Env: ROLEGATE_CALLBACK_ROUTE
    /// Default: "/auth/callback"
    pub route: String,

    /// Delay before leaving a successful callback, in milliseconds
    /// Env: ROLEGATE_CALLBACK_SUCCESS_DELAY_MS
    /// Default: 1500
    pub success_delay_ms: u64,

    /// Delay before leaving a failed callback, in milliseconds
    /// Env: ROLEGATE_CALLBACK_ERROR_DELAY_MS
    /// Default: 3000
    pub error_delay_ms: u64,

    /// Generic entry route that forwards to the role's namespace
    /// Env: ROLEGATE_DASHBOARD_ENTRY
    /// Default: "/dashboard"
    pub dashboard_entry: String,

    /// Login route; failures append `?error=<code>`
    /// Env: ROLEGATE_LOGIN_ROUTE
    /// Default: "/login"
    pub login_route: String,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        let settings = CallbackSettings::default();
        Self {
            route: "/auth/callback".to_string(),
            success_delay_ms: settings.success_delay.as_millis() as u64,
            error_delay_ms: settings.error_delay.as_millis() as u64,
            dashboard_entry: settings.dashboard_entry,
            login_route: settings.login_route,
        }
    }
}

impl CallbackConfig {
    pub fn settings(&self) -> CallbackSettings {
        CallbackSettings {
            success_delay: Duration::from_millis(self.success_delay_ms),
            error_delay: Duration::from_millis(self.error_delay_ms),
            dashboard_entry: self.dashboard_entry.clone(),
            login_route: self.login_route.clone(),
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.route = other.route;
        self.success_delay_ms = other.success_delay_ms;
        self.error_delay_ms = other.error_delay_ms;
        self.dashboard_entry = other.dashboard_entry;
        self.login_route = other.login_route;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(route) = env::var("ROLEGATE_CALLBACK_ROUTE") {
            self.route = route;
        }

        if let Ok(delay) = env::var("ROLEGATE_CALLBACK_SUCCESS_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                self.success_delay_ms = d;
            }
        }

        if let Ok(delay) = env::var("ROLEGATE_CALLBACK_ERROR_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                self.error_delay_ms = d;
            }
        }

        if let Ok(entry) = env::var("ROLEGATE_DASHBOARD_ENTRY") {
            self.dashboard_entry = entry;
        }

        if let Ok(login) = env::var("ROLEGATE_LOGIN_ROUTE") {
            self.login_route = login;
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("route", &self.route),
            ("dashboard_entry", &self.dashboard_entry),
            ("login_route", &self.login_route),
        ] {
            if !value.starts_with('/') {
                bail!("Invalid callback.{}: {:?} must be an absolute path", name, value);
            }
            if value.contains(['?', '#']) {
                bail!("Invalid callback.{}: {:?} must not carry a query or fragment", name, value);
            }
        }

        if self.route == self.dashboard_entry || self.route == self.login_route {
            bail!("Invalid callback.route: must differ from the dashboard and login routes");
        }

        Ok(())
    }
}
