//! Role lookup configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// `[resolver]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Role lookup URL, called with the session's bearer token
    /// Env: ROLEGATE_RESOLVER_ENDPOINT
    /// Default: "http://127.0.0.1:8081/api/auth/role"
    pub endpoint: String,

    /// Upper bound on one lookup, in milliseconds
    /// Env: ROLEGATE_RESOLVER_TIMEOUT_MS
    /// Default: 10000
    pub timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { endpoint: "http://127.0.0.1:8081/api/auth/role".to_string(), timeout_ms: 10_000 }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn merge(&mut self, other: Self) {
        self.endpoint = other.endpoint;
        self.timeout_ms = other.timeout_ms;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(endpoint) = env::var("ROLEGATE_RESOLVER_ENDPOINT") {
            self.endpoint = endpoint;
        }

        if let Ok(timeout) = env::var("ROLEGATE_RESOLVER_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.timeout_ms = t;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            bail!("Invalid resolver.endpoint: {:?} must be an http(s) URL", self.endpoint);
        }

        if self.timeout_ms == 0 {
            bail!("Invalid resolver.timeout_ms: must be greater than 0");
        }

        Ok(())
    }
}
