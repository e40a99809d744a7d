//! Session persistence configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// `[session]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the persisted session slot
    /// Env: ROLEGATE_SESSION_STORE_PATH
    /// Default: ".rolegate/session.json"
    pub store_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { store_path: PathBuf::from(".rolegate/session.json") }
    }
}

impl SessionConfig {
    pub fn merge(&mut self, other: Self) {
        self.store_path = other.store_path;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(path) = env::var("ROLEGATE_SESSION_STORE_PATH") {
            self.store_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_path.as_os_str().is_empty() {
            bail!("Invalid session.store_path: must not be empty");
        }
        if self.store_path.is_dir() {
            bail!("Invalid session.store_path: {} is a directory", self.store_path.display());
        }
        Ok(())
    }
}
