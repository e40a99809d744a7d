//! Logging configuration

use super::LogFormat;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// `[logging]` section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level to emit
    /// Env: ROLEGATE_LOG_LEVEL
    /// Default: info
    pub level: LogLevel,

    /// Line format
    /// Env: ROLEGATE_LOG_FORMAT
    /// Default: human
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: LogLevel::Info, format: LogFormat::Human }
    }
}

/// Log levels in order of severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl LoggingConfig {
    /// Verbose human-readable output for local runs
    pub fn development() -> Self {
        Self { level: LogLevel::Debug, format: LogFormat::Human }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn merge(&mut self, other: Self) {
        self.level = other.level;
        self.format = other.format;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("ROLEGATE_LOG_LEVEL") {
            match level.parse() {
                Ok(level) => self.level = level,
                Err(e) => log::warn!("Ignoring ROLEGATE_LOG_LEVEL: {}", e),
            }
        }

        if let Ok(format) = env::var("ROLEGATE_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => log::warn!("Ignoring ROLEGATE_LOG_FORMAT: {}", e),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}
