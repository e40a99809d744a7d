//! Log line formatting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One log event, detached from the `log::Record` lifetime
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub level: log::Level,
    pub target: String,
    pub message: String,
}

impl LogLine {
    pub fn from_record(record: &log::Record) -> Self {
        Self {
            timestamp: Utc::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        }
    }
}

/// How log lines are rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Example: 2024-01-15 10:30:00.000 INFO  [rolegate_core::session] Session persisted
    #[default]
    Human,
    /// Example: {"timestamp":"2024-01-15T10:30:00Z","level":"INFO","target":"...","message":"..."}
    Json,
    /// Example: timestamp=2024-01-15T10:30:00Z level=INFO target=... message="..."
    Logfmt,
}

impl LogFormat {
    pub fn format_line(&self, line: &LogLine) -> String {
        match self {
            LogFormat::Human => format_human(line),
            LogFormat::Json => format_json(line),
            LogFormat::Logfmt => format_logfmt(line),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Json => "json",
            LogFormat::Logfmt => "logfmt",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            "logfmt" => Ok(LogFormat::Logfmt),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

fn format_human(line: &LogLine) -> String {
    format!(
        "{} {:5} [{}] {}",
        line.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        line.level,
        line.target,
        line.message
    )
}

fn format_json(line: &LogLine) -> String {
    let mut json = serde_json::Map::new();
    json.insert("timestamp".to_string(), serde_json::Value::String(line.timestamp.to_rfc3339()));
    json.insert("level".to_string(), serde_json::Value::String(line.level.to_string()));
    json.insert("target".to_string(), serde_json::Value::String(line.target.clone()));
    json.insert("message".to_string(), serde_json::Value::String(line.message.clone()));

    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

fn format_logfmt(line: &LogLine) -> String {
    format!(
        "timestamp={} level={} target={} message=\"{}\"",
        line.timestamp.to_rfc3339(),
        line.level,
        line.target,
        line.message.replace('"', "\\\"")
    )
}
