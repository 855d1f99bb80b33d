use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity attached to an agent log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Warning,
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "success" => LogLevel::Success,
            "error" => LogLevel::Error,
            "warning" | "warn" => LogLevel::Warning,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "OK",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
        };
        f.write_str(label)
    }
}

/// One operational log line emitted by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    #[serde(rename = "type", default = "default_level")]
    pub level: LogLevel,
    #[serde(default)]
    pub timestamp: String,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

impl LogEntry {
    pub fn new(message: impl Into<String>, level: LogLevel, timestamp: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: timestamp.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:<5} {}", self.timestamp, self.level, self.message)
    }
}
