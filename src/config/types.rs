use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Boundary between legacy-format and current-format positions
pub const DEFAULT_POSITION_FORMAT_CUTOVER: &str = "2025-01-01T00:00:00Z";

/// Configuration for the LP console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the agent's HTTP command API
    pub api_url: String,
    /// Push-event endpoint of the agent
    pub events_url: String,
    /// Location of the local sqlite store holding the shared secret
    pub database_path: String,
    /// Header carrying the shared secret on mutating requests
    pub auth_header: String,
    /// Poll interval while the agent is running
    pub active_poll_seconds: u64,
    /// Poll interval while the agent is stopped
    pub idle_poll_seconds: u64,
    /// Timeout applied to every HTTP request
    pub request_timeout_seconds: u64,
    /// One-time migration marker used to group legacy positions
    pub position_format_cutover: DateTime<Utc>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".to_string(),
            events_url: "ws://127.0.0.1:3000/socket.io/?EIO=4&transport=websocket".to_string(),
            database_path: "sqlite:console.db".to_string(),
            auth_header: "X-Admin-Key".to_string(),
            active_poll_seconds: 5,
            idle_poll_seconds: 30,
            request_timeout_seconds: 10,
            position_format_cutover: DateTime::parse_from_rfc3339(DEFAULT_POSITION_FORMAT_CUTOVER)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_default(),
        }
    }
}

impl Config {
    /// Build a config from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(api_url) = lookup("AGENT_API_URL") {
            config.api_url = api_url.trim_end_matches('/').to_string();
        }

        if let Some(events_url) = lookup("AGENT_EVENTS_URL") {
            config.events_url = events_url;
        }

        if let Some(db_path) = lookup("CONSOLE_DB_PATH") {
            config.database_path = db_path;
        }

        if let Some(header) = lookup("AUTH_HEADER") {
            if !header.trim().is_empty() {
                config.auth_header = header.trim().to_string();
            }
        }

        if let Some(value) = lookup("ACTIVE_POLL_SECONDS").and_then(|v| v.parse::<u64>().ok()) {
            config.active_poll_seconds = value.max(1);
        }

        if let Some(value) = lookup("IDLE_POLL_SECONDS").and_then(|v| v.parse::<u64>().ok()) {
            config.idle_poll_seconds = value.max(1);
        }

        if let Some(value) = lookup("REQUEST_TIMEOUT_SECONDS").and_then(|v| v.parse::<u64>().ok()) {
            config.request_timeout_seconds = value.max(1);
        }

        if let Some(cutover) = lookup("POSITION_FORMAT_CUTOVER") {
            config.position_format_cutover = DateTime::parse_from_rfc3339(&cutover)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("Invalid POSITION_FORMAT_CUTOVER: {}", cutover))?;
        }

        Ok(config)
    }

    pub fn active_poll_interval(&self) -> Duration {
        Duration::from_secs(self.active_poll_seconds)
    }

    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_secs(self.idle_poll_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Loads configuration from environment variables, falling back to default values
pub fn load_config() -> Result<Config> {
    Config::from_lookup(|key| env::var(key).ok())
}
