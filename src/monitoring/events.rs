use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::EventError;
use crate::models::{LogEntry, PoolPatch, PoolSnapshot};

/// A push event from the agent, decoded into its typed payload
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Connect,
    Status { running: bool },
    Log(LogEntry),
    LogHistory(Vec<LogEntry>),
    Pool(PoolSnapshot),
    PoolHistory(Vec<PoolSnapshot>),
    PoolUpdate(PoolPatch),
}

#[derive(Deserialize)]
struct StatusPayload {
    running: bool,
}

impl AgentEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::Connect => "connect",
            AgentEvent::Status { .. } => "status",
            AgentEvent::Log(_) => "log",
            AgentEvent::LogHistory(_) => "logHistory",
            AgentEvent::Pool(_) => "pool",
            AgentEvent::PoolHistory(_) => "poolHistory",
            AgentEvent::PoolUpdate(_) => "poolUpdate",
        }
    }

    /// Decode a named event. Unknown names yield `Ok(None)`.
    ///
    /// History payloads are decoded element by element: entries that do not
    /// fit the expected shape are skipped and the rest are kept.
    pub fn decode(name: &str, payload: Value) -> Result<Option<AgentEvent>, EventError> {
        let event = match name {
            "connect" => AgentEvent::Connect,
            "status" => {
                let running = match payload {
                    Value::Bool(running) => running,
                    other => parse::<StatusPayload>(name, other)?.running,
                };
                AgentEvent::Status { running }
            }
            "log" => AgentEvent::Log(parse(name, payload)?),
            "logHistory" => AgentEvent::LogHistory(parse_each(name, payload)?),
            "pool" => {
                let pool: PoolSnapshot = parse(name, payload)?;
                require_pool_id(name, &pool.pool_id)?;
                AgentEvent::Pool(pool)
            }
            "poolHistory" => {
                let mut pools: Vec<PoolSnapshot> = parse_each(name, payload)?;
                pools.retain(|pool| {
                    let keep = require_pool_id(name, &pool.pool_id).is_ok();
                    if !keep {
                        warn!("Skipping {} entry for {} with an empty poolId", name, pool.token);
                    }
                    keep
                });
                AgentEvent::PoolHistory(pools)
            }
            "poolUpdate" => {
                let patch: PoolPatch = parse(name, payload)?;
                require_pool_id(name, &patch.pool_id)?;
                AgentEvent::PoolUpdate(patch)
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn require_pool_id(event: &str, pool_id: &str) -> Result<(), EventError> {
    if pool_id.trim().is_empty() {
        return Err(EventError::malformed(event, "empty poolId"));
    }
    Ok(())
}

fn parse<T: DeserializeOwned>(event: &str, payload: Value) -> Result<T, EventError> {
    serde_json::from_value(payload).map_err(|e| EventError::malformed(event, e))
}

fn parse_each<T: DeserializeOwned>(event: &str, payload: Value) -> Result<Vec<T>, EventError> {
    let items = match payload {
        Value::Array(items) => items,
        _ => return Err(EventError::malformed(event, "expected an array")),
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Skipping malformed {} entry #{}: {}", event, i, e);
                None
            }
        })
        .collect();

    if parsed.len() < total {
        warn!("{}: kept {} of {} entries", event, parsed.len(), total);
    }
    Ok(parsed)
}
