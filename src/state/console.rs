use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::monitoring::AgentEvent;
use crate::state::flag::RunningFlag;
use crate::state::log_buffer::LogBuffer;
use crate::state::pool_registry::PoolRegistry;

/// Everything the console has learned from the push stream
#[derive(Debug)]
pub struct ConsoleState {
    pub pools: PoolRegistry,
    pub logs: LogBuffer,
    running: RunningFlag,
    connected: bool,
}

pub type SharedState = Arc<Mutex<ConsoleState>>;

impl ConsoleState {
    pub fn new(running: RunningFlag) -> Self {
        Self {
            pools: PoolRegistry::new(),
            logs: LogBuffer::new(),
            running,
            connected: false,
        }
    }

    pub fn shared(running: RunningFlag) -> SharedState {
        Arc::new(Mutex::new(Self::new(running)))
    }

    /// Lock shared state. A panic elsewhere never leaves the cache unusable.
    pub fn lock(state: &SharedState) -> MutexGuard<'_, ConsoleState> {
        state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// True once the agent has acknowledged the subscription
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Fold one push event into local state
    pub fn apply(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Connect => {
                info!("Agent event stream connected");
                self.connected = true;
            }
            AgentEvent::Status { running } => {
                let was_running = self.running.set(running);
                if was_running != running {
                    info!("Agent is now {}", if running { "RUNNING" } else { "STOPPED" });
                }
            }
            AgentEvent::Log(entry) => self.logs.append(entry),
            AgentEvent::LogHistory(entries) => {
                debug!("Resyncing {} log lines", entries.len());
                self.logs.replace_all(entries);
            }
            AgentEvent::Pool(pool) => {
                let pool_id = pool.pool_id.clone();
                if self.pools.insert_if_absent(pool) {
                    info!("Tracking new pool {}", pool_id);
                }
            }
            AgentEvent::PoolHistory(pools) => {
                debug!("Resyncing {} pools", pools.len());
                self.pools.replace_all(pools);
            }
            AgentEvent::PoolUpdate(patch) => {
                self.pools.apply_update(&patch);
            }
        }
    }
}
