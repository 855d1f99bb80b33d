pub mod client;
mod poller;
mod session;

pub use client::AgentClient;
pub use client::{
    CLAIM_FEES_PATH, INCREASE_LIQUIDITY_PATH, PORTFOLIO_PATH, PRICE_PATH, ROTATE_KEY_PATH, START_PATH,
    STOP_PATH, WITHDRAW_PATH,
};
pub use poller::PollCadence;
pub use poller::Poller;
pub use session::ControlSession;

use crate::config::Config;
use crate::db::ClientStore;
use anyhow::{Context, Result};

/// Create an agent client carrying the stored shared secret, if any
pub async fn create_client_from_config(config: &Config, store: &ClientStore) -> Result<AgentClient> {
    let secret = store
        .load_secret()
        .await
        .context("Failed to read the stored shared secret")?;

    Ok(AgentClient::from_config(config)?.with_secret(secret))
}
