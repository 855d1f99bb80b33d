use log::{info, warn};
use tokio::sync::watch;

use crate::agent::client::AgentClient;
use crate::errors::{CommandError, SessionError, SessionResult};
use crate::models::{BuyUnit, PriceSnapshot, SessionConfig, StartPayload};
use crate::pricing::{Conversion, PriceConversionEngine, Unit};
use crate::state::RunningFlag;

fn unit_of(buy_unit: BuyUnit) -> Unit {
    match buy_unit {
        BuyUnit::Sol => Unit::Sol,
        BuyUnit::Usd => Unit::Usd,
    }
}

/// Operator-side control of the agent: criteria editing, start/stop and
/// one-shot position commands.
///
/// `start` and `stop` borrow the session mutably for the whole request, so
/// a second toggle cannot be issued until the first one resolves. State is
/// only committed after the agent answers 2xx.
pub struct ControlSession {
    client: AgentClient,
    config: SessionConfig,
    running: RunningFlag,
    prices: watch::Receiver<PriceSnapshot>,
}

impl ControlSession {
    pub fn new(
        client: AgentClient,
        config: SessionConfig,
        running: RunningFlag,
        prices: watch::Receiver<PriceSnapshot>,
    ) -> Self {
        Self {
            client,
            config,
            running,
            prices,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Criteria for editing; locked while the agent runs
    pub fn config_mut(&mut self) -> SessionResult<&mut SessionConfig> {
        if self.is_running() {
            return Err(SessionError::Locked);
        }
        Ok(&mut self.config)
    }

    pub fn client_mut(&mut self) -> &mut AgentClient {
        &mut self.client
    }

    /// Conversion engine over the latest price snapshot
    pub fn engine(&self) -> PriceConversionEngine {
        PriceConversionEngine::new(self.prices.borrow().clone())
    }

    /// Flip the buy size between SOL and USD, rescaling when a price is known
    pub fn toggle_buy_unit(&mut self) -> SessionResult<Conversion> {
        if self.is_running() {
            return Err(SessionError::Locked);
        }

        let from = self.config.buy_unit;
        let conversion = self
            .engine()
            .convert(self.config.buy_amount, &unit_of(from), &unit_of(from.other()));

        if conversion.is_stale() {
            warn!("No SOL price available; buy size switched to {} without rescaling", from.other());
        }
        self.config.buy_amount = conversion.value;
        self.config.buy_unit = from.other();
        Ok(conversion)
    }

    /// Snapshot the criteria into the payload `start` would send
    pub fn freeze(&self) -> SessionResult<StartPayload> {
        let config = self.config.clone();

        let problems = config.validate();
        if !problems.is_empty() {
            return Err(CommandError::InvalidInput(problems.join("; ")).into());
        }

        let buy_amount_sol = match config.buy_unit {
            BuyUnit::Sol => config.buy_amount,
            BuyUnit::Usd => {
                let conversion = self.engine().convert(config.buy_amount, &Unit::Usd, &Unit::Sol);
                if conversion.is_stale() {
                    warn!(
                        "No SOL price snapshot; sending buy size {} unconverted",
                        config.buy_amount
                    );
                }
                conversion.value
            }
        };

        Ok(StartPayload::freeze(&config, buy_amount_sol))
    }

    pub async fn start(&mut self) -> SessionResult<()> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }

        let payload = self.freeze()?;
        info!(
            "Starting agent: buy {} SOL, {} mode, max {} pools",
            payload.buy_amount_sol(),
            self.config.discovery_mode,
            self.config.max_pools
        );

        self.client.start(&payload).await?;
        self.running.set(true);
        info!("Agent is RUNNING");
        Ok(())
    }

    /// Stop is always sent, even if the local flag already says stopped
    pub async fn stop(&mut self) -> SessionResult<()> {
        self.client.stop().await?;
        self.running.set(false);
        info!("Agent is STOPPED");
        Ok(())
    }

    pub async fn claim_fees(&self, pool_id: &str) -> SessionResult<()> {
        Ok(self.client.claim_fees(pool_id).await?)
    }

    pub async fn increase_liquidity(&self, pool_id: &str, amount_native: f64) -> SessionResult<()> {
        Ok(self.client.increase_liquidity(pool_id, amount_native).await?)
    }

    pub async fn withdraw_liquidity(&self, pool_id: &str, percent: f64) -> SessionResult<()> {
        Ok(self.client.withdraw_liquidity(pool_id, percent).await?)
    }

    pub async fn rotate_wallet_key(&self, new_key: &str, admin_credential: &str) -> SessionResult<String> {
        Ok(self.client.rotate_wallet_key(new_key, admin_credential).await?)
    }
}
