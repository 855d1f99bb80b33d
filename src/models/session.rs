use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

use super::pool::DEFAULT_BASE_TOKEN;

/// Unit the operator typed the buy size in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuyUnit {
    Sol,
    Usd,
}

impl BuyUnit {
    pub fn other(self) -> BuyUnit {
        match self {
            BuyUnit::Sol => BuyUnit::Usd,
            BuyUnit::Usd => BuyUnit::Sol,
        }
    }
}

impl fmt::Display for BuyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuyUnit::Sol => f.write_str("SOL"),
            BuyUnit::Usd => f.write_str("USD"),
        }
    }
}

/// Pool fee tier, in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum FeeTier {
    Bps25,
    Bps100,
    Bps200,
    Bps400,
}

impl FeeTier {
    pub fn bps(self) -> u16 {
        match self {
            FeeTier::Bps25 => 25,
            FeeTier::Bps100 => 100,
            FeeTier::Bps200 => 200,
            FeeTier::Bps400 => 400,
        }
    }
}

impl From<FeeTier> for u16 {
    fn from(tier: FeeTier) -> Self {
        tier.bps()
    }
}

impl TryFrom<u16> for FeeTier {
    type Error = String;

    fn try_from(bps: u16) -> Result<Self, Self::Error> {
        match bps {
            25 => Ok(FeeTier::Bps25),
            100 => Ok(FeeTier::Bps100),
            200 => Ok(FeeTier::Bps200),
            400 => Ok(FeeTier::Bps400),
            other => Err(format!("unsupported fee tier: {} bps", other)),
        }
    }
}

/// Agent-side discovery strategy, passed through unmodified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscoveryMode {
    Scout,
    Analyst,
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryMode::Scout => f.write_str("SCOUT"),
            DiscoveryMode::Analyst => f.write_str("ANALYST"),
        }
    }
}

/// Inclusive min/max filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub min: f64,
    pub max: f64,
}

impl RangeFilter {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn problem(&self, name: &str) -> Option<String> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Some(format!("{} bounds must be finite", name));
        }
        if self.min < 0.0 {
            return Some(format!("{} minimum cannot be negative", name));
        }
        if self.min > self.max {
            return Some(format!("{} minimum {} exceeds maximum {}", name, self.min, self.max));
        }
        None
    }
}

/// Scan and execution criteria edited by the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub buy_amount: f64,
    pub buy_unit: BuyUnit,
    /// Percent
    pub slippage: f64,
    pub volume_5m: RangeFilter,
    pub volume_1h: RangeFilter,
    pub volume_24h: RangeFilter,
    pub liquidity: RangeFilter,
    pub market_cap: RangeFilter,
    pub fee_tier: FeeTier,
    pub max_pools: u32,
    pub max_age_minutes: u32,
    pub discovery_mode: DiscoveryMode,
    pub base_token: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buy_amount: 0.1,
            buy_unit: BuyUnit::Sol,
            slippage: 1.0,
            volume_5m: RangeFilter::new(1_000.0, 1_000_000.0),
            volume_1h: RangeFilter::new(10_000.0, 10_000_000.0),
            volume_24h: RangeFilter::new(100_000.0, 100_000_000.0),
            liquidity: RangeFilter::new(10_000.0, 5_000_000.0),
            market_cap: RangeFilter::new(100_000.0, 50_000_000.0),
            fee_tier: FeeTier::Bps100,
            max_pools: 3,
            max_age_minutes: 1_440,
            discovery_mode: DiscoveryMode::Scout,
            base_token: DEFAULT_BASE_TOKEN.to_string(),
        }
    }
}

impl SessionConfig {
    /// Every reason this config should not be sent to the agent
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !self.buy_amount.is_finite() || self.buy_amount <= 0.0 {
            problems.push("buy amount must be positive".to_string());
        }
        if !self.slippage.is_finite() || !(0.0..=100.0).contains(&self.slippage) {
            problems.push("slippage must be between 0 and 100 percent".to_string());
        }
        if self.max_pools == 0 {
            problems.push("max pools must be at least 1".to_string());
        }
        if self.base_token.trim().is_empty() {
            problems.push("base token must be selected".to_string());
        }

        let ranges = [
            ("5m volume", &self.volume_5m),
            ("1h volume", &self.volume_1h),
            ("24h volume", &self.volume_24h),
            ("liquidity", &self.liquidity),
            ("market cap", &self.market_cap),
        ];
        problems.extend(ranges.iter().filter_map(|(name, range)| range.problem(name)));

        problems
    }
}

/// Frozen criteria sent with a start command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPayload {
    buy_amount_sol: f64,
    slippage: f64,
    min_volume_5m: f64,
    max_volume_5m: f64,
    min_volume_1h: f64,
    max_volume_1h: f64,
    min_volume_24h: f64,
    max_volume_24h: f64,
    min_liquidity: f64,
    max_liquidity: f64,
    min_mcap: f64,
    max_mcap: f64,
    fee_tier_bps: u16,
    discovery_mode: DiscoveryMode,
    max_pools: u32,
    max_age_minutes: u32,
    base_token: String,
}

impl StartPayload {
    /// Freeze a config whose buy size has already been resolved to SOL
    pub fn freeze(config: &SessionConfig, buy_amount_sol: f64) -> Self {
        Self {
            buy_amount_sol,
            slippage: config.slippage,
            min_volume_5m: config.volume_5m.min,
            max_volume_5m: config.volume_5m.max,
            min_volume_1h: config.volume_1h.min,
            max_volume_1h: config.volume_1h.max,
            min_volume_24h: config.volume_24h.min,
            max_volume_24h: config.volume_24h.max,
            min_liquidity: config.liquidity.min,
            max_liquidity: config.liquidity.max,
            min_mcap: config.market_cap.min,
            max_mcap: config.market_cap.max,
            fee_tier_bps: config.fee_tier.bps(),
            discovery_mode: config.discovery_mode,
            max_pools: config.max_pools,
            max_age_minutes: config.max_age_minutes,
            base_token: config.base_token.clone(),
        }
    }

    pub fn buy_amount_sol(&self) -> f64 {
        self.buy_amount_sol
    }
}
