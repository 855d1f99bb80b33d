use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base token assumed when the agent leaves it out
pub const DEFAULT_BASE_TOKEN: &str = "SOL";

fn default_base_token() -> String {
    DEFAULT_BASE_TOKEN.to_string()
}

/// Money amount reported by the agent, split by asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_of_base: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_of_token: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_in_base_units: Option<f64>,
}

impl MoneyBreakdown {
    /// Overwrite every field the other breakdown carries
    pub fn merge(&mut self, other: &MoneyBreakdown) {
        if let Some(v) = other.amount_of_base {
            self.amount_of_base = Some(v);
        }
        if let Some(v) = other.amount_of_token {
            self.amount_of_token = Some(v);
        }
        if let Some(v) = other.total_in_base_units {
            self.total_in_base_units = Some(v);
        }
    }
}

/// A liquidity position tracked by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub pool_id: String,
    pub token: String,
    #[serde(default = "default_base_token")]
    pub base_token: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub roi: Option<String>,
    #[serde(default)]
    pub net_roi: Option<String>,
    #[serde(default)]
    pub unclaimed_fees: Option<MoneyBreakdown>,
    #[serde(default)]
    pub position_value: Option<MoneyBreakdown>,
    #[serde(default)]
    pub initial_mcap: Option<f64>,
    #[serde(default)]
    pub current_mcap: Option<f64>,
    #[serde(default)]
    pub exited: bool,
    #[serde(default)]
    pub is_bot_created: bool,
    #[serde(default)]
    pub tp1_done: bool,
    #[serde(default)]
    pub take_profit_done: bool,
    #[serde(default)]
    pub stop_loss_done: bool,
}

/// Full pool record as carried by `pool` and `poolHistory` events
pub type PoolSnapshot = Pool;

impl Pool {
    /// Market-cap multiple since entry, when both snapshots are usable
    pub fn mcap_multiplier(&self) -> Option<f64> {
        let initial = self.initial_mcap?;
        let current = self.current_mcap?;
        if initial <= 0.0 {
            return None;
        }
        let multiplier = current / initial;
        multiplier.is_finite().then_some(multiplier)
    }

    pub fn is_active(&self) -> bool {
        !self.exited
    }

    /// Merge a partial update into this record.
    ///
    /// Every field carried by the patch overwrites the stored one; absent
    /// fields are left alone. Money breakdowns merge per sub-field. The
    /// lifecycle flags (`exited`, `tp1Done`, `takeProfitDone`, `stopLossDone`)
    /// only ever move from false to true, so a stale `false` in a later
    /// patch cannot reopen a position. `isBotCreated` is a plain overwrite.
    /// Identity (`poolId`) and `created` are never touched.
    ///
    /// Under these rules two patches that set disjoint fields commute, and
    /// applying the same patch twice is the same as applying it once.
    pub fn apply_patch(&mut self, patch: &PoolPatch) {
        if let Some(token) = &patch.token {
            self.token = token.clone();
        }
        if let Some(base_token) = &patch.base_token {
            self.base_token = base_token.clone();
        }
        if let Some(roi) = &patch.roi {
            self.roi = Some(roi.clone());
        }
        if let Some(net_roi) = &patch.net_roi {
            self.net_roi = Some(net_roi.clone());
        }
        if let Some(fees) = &patch.unclaimed_fees {
            self.unclaimed_fees.get_or_insert_with(MoneyBreakdown::default).merge(fees);
        }
        if let Some(value) = &patch.position_value {
            self.position_value.get_or_insert_with(MoneyBreakdown::default).merge(value);
        }
        if let Some(mcap) = patch.initial_mcap {
            self.initial_mcap = Some(mcap);
        }
        if let Some(mcap) = patch.current_mcap {
            self.current_mcap = Some(mcap);
        }
        if let Some(bot_created) = patch.is_bot_created {
            self.is_bot_created = bot_created;
        }

        self.exited |= patch.exited.unwrap_or(false);
        self.tp1_done |= patch.tp1_done.unwrap_or(false);
        self.take_profit_done |= patch.take_profit_done.unwrap_or(false);
        self.stop_loss_done |= patch.stop_loss_done.unwrap_or(false);
    }
}

/// Partial pool record carried by `poolUpdate` events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolPatch {
    pub pool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_roi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unclaimed_fees: Option<MoneyBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_value: Option<MoneyBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_mcap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mcap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bot_created: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp1_done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_done: Option<bool>,
}

impl PoolPatch {
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_pool() -> Pool {
        serde_json::from_value(json!({
            "poolId": "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
            "token": "BONK",
            "created": "2025-03-01T12:00:00Z",
            "initialMcap": 100000.0,
            "currentMcap": 250000.0
        }))
        .unwrap()
    }

    #[test]
    fn test_snapshot_defaults() {
        let pool = sample_pool();
        assert_eq!(pool.base_token, "SOL");
        assert!(!pool.exited);
        assert!(!pool.is_bot_created);
        assert!(pool.unclaimed_fees.is_none());
    }

    #[test]
    fn test_snapshot_requires_created() {
        let result = serde_json::from_value::<Pool>(json!({ "poolId": "abc", "token": "WIF" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_mcap_multiplier() {
        let mut pool = sample_pool();
        assert_eq!(pool.mcap_multiplier(), Some(2.5));

        pool.initial_mcap = Some(0.0);
        assert_eq!(pool.mcap_multiplier(), None);

        pool.initial_mcap = None;
        assert_eq!(pool.mcap_multiplier(), None);
    }

    #[test]
    fn test_patch_ignores_null_and_absent_fields() {
        let mut pool = sample_pool();
        pool.roi = Some("12.5".to_string());

        let patch: PoolPatch = serde_json::from_value(json!({
            "poolId": pool.pool_id,
            "roi": null,
            "netRoi": "8.1"
        }))
        .unwrap();
        pool.apply_patch(&patch);

        assert_eq!(pool.roi.as_deref(), Some("12.5"));
        assert_eq!(pool.net_roi.as_deref(), Some("8.1"));
    }

    #[test]
    fn test_lifecycle_flags_never_revert() {
        let mut pool = sample_pool();

        let mut close = PoolPatch::new(pool.pool_id.clone());
        close.exited = Some(true);
        close.tp1_done = Some(true);
        pool.apply_patch(&close);

        let mut stale = PoolPatch::new(pool.pool_id.clone());
        stale.exited = Some(false);
        stale.tp1_done = Some(false);
        pool.apply_patch(&stale);

        assert!(pool.exited);
        assert!(pool.tp1_done);
    }

    #[test]
    fn test_money_breakdown_merges_per_field() {
        let mut pool = sample_pool();
        pool.unclaimed_fees = Some(MoneyBreakdown {
            amount_of_base: Some(0.5),
            amount_of_token: Some(1200.0),
            total_in_base_units: Some(0.9),
        });

        let patch: PoolPatch = serde_json::from_value(json!({
            "poolId": pool.pool_id,
            "unclaimedFees": { "amountOfBase": 0.75 }
        }))
        .unwrap();
        pool.apply_patch(&patch);

        let fees = pool.unclaimed_fees.unwrap();
        assert_eq!(fees.amount_of_base, Some(0.75));
        assert_eq!(fees.amount_of_token, Some(1200.0));
        assert_eq!(fees.total_in_base_units, Some(0.9));
    }

    #[test]
    fn test_patch_never_touches_created() {
        let mut pool = sample_pool();
        let created = pool.created;

        let patch: PoolPatch = serde_json::from_value(json!({
            "poolId": pool.pool_id,
            "created": "2030-01-01T00:00:00Z",
            "isBotCreated": true
        }))
        .unwrap();
        pool.apply_patch(&patch);

        assert_eq!(pool.created, created);
    }

    #[test]
    fn test_patch_overwrites_bot_created() {
        let mut pool = sample_pool();
        assert!(!pool.is_bot_created);

        let adopt: PoolPatch = serde_json::from_value(json!({
            "poolId": pool.pool_id,
            "isBotCreated": true
        }))
        .unwrap();
        pool.apply_patch(&adopt);
        assert!(pool.is_bot_created);

        // Unlike the lifecycle flags, a later false is honoured
        let release: PoolPatch = serde_json::from_value(json!({
            "poolId": pool.pool_id,
            "isBotCreated": false
        }))
        .unwrap();
        pool.apply_patch(&release);
        assert!(!pool.is_bot_created);

        pool.apply_patch(&PoolPatch::new(pool.pool_id.clone()));
        assert!(!pool.is_bot_created);
    }
}
