use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::HashMap;

use crate::models::{Pool, PoolPatch};

/// Result of merging a `poolUpdate` into the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// No pool with that id is tracked; the patch was dropped
    UnknownPool,
}

/// Positions split around the legacy-format cutover
#[derive(Debug, Default)]
pub struct AgeClassification<'a> {
    /// Created at or after the cutover
    pub current: Vec<&'a Pool>,
    pub legacy: Vec<&'a Pool>,
}

/// Local view of every position the agent has reported, keyed by pool id
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    index: HashMap<String, usize>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resync from a full history, discarding everything tracked so far.
    /// If the history repeats a pool id, the first occurrence is kept.
    pub fn replace_all(&mut self, pools: Vec<Pool>) {
        self.pools.clear();
        self.index.clear();

        for pool in pools {
            if self.index.contains_key(&pool.pool_id) {
                warn!("Duplicate pool {} in history snapshot, keeping first", pool.pool_id);
                continue;
            }
            self.push(pool);
        }
    }

    /// Track a newly announced pool. Returns false if it was already known.
    pub fn insert_if_absent(&mut self, pool: Pool) -> bool {
        if self.index.contains_key(&pool.pool_id) {
            debug!("Pool {} already tracked, ignoring duplicate announcement", pool.pool_id);
            return false;
        }
        self.push(pool);
        true
    }

    /// Merge a partial update into the matching record (see [`Pool::apply_patch`])
    pub fn apply_update(&mut self, patch: &PoolPatch) -> UpdateOutcome {
        match self.index.get(&patch.pool_id) {
            Some(&slot) => {
                self.pools[slot].apply_patch(patch);
                UpdateOutcome::Applied
            }
            None => {
                warn!("Dropping update for unknown pool {}", patch.pool_id);
                UpdateOutcome::UnknownPool
            }
        }
    }

    pub fn get(&self, pool_id: &str) -> Option<&Pool> {
        self.index.get(pool_id).map(|&slot| &self.pools[slot])
    }

    pub fn all(&self) -> &[Pool] {
        &self.pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Positions that have not exited
    pub fn active(&self) -> Vec<&Pool> {
        self.pools.iter().filter(|p| p.is_active()).collect()
    }

    pub fn bot_created(&self) -> Vec<&Pool> {
        self.pools.iter().filter(|p| p.is_bot_created).collect()
    }

    pub fn by_base_token(&self, symbol: &str) -> Vec<&Pool> {
        self.pools
            .iter()
            .filter(|p| p.base_token.eq_ignore_ascii_case(symbol))
            .collect()
    }

    pub fn classify_by_age(&self, cutover: DateTime<Utc>) -> AgeClassification<'_> {
        let (current, legacy): (Vec<&Pool>, Vec<&Pool>) =
            self.pools.iter().partition(|p| p.created >= cutover);
        AgeClassification { current, legacy }
    }

    fn push(&mut self, pool: Pool) {
        self.index.insert(pool.pool_id.clone(), self.pools.len());
        self.pools.push(pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MoneyBreakdown;
    use chrono::TimeZone;

    fn pool(id: &str, created: &str) -> Pool {
        Pool {
            pool_id: id.to_string(),
            token: format!("TKN{}", id),
            base_token: "SOL".to_string(),
            created: DateTime::parse_from_rfc3339(created).unwrap().with_timezone(&Utc),
            roi: None,
            net_roi: None,
            unclaimed_fees: None,
            position_value: None,
            initial_mcap: None,
            current_mcap: None,
            exited: false,
            is_bot_created: false,
            tp1_done: false,
            take_profit_done: false,
            stop_loss_done: false,
        }
    }

    #[test]
    fn test_insert_if_absent_keeps_original() {
        let mut registry = PoolRegistry::new();
        let mut first = pool("a", "2025-02-01T00:00:00Z");
        first.roi = Some("4.2".to_string());
        assert!(registry.insert_if_absent(first));

        let mut duplicate = pool("a", "2025-03-01T00:00:00Z");
        duplicate.roi = Some("99".to_string());
        assert!(!registry.insert_if_absent(duplicate));

        assert_eq!(registry.len(), 1);
        let stored = registry.get("a").unwrap();
        assert_eq!(stored.roi.as_deref(), Some("4.2"));
        assert_eq!(stored.created.to_rfc3339(), "2025-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_replace_all_discards_prior_state() {
        let mut registry = PoolRegistry::new();
        registry.insert_if_absent(pool("a", "2025-02-01T00:00:00Z"));
        registry.insert_if_absent(pool("b", "2025-02-01T00:00:00Z"));

        registry.replace_all(vec![
            pool("c", "2025-02-01T00:00:00Z"),
            pool("d", "2025-02-01T00:00:00Z"),
        ]);

        let ids: Vec<&str> = registry.all().iter().map(|p| p.pool_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
        assert!(registry.get("a").is_none());
    }

    #[test]
    fn test_replace_all_dedupes_history() {
        let mut registry = PoolRegistry::new();
        let mut first = pool("a", "2025-02-01T00:00:00Z");
        first.token = "FIRST".to_string();
        let mut second = pool("a", "2025-02-01T00:00:00Z");
        second.token = "SECOND".to_string();

        registry.replace_all(vec![first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().token, "FIRST");
    }

    #[test]
    fn test_update_for_unknown_pool_is_dropped() {
        let mut registry = PoolRegistry::new();
        let mut patch = PoolPatch::new("ghost");
        patch.token = Some("GHOST".to_string());

        assert_eq!(registry.apply_update(&patch), UpdateOutcome::UnknownPool);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_disjoint_updates_commute() {
        let mut roi = PoolPatch::new("a");
        roi.roi = Some("15.0".to_string());
        let mut fees = PoolPatch::new("a");
        fees.unclaimed_fees = Some(MoneyBreakdown {
            amount_of_base: Some(0.3),
            ..Default::default()
        });

        let mut forward = PoolRegistry::new();
        forward.insert_if_absent(pool("a", "2025-02-01T00:00:00Z"));
        forward.apply_update(&roi);
        forward.apply_update(&fees);

        let mut backward = PoolRegistry::new();
        backward.insert_if_absent(pool("a", "2025-02-01T00:00:00Z"));
        backward.apply_update(&fees);
        backward.apply_update(&roi);

        assert_eq!(forward.get("a"), backward.get("a"));
        assert_eq!(forward.get("a").unwrap().roi.as_deref(), Some("15.0"));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut registry = PoolRegistry::new();
        registry.insert_if_absent(pool("a", "2025-02-01T00:00:00Z"));

        let mut patch = PoolPatch::new("a");
        patch.current_mcap = Some(420_000.0);
        patch.take_profit_done = Some(true);

        registry.apply_update(&patch);
        let once = registry.get("a").cloned();
        registry.apply_update(&patch);

        assert_eq!(registry.get("a").cloned(), once);
    }

    #[test]
    fn test_queries() {
        let mut registry = PoolRegistry::new();
        let mut bot = pool("a", "2024-11-01T00:00:00Z");
        bot.is_bot_created = true;
        let mut usdc = pool("b", "2025-04-01T00:00:00Z");
        usdc.base_token = "USDC".to_string();
        let exited = pool("c", "2025-05-01T00:00:00Z");
        registry.replace_all(vec![bot, usdc, exited]);

        let mut close = PoolPatch::new("c");
        close.exited = Some(true);
        registry.apply_update(&close);

        let active: Vec<&str> = registry.active().iter().map(|p| p.pool_id.as_str()).collect();
        assert_eq!(active, vec!["a", "b"]);
        assert_eq!(registry.bot_created().len(), 1);
        assert_eq!(registry.by_base_token("usdc").len(), 1);

        let cutover = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let split = registry.classify_by_age(cutover);
        assert_eq!(split.legacy.len(), 1);
        assert_eq!(split.current.len(), 2);
        assert_eq!(split.legacy[0].pool_id, "a");
    }

    #[test]
    fn test_cutover_boundary_counts_as_current() {
        let mut registry = PoolRegistry::new();
        registry.insert_if_absent(pool("edge", "2025-01-01T00:00:00Z"));

        let cutover = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let split = registry.classify_by_age(cutover);
        assert_eq!(split.current.len(), 1);
        assert!(split.legacy.is_empty());
    }
}
