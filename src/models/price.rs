use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Latest USD prices known to the console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub sol_usd: Option<f64>,
    pub base_token_usd: HashMap<String, f64>,
}

/// Body of the unauthenticated price endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    #[serde(default)]
    pub sol_price: Option<f64>,
    #[serde(default)]
    pub base_token_prices: Option<HashMap<String, f64>>,
}

impl PriceSnapshot {
    pub fn new(sol_usd: Option<f64>) -> Self {
        Self {
            sol_usd,
            base_token_usd: HashMap::new(),
        }
    }

    pub fn with_base_token(mut self, symbol: &str, usd: f64) -> Self {
        self.base_token_usd.insert(symbol.to_ascii_uppercase(), usd);
        self
    }

    /// Fold a poll result into a new snapshot.
    ///
    /// A field the poll leaves out (or reports as unusable) keeps its
    /// previous value; the base-token map is swapped as a whole.
    pub fn merged_with(&self, response: &PriceResponse) -> PriceSnapshot {
        let sol_usd = response.sol_price.filter(|p| usable(*p)).or(self.sol_usd);

        let base_token_usd = match &response.base_token_prices {
            Some(prices) => prices
                .iter()
                .filter(|(_, p)| usable(**p))
                .map(|(symbol, p)| (symbol.to_ascii_uppercase(), *p))
                .collect(),
            None => self.base_token_usd.clone(),
        };

        PriceSnapshot {
            sol_usd,
            base_token_usd,
        }
    }

    /// USD price of a base token symbol; SOL resolves to the SOL price
    pub fn base_token_price(&self, symbol: &str) -> Option<f64> {
        if symbol.eq_ignore_ascii_case("SOL") {
            return self.sol_usd;
        }
        self.base_token_usd.get(&symbol.to_ascii_uppercase()).copied()
    }
}

/// Wallet overview reported by the agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    #[serde(default)]
    pub sol_balance: Option<f64>,
    #[serde(default)]
    pub usd_value: Option<f64>,
    #[serde(default)]
    pub base_token_balances: Option<HashMap<String, f64>>,
}

impl PortfolioSnapshot {
    /// Same "absent means no update" rule as prices
    pub fn merged_with(&self, response: &PortfolioSnapshot) -> PortfolioSnapshot {
        PortfolioSnapshot {
            sol_balance: response.sol_balance.or(self.sol_balance),
            usd_value: response.usd_value.or(self.usd_value),
            base_token_balances: response
                .base_token_balances
                .clone()
                .or_else(|| self.base_token_balances.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_price_keeps_previous() {
        let previous = PriceSnapshot::new(Some(150.0)).with_base_token("USDC", 1.0);
        let merged = previous.merged_with(&PriceResponse::default());
        assert_eq!(merged, previous);
    }

    #[test]
    fn test_unusable_price_keeps_previous() {
        let previous = PriceSnapshot::new(Some(150.0));
        let response = PriceResponse {
            sol_price: Some(0.0),
            base_token_prices: None,
        };
        assert_eq!(previous.merged_with(&response).sol_usd, Some(150.0));
    }

    #[test]
    fn test_base_token_map_is_replaced_wholesale() {
        let previous = PriceSnapshot::new(Some(150.0))
            .with_base_token("USDC", 1.0)
            .with_base_token("JUP", 0.9);

        let mut prices = HashMap::new();
        prices.insert("usdc".to_string(), 0.999);
        prices.insert("BAD".to_string(), f64::NAN);
        let merged = previous.merged_with(&PriceResponse {
            sol_price: Some(151.0),
            base_token_prices: Some(prices),
        });

        assert_eq!(merged.sol_usd, Some(151.0));
        assert_eq!(merged.base_token_price("USDC"), Some(0.999));
        assert_eq!(merged.base_token_price("JUP"), None);
        assert_eq!(merged.base_token_price("BAD"), None);
    }

    #[test]
    fn test_sol_base_token_uses_sol_price() {
        let snapshot = PriceSnapshot::new(Some(140.0));
        assert_eq!(snapshot.base_token_price("sol"), Some(140.0));
    }

    #[test]
    fn test_portfolio_merge() {
        let previous = PortfolioSnapshot {
            sol_balance: Some(3.2),
            usd_value: Some(480.0),
            base_token_balances: None,
        };
        let update = PortfolioSnapshot {
            sol_balance: None,
            usd_value: Some(500.0),
            base_token_balances: None,
        };
        let merged = previous.merged_with(&update);
        assert_eq!(merged.sol_balance, Some(3.2));
        assert_eq!(merged.usd_value, Some(500.0));
    }
}
