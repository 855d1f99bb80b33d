use std::fmt;

use crate::models::PriceSnapshot;
use crate::utils::round_dp;

/// Decimals kept for SOL-denominated results
pub const SOL_DECIMALS: u32 = 4;
/// Decimals kept for USD-denominated results
pub const USD_DECIMALS: u32 = 2;
/// Decimals kept for base-token "LP match" quantities
pub const LP_MATCH_DECIMALS: u32 = 1;
/// Decimals kept when displaying traded-token quantities
pub const TOKEN_DISPLAY_DECIMALS: u32 = 6;

/// Denomination of an operator-facing quantity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    Sol,
    Usd,
    /// A non-SOL base token, by upper-case symbol
    Base(String),
}

impl Unit {
    /// Unit for a base token symbol; SOL maps to [`Unit::Sol`]
    pub fn base(symbol: &str) -> Unit {
        if symbol.eq_ignore_ascii_case("SOL") {
            Unit::Sol
        } else {
            Unit::Base(symbol.to_ascii_uppercase())
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            Unit::Sol => SOL_DECIMALS,
            Unit::Usd => USD_DECIMALS,
            Unit::Base(_) => LP_MATCH_DECIMALS,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Sol => f.write_str("SOL"),
            Unit::Usd => f.write_str("USD"),
            Unit::Base(symbol) => f.write_str(symbol),
        }
    }
}

/// Outcome of a conversion.
///
/// `converted == false` means no usable price was available: the unit was
/// switched but the number was not rescaled, and callers should mark the
/// value as stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub value: f64,
    pub unit: Unit,
    pub converted: bool,
}

impl Conversion {
    fn rescaled(value: f64, unit: Unit) -> Self {
        let value = round_dp(value, unit.decimals());
        Self {
            value,
            unit,
            converted: true,
        }
    }

    fn unconverted(amount: f64, unit: Unit) -> Self {
        Self {
            value: if amount.is_finite() { amount } else { 0.0 },
            unit,
            converted: false,
        }
    }

    pub fn is_stale(&self) -> bool {
        !self.converted
    }
}

fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Convert `amount` between units given the USD price of the non-USD side.
///
/// For a conversion between two non-USD units `asset_price` is the cross
/// rate: units of `to` per unit of `from`. Never fails: a missing,
/// non-positive or non-finite price (or result) yields an unconverted value.
pub fn convert_with_price(amount: f64, from: &Unit, to: &Unit, asset_price: Option<f64>) -> Conversion {
    if !amount.is_finite() {
        return Conversion::unconverted(amount, to.clone());
    }
    if from == to {
        return Conversion::rescaled(amount, to.clone());
    }

    let price = asset_price.filter(|p| usable(*p));
    let rate = match (from, to) {
        (_, Unit::Usd) => price,
        (Unit::Usd, _) => price.map(|p| 1.0 / p),
        _ => price,
    };

    match rate.map(|r| amount * r).filter(|v| v.is_finite()) {
        Some(value) => Conversion::rescaled(value, to.clone()),
        None => Conversion::unconverted(amount, to.clone()),
    }
}

/// Round a traded-token quantity for display
pub fn round_token_display(amount: f64) -> f64 {
    round_dp(amount, TOKEN_DISPLAY_DECIMALS)
}

/// Conversions against the latest polled prices
#[derive(Debug, Clone, Default)]
pub struct PriceConversionEngine {
    snapshot: PriceSnapshot,
}

impl PriceConversionEngine {
    pub fn new(snapshot: PriceSnapshot) -> Self {
        Self { snapshot }
    }

    /// Swap in a newer snapshot
    pub fn update(&mut self, snapshot: PriceSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &PriceSnapshot {
        &self.snapshot
    }

    /// USD value of one unit, when known and usable
    pub fn usd_price(&self, unit: &Unit) -> Option<f64> {
        let price = match unit {
            Unit::Usd => Some(1.0),
            Unit::Sol => self.snapshot.sol_usd,
            Unit::Base(symbol) => self.snapshot.base_token_price(symbol),
        };
        price.filter(|p| usable(*p))
    }

    pub fn convert(&self, amount: f64, from: &Unit, to: &Unit) -> Conversion {
        let asset_price = match (from, to) {
            (_, Unit::Usd) => self.usd_price(from),
            (Unit::Usd, _) => self.usd_price(to),
            _ => match (self.usd_price(from), self.usd_price(to)) {
                (Some(from_usd), Some(to_usd)) => Some(from_usd / to_usd),
                _ => None,
            },
        };
        convert_with_price(amount, from, to, asset_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PriceConversionEngine {
        PriceConversionEngine::new(PriceSnapshot::new(Some(150.0)).with_base_token("USDC", 1.0))
    }

    #[test]
    fn test_sol_usd_round_trip() {
        let engine = engine();

        let usd = engine.convert(0.1, &Unit::Sol, &Unit::Usd);
        assert!(usd.converted);
        assert_eq!(usd.value, 15.0);
        assert_eq!(usd.unit, Unit::Usd);

        let sol = engine.convert(usd.value, &Unit::Usd, &Unit::Sol);
        assert!((sol.value - 0.1).abs() <= 1e-4);
        assert_eq!(sol.unit, Unit::Sol);
    }

    #[test]
    fn test_rounding_per_unit() {
        let engine = engine();
        assert_eq!(engine.convert(1.0, &Unit::Usd, &Unit::Sol).value, 0.0067);
        assert_eq!(engine.convert(0.123456, &Unit::Sol, &Unit::Usd).value, 18.52);
        assert_eq!(engine.convert(0.33, &Unit::Sol, &Unit::base("USDC")).value, 49.5);
        assert_eq!(round_token_display(1.23456789), 1.234568);
    }

    #[test]
    fn test_missing_price_flips_unit_without_rescaling() {
        let engine = PriceConversionEngine::default();
        let result = engine.convert(25.0, &Unit::Usd, &Unit::Sol);

        assert!(result.is_stale());
        assert_eq!(result.value, 25.0);
        assert_eq!(result.unit, Unit::Sol);
    }

    #[test]
    fn test_unusable_prices_are_treated_as_missing() {
        for price in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let result = convert_with_price(2.0, &Unit::Sol, &Unit::Usd, Some(price));
            assert!(result.is_stale());
            assert_eq!(result.value, 2.0);
        }
    }

    #[test]
    fn test_non_finite_amount_never_displays() {
        let result = convert_with_price(f64::NAN, &Unit::Sol, &Unit::Usd, Some(150.0));
        assert!(result.is_stale());
        assert!(result.value.is_finite());
    }

    #[test]
    fn test_overflowing_result_is_unconverted() {
        let result = convert_with_price(f64::MAX, &Unit::Sol, &Unit::Usd, Some(1e10));
        assert!(result.is_stale());
        assert_eq!(result.value, f64::MAX);
    }

    #[test]
    fn test_sol_base_token_is_sol() {
        assert_eq!(Unit::base("sol"), Unit::Sol);
        assert_eq!(Unit::base("usdc"), Unit::Base("USDC".to_string()));
    }

    #[test]
    fn test_cross_conversion_needs_both_prices() {
        let engine = engine();
        let missing = engine.convert(1.0, &Unit::Sol, &Unit::base("JUP"));
        assert!(missing.is_stale());
        assert_eq!(missing.unit, Unit::base("JUP"));

        let usdc = engine.convert(300.0, &Unit::base("USDC"), &Unit::Sol);
        assert!(usdc.converted);
        assert_eq!(usdc.value, 2.0);
    }
}
