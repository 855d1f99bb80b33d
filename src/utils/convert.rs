/// Round half away from zero to a fixed number of decimals
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Parse an operator-entered quantity, rejecting NaN and infinities
pub fn parse_amount(input: &str) -> Option<f64> {
    input
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(15.000000000000002, 2), 15.0);
        assert_eq!(round_dp(0.123456789, 4), 0.1235);
        assert_eq!(round_dp(-2.25, 1), -2.3);
        assert_eq!(round_dp(7.0, 0), 7.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 1,250.5 "), Some(1250.5));
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("abc"), None);
    }
}
