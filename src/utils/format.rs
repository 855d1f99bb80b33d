use crate::models::Pool;
use crate::pricing::{round_token_display, Conversion, Unit};

/// Format an address or pool id for display (shortened)
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Render a converted quantity, flagging values that could not be rescaled
pub fn format_conversion(conversion: &Conversion) -> String {
    let amount = match conversion.unit {
        Unit::Usd => format!("${:.2}", conversion.value),
        _ => format!("{} {}", conversion.value, conversion.unit),
    };
    if conversion.converted {
        amount
    } else {
        format!("{} (unconverted, no price)", amount)
    }
}

/// One-line summary of a position
pub fn format_pool_line(pool: &Pool) -> String {
    let mut line = format!(
        "{} {}/{}",
        short_address(&pool.pool_id),
        pool.token,
        pool.base_token
    );

    if let Some(roi) = &pool.roi {
        line.push_str(&format!(" roi {}%", roi));
    }
    if let Some(net_roi) = &pool.net_roi {
        line.push_str(&format!(" net {}%", net_roi));
    }
    if let Some(value) = pool.position_value.as_ref().and_then(|v| v.total_in_base_units) {
        line.push_str(&format!(" value {} {}", round_token_display(value), pool.base_token));
    }
    if let Some(fees) = pool.unclaimed_fees.as_ref().and_then(|f| f.total_in_base_units) {
        line.push_str(&format!(" fees {} {}", round_token_display(fees), pool.base_token));
    }
    if let Some(multiplier) = pool.mcap_multiplier() {
        line.push_str(&format!(" mcap x{:.2}", multiplier));
    }

    let flags: Vec<&str> = [
        (pool.is_bot_created, "bot"),
        (pool.tp1_done, "tp1"),
        (pool.take_profit_done, "tp"),
        (pool.stop_loss_done, "sl"),
        (pool.exited, "exited"),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|(_, label)| *label)
    .collect();

    if !flags.is_empty() {
        line.push_str(&format!(" [{}]", flags.join(",")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"),
            "7xKX...gAsU"
        );
        assert_eq!(short_address("abc"), "abc");
    }

    #[test]
    fn test_format_conversion_marks_stale() {
        let fresh = Conversion {
            value: 15.0,
            unit: Unit::Usd,
            converted: true,
        };
        assert_eq!(format_conversion(&fresh), "$15.00");

        let stale = Conversion {
            value: 15.0,
            unit: Unit::Sol,
            converted: false,
        };
        assert_eq!(format_conversion(&stale), "15 SOL (unconverted, no price)");
    }

    #[test]
    fn test_pool_line() {
        let pool: Pool = serde_json::from_value(json!({
            "poolId": "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
            "token": "BONK",
            "created": "2025-03-01T00:00:00Z",
            "roi": "12.4",
            "initialMcap": 100.0,
            "currentMcap": 150.0,
            "isBotCreated": true,
            "tp1Done": true
        }))
        .unwrap();

        assert_eq!(
            format_pool_line(&pool),
            "7xKX...gAsU BONK/SOL roi 12.4% mcap x1.50 [bot,tp1]"
        );
    }
}
