//! NormalizedTrade — one classified broker trade event, ready for rendering.

use super::category::Category;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker literal for a buy in the side column.
pub const SIDE_BUY: &str = "買";
/// Broker literal for a sell in the side column.
pub const SIDE_SELL: &str = "売";

/// Buy/sell direction of a single execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
    /// A side cell holding neither broker literal. Kept verbatim.
    Other(String),
}

impl Side {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            SIDE_BUY => Side::Buy,
            SIDE_SELL => Side::Sell,
            other => Side::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Side::Buy => SIDE_BUY,
            Side::Sell => SIDE_SELL,
            Side::Other(s) => s,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade row after column resolution, timestamp parsing and classification.
///
/// Numeric fields are `None` when the source cell did not parse as a number;
/// the template renders those as Pine's `na`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTrade {
    /// 1-based position within the instrument's chronologically ordered trades.
    pub sequence_index: usize,
    /// Execution time, always carried at UTC+9.
    pub timestamp: DateTime<FixedOffset>,
    pub order_type: String,
    pub side: Side,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub realized_pnl: Option<f64>,
    pub category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn sample_trade() -> NormalizedTrade {
        NormalizedTrade {
            sequence_index: 3,
            timestamp: jst().with_ymd_and_hms(2024, 3, 8, 22, 31, 5).unwrap(),
            order_type: "CFD決済".into(),
            side: Side::Sell,
            price: Some(18250.5),
            quantity: Some(1.0),
            realized_pnl: Some(-1200.0),
            category: Category::Ll,
        }
    }

    #[test]
    fn side_parses_broker_literals() {
        assert_eq!(Side::parse("買"), Side::Buy);
        assert_eq!(Side::parse(" 売 "), Side::Sell);
        assert_eq!(Side::parse("-"), Side::Other("-".into()));
        assert_eq!(Side::Other("x".into()).as_str(), "x");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: NormalizedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
        assert_eq!(deser.timestamp.offset().local_minus_utc(), 9 * 3600);
    }
}
