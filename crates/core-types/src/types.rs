// In crates/core-types/src/types.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A trading symbol, e.g. "AAPL" or "BTCUSDT".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

/// One observation of total account equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

impl EquityPoint {
    pub fn new(timestamp: DateTime<Utc>, value: Decimal) -> Self {
        Self { timestamp, value }
    }
}

/// A single price observation fed to indicators and strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// An executed trade as reported by the execution engine.
///
/// Entries carry no `profit`; the closing leg of a position does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub action: TradeAction,
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub quantity: Decimal,
    pub value: Decimal,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub profit: Option<Decimal>,
}

/// The output of a strategy assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    GoLong { confidence: f64 },
    GoShort { confidence: f64 },
    Hold,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    #[test]
    fn trade_without_profit_is_an_entry() {
        let json = r#"{
            "symbol": "AAPL",
            "action": "buy",
            "entry_time": "2024-01-02T14:30:00Z",
            "price": "185.20",
            "quantity": "10",
            "value": "1852.00",
            "commission": "1.99"
        }"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.symbol, Symbol("AAPL".into()));
        assert_eq!(trade.action, TradeAction::Buy);
        assert!(trade.profit.is_none());
        assert!(trade.exit_time.is_none());
    }

    #[test]
    fn equity_point_accepts_numeric_values() {
        let json = r#"{ "timestamp": "2024-01-02T00:00:00Z", "value": 10000.5 }"#;
        let point: EquityPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(point.value, Decimal::new(100005, 1));
    }
}
