// In crates/strategies/src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)] // Clone is needed for the optimizer
pub struct MagicNineSettings {
    /// How many bars back each close is compared against.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Run length at which a setup becomes a signal.
    #[serde(default = "default_signal_threshold")]
    pub signal_threshold: u32,
    // The confidence score to assign to signals from this strategy
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Default for MagicNineSettings {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            signal_threshold: default_signal_threshold(),
            confidence: default_confidence(),
        }
    }
}

fn default_lookback() -> usize {
    2
}

fn default_signal_threshold() -> u32 {
    5
}

fn default_confidence() -> f64 {
    0.7
}
