// In crates/strategies/src/magic_nine.rs

use std::collections::VecDeque;

use core_types::{Bar, Signal};
use rust_decimal::prelude::ToPrimitive;

use crate::Strategy;
use crate::error::{Error, Result};
use crate::types::MagicNineSettings;

/// The counter state after one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceReading {
    /// False until `lookback` earlier closes are available.
    pub has_data: bool,
    /// Length of the current run of lower closes, absent when zero.
    pub buy_setup: Option<u32>,
    /// Length of the current run of higher closes, absent when zero.
    pub sell_setup: Option<u32>,
    pub buy_signal: bool,
    pub sell_signal: bool,
}

impl SequenceReading {
    /// The "insufficient data" reading: no counts and no signals.
    pub fn insufficient() -> Self {
        Self::default()
    }

    /// Signed run length: `+n` for a rising run, `-n` for a falling one.
    pub fn run_length(&self) -> Option<i64> {
        match (self.sell_setup, self.buy_setup) {
            (Some(up), _) => Some(i64::from(up)),
            (None, Some(down)) => Some(-i64::from(down)),
            (None, None) => None,
        }
    }
}

/// Counts consecutive closes above or below the close `lookback` bars earlier.
#[derive(Debug, Clone)]
pub struct SequenceCounter {
    lookback: usize,
    signal_threshold: u32,
    // The last `lookback` closes, oldest first.
    window: VecDeque<f64>,
    up_run: u32,
    down_run: u32,
}

impl SequenceCounter {
    pub fn new(lookback: usize, signal_threshold: u32) -> Result<Self> {
        if lookback == 0 {
            return Err(Error::InvalidParameters("lookback must be positive".into()));
        }
        if signal_threshold == 0 {
            return Err(Error::InvalidParameters("signal_threshold must be positive".into()));
        }
        Ok(Self {
            lookback,
            signal_threshold,
            window: VecDeque::with_capacity(lookback),
            up_run: 0,
            down_run: 0,
        })
    }

    /// Feeds the next close and compares it with the close `lookback` bars earlier.
    pub fn observe(&mut self, close: f64) -> SequenceReading {
        if self.window.len() < self.lookback {
            self.window.push_back(close);
            return SequenceReading::insufficient();
        }
        let comparison = self.window.pop_front().unwrap_or(close);
        self.window.push_back(close);
        self.compare(close, comparison)
    }

    /// Advances the runs with an explicit comparison value.
    pub fn compare(&mut self, current: f64, comparison: f64) -> SequenceReading {
        if current < comparison {
            self.down_run += 1;
            self.up_run = 0;
        } else if current > comparison {
            self.up_run += 1;
            self.down_run = 0;
        } else {
            self.up_run = 0;
            self.down_run = 0;
        }

        SequenceReading {
            has_data: true,
            buy_setup: (self.down_run > 0).then_some(self.down_run),
            sell_setup: (self.up_run > 0).then_some(self.up_run),
            buy_signal: self.down_run >= self.signal_threshold,
            sell_signal: self.up_run >= self.signal_threshold,
        }
    }
}

/// Exhaustion strategy on top of [`SequenceCounter`]: a long run of lower
/// closes is read as a buy, a long run of higher closes as a sell.
#[derive(Debug)]
pub struct MagicNine {
    settings: MagicNineSettings,
    counter: SequenceCounter,
    last_reading: SequenceReading,
}

impl MagicNine {
    pub fn new(settings: MagicNineSettings) -> Result<Self> {
        let counter = SequenceCounter::new(settings.lookback, settings.signal_threshold)?;
        Ok(Self {
            settings,
            counter,
            last_reading: SequenceReading::insufficient(),
        })
    }

    pub fn last_reading(&self) -> SequenceReading {
        self.last_reading
    }
}

impl Strategy for MagicNine {
    fn name(&self) -> &'static str {
        "MagicNine"
    }

    fn assess(&mut self, bar: &Bar) -> Signal {
        let Some(close) = bar.close.to_f64() else {
            tracing::warn!(timestamp = %bar.timestamp, "Close price is not representable; holding.");
            return Signal::Hold;
        };

        let reading = self.counter.observe(close);
        self.last_reading = reading;

        if reading.buy_signal {
            tracing::debug!(timestamp = %bar.timestamp, run = ?reading.buy_setup, "Buy setup complete.");
            Signal::GoLong { confidence: self.settings.confidence }
        } else if reading.sell_signal {
            tracing::debug!(timestamp = %bar.timestamp, run = ?reading.sell_setup, "Sell setup complete.");
            Signal::GoShort { confidence: self.settings.confidence }
        } else {
            Signal::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn readings(closes: &[f64], lookback: usize, threshold: u32) -> Vec<SequenceReading> {
        let mut counter = SequenceCounter::new(lookback, threshold).unwrap();
        closes.iter().map(|c| counter.observe(*c)).collect()
    }

    #[test]
    fn falling_closes_trigger_buy_on_sixth_bar() {
        let out = readings(&[10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0], 1, 5);

        assert_eq!(out[0], SequenceReading::insufficient());
        let first_buy = out.iter().position(|r| r.buy_signal);
        assert_eq!(first_buy, Some(5));
        assert!(out[6].buy_signal);
        assert_eq!(out[6].buy_setup, Some(6));
        assert_eq!(out[6].run_length(), Some(-6));
        assert!(out.iter().all(|r| !r.sell_signal && r.sell_setup.is_none()));
    }

    #[test]
    fn alternating_closes_never_signal() {
        let out = readings(&[10.0, 11.0, 10.0, 11.0], 1, 5);
        assert!(out.iter().all(|r| !r.buy_signal && !r.sell_signal));
        assert_eq!(out[1].run_length(), Some(1));
        assert_eq!(out[2].run_length(), Some(-1));
    }

    #[test]
    fn warm_up_spans_lookback_bars() {
        let out = readings(&[1.0, 2.0, 3.0, 4.0, 5.0], 2, 5);
        assert!(!out[0].has_data && !out[1].has_data);
        assert!(out[2].has_data);
        // 3 vs 1, 4 vs 2, 5 vs 3
        assert_eq!(out[4].sell_setup, Some(3));
    }

    #[test]
    fn equal_close_resets_both_runs() {
        let mut counter = SequenceCounter::new(1, 3).unwrap();
        counter.compare(2.0, 3.0);
        counter.compare(1.0, 2.0);
        let flat = counter.compare(1.0, 1.0);
        assert_eq!(flat.buy_setup, None);
        assert_eq!(flat.sell_setup, None);
        assert_eq!(flat.run_length(), None);
        assert!(flat.has_data);
    }

    #[test]
    fn rising_run_reaches_sell_signal() {
        let out = readings(&[1.0, 2.0, 3.0, 4.0], 1, 3);
        assert!(!out[2].sell_signal);
        assert!(out[3].sell_signal);
    }

    #[test]
    fn rejects_non_positive_parameters() {
        assert!(matches!(SequenceCounter::new(0, 5), Err(Error::InvalidParameters(_))));
        assert!(matches!(SequenceCounter::new(2, 0), Err(Error::InvalidParameters(_))));
    }

    #[test]
    fn strategy_maps_readings_to_signals() {
        let settings = MagicNineSettings {
            lookback: 1,
            signal_threshold: 2,
            confidence: 0.8,
        };
        let mut strategy = MagicNine::new(settings).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let signals: Vec<Signal> = [100, 99, 98, 99, 100, 101]
            .iter()
            .enumerate()
            .map(|(i, c)| {
                strategy.assess(&Bar {
                    timestamp: start + TimeDelta::hours(i as i64),
                    close: Decimal::from(*c),
                })
            })
            .collect();

        assert_eq!(signals[0], Signal::Hold);
        assert_eq!(signals[1], Signal::Hold);
        assert_eq!(signals[2], Signal::GoLong { confidence: 0.8 });
        assert_eq!(signals[3], Signal::Hold);
        assert_eq!(signals[4], Signal::GoShort { confidence: 0.8 });
        assert_eq!(strategy.last_reading().sell_setup, Some(3));
    }
}
