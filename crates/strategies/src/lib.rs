// In crates/strategies/src/lib.rs

use core_types::{Bar, Signal};
pub mod error;
pub mod factory;
pub mod magic_nine;
pub mod types;

pub use error::{Error, Result};
pub use magic_nine::{MagicNine, SequenceCounter, SequenceReading};

/// The universal interface for a trading strategy.
///
/// A strategy is responsible for analyzing market data and producing a trading `Signal`.
/// It is a stateful entity fed one bar at a time, in timestamp order.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    fn assess(&mut self, bar: &Bar) -> Signal;
}
