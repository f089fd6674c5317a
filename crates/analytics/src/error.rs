// In crates/analytics/src/error.rs

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Equity point {index} at {current} is earlier than the previous point at {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Trade {index} has an exit time but no realised profit")]
    MissingProfit { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
