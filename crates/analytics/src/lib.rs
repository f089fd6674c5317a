// In crates/analytics/src/lib.rs

pub mod drawdown;
pub mod engine;
pub mod error;
pub mod ratios;
mod sentinel;
pub mod trades;
pub mod types;

// Re-export the most important types for easy access.
pub use drawdown::{DrawdownEpisode, DrawdownState, DrawdownSummary, DrawdownTracker};
pub use engine::AnalyticsEngine;
pub use error::{Error, Result};
pub use ratios::{RatioCalculator, SortinoRatio};
pub use types::{AnalysisSettings, EvaluationRun, Frequency, PerformanceReport, SystemQuality};
