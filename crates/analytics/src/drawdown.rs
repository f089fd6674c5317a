// In crates/analytics/src/drawdown.rs

use chrono::{DateTime, TimeDelta, Utc};
use core_types::EquityPoint;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// One peak-to-recovery drawdown period.
///
/// `end` is the timestamp of the sample that made a new peak, or the last
/// sample of the series when the drawdown never recovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub trough_at: DateTime<Utc>,
    pub peak_value: Decimal,
    pub trough_value: Decimal,
    /// `(peak - trough) / peak`, clamped to `[0, 1]`.
    pub magnitude: f64,
    /// Number of consecutive samples strictly below the peak.
    pub duration_points: u32,
}

/// The deepest drawdown observed so far.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DrawdownSummary {
    pub magnitude: f64,
    pub duration_points: u32,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DrawdownSummary {
    /// Calendar days from peak to trough, counting a partial day as a full one.
    pub fn calendar_days(&self) -> Option<i64> {
        let (start, end) = (self.start?, self.end?);
        let delta = end - start;
        let days = delta.num_days();
        let remainder = delta - TimeDelta::days(days);
        Some(if remainder > TimeDelta::zero() { days + 1 } else { days })
    }
}

/// Where the tracker stands after the last sample.
///
/// `AtPeak` means the last sample equalled the running peak. A run opened
/// earlier stays open until a sample exceeds the peak, so `AtPeak` can sit
/// between two `InDrawdown` samples of the same episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawdownState {
    #[default]
    NoPeak,
    AtPeak,
    InDrawdown,
}

/// Streaming peak/trough tracker over an equity curve.
///
/// Samples must be observed in timestamp order.
#[derive(Debug, Clone, Default)]
pub struct DrawdownTracker {
    state: DrawdownState,
    peak: Decimal,
    peak_date: Option<DateTime<Utc>>,
    current_dd_points: u32,
    // Lowest sample of the open run.
    trough: Option<(DateTime<Utc>, Decimal)>,
    last_timestamp: Option<DateTime<Utc>>,
    max: DrawdownSummary,
    episodes: Vec<DrawdownEpisode>,
}

impl DrawdownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawdownState {
        self.state
    }

    /// The deepest drawdown seen so far.
    pub fn max_drawdown(&self) -> &DrawdownSummary {
        &self.max
    }

    /// Episodes completed by a recovery so far.
    pub fn episodes(&self) -> &[DrawdownEpisode] {
        &self.episodes
    }

    pub fn observe(&mut self, point: &EquityPoint) {
        self.last_timestamp = Some(point.timestamp);

        let Some(peak_date) = self.peak_date else {
            self.reset_peak(point);
            return;
        };

        if point.value > self.peak {
            if self.current_dd_points > 0 {
                self.close_run(peak_date, point.timestamp);
            }
            self.reset_peak(point);
        } else if point.value < self.peak {
            self.current_dd_points += 1;
            self.state = DrawdownState::InDrawdown;

            let is_new_trough = self.trough.is_none_or(|(_, trough)| point.value < trough);
            if is_new_trough {
                self.trough = Some((point.timestamp, point.value));
            }

            let dd = drawdown_fraction(self.peak, point.value);
            if dd > self.max.magnitude {
                self.max = DrawdownSummary {
                    magnitude: dd,
                    duration_points: self.current_dd_points,
                    start: Some(peak_date),
                    end: Some(point.timestamp),
                };
                tracing::debug!(
                    drawdown = dd,
                    points = self.current_dd_points,
                    from = %peak_date,
                    to = %point.timestamp,
                    "New maximum drawdown."
                );
            }
        } else {
            // Equal to the peak: the open run is neither extended nor closed.
            self.state = DrawdownState::AtPeak;
        }
    }

    /// Closes any open run at the last observed sample and returns the
    /// maximum-drawdown summary together with the full episode history.
    pub fn finalize(mut self) -> (DrawdownSummary, Vec<DrawdownEpisode>) {
        if self.current_dd_points > 0 {
            if let (Some(peak_date), Some(last)) = (self.peak_date, self.last_timestamp) {
                self.close_run(peak_date, last);
            }
        }
        (self.max, self.episodes)
    }

    fn reset_peak(&mut self, point: &EquityPoint) {
        self.peak = point.value;
        self.peak_date = Some(point.timestamp);
        self.current_dd_points = 0;
        self.trough = None;
        self.state = DrawdownState::AtPeak;
    }

    fn close_run(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        if let Some((trough_at, trough_value)) = self.trough.take() {
            self.episodes.push(DrawdownEpisode {
                start,
                end,
                trough_at,
                peak_value: self.peak,
                trough_value,
                magnitude: drawdown_fraction(self.peak, trough_value),
                duration_points: self.current_dd_points,
            });
        }
        self.current_dd_points = 0;
    }
}

/// `(peak - value) / peak` clamped to `[0, 1]`; 0 for a non-positive peak.
pub fn drawdown_fraction(peak: Decimal, value: Decimal) -> f64 {
    if peak <= Decimal::ZERO {
        return 0.0;
    }
    peak.checked_sub(value)
        .and_then(|loss| loss.checked_div(peak))
        .and_then(|dd| dd.to_f64())
        .unwrap_or(1.0)
        .clamp(0.0, 1.0)
}
