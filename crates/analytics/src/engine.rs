// In crates/analytics/src/engine.rs

use std::collections::HashSet;

use core_types::{EquityPoint, Trade};
use rayon::prelude::*;
use rust_decimal::prelude::*;

use crate::drawdown::DrawdownTracker;
use crate::error::{Error, Result};
use crate::ratios::{self, RatioCalculator};
use crate::types::{AnalysisSettings, EvaluationRun, PerformanceReport, ReturnStats, RiskStats, TradeStats};

/// The engine responsible for calculating performance metrics from an
/// equity curve and its trades.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    settings: AnalysisSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Calculates a full performance report.
    ///
    /// Degenerate input produces neutral values rather than an error; an empty
    /// equity curve yields a zeroed report. Equity points are assumed to be in
    /// timestamp order, see [`AnalyticsEngine::build_checked`].
    pub fn build(&self, equity: &[EquityPoint], trades: &[Trade]) -> PerformanceReport {
        let (Some(first), Some(last)) = (equity.first(), equity.last()) else {
            return PerformanceReport::new();
        };
        let calculator = RatioCalculator::new(&self.settings);
        let ppy = calculator.periods_per_year();

        // --- Returns ---
        let periodic = periodic_returns(equity);
        let total = growth(first.value, last.value).map_or(0.0, |g| g - 1.0);
        let days = (last.timestamp - first.timestamp).num_days();
        let annualized = if days > 0 {
            annualize(total, days)
        } else {
            0.0
        };
        let stddev = ratios::std_dev(&periodic).unwrap_or(0.0);
        let returns = ReturnStats {
            total,
            annualized,
            mean: ratios::mean(&periodic).unwrap_or(0.0),
            stddev,
        };

        // --- Drawdown ---
        let mut tracker = DrawdownTracker::new();
        for point in equity {
            tracker.observe(point);
        }
        let (max_dd, drawdowns) = tracker.finalize();

        // --- Risk ---
        let sortino = calculator.sortino(&periodic);
        let risk = RiskStats {
            annual_volatility: stddev * ppy.sqrt(),
            sharpe: calculator.sharpe(&periodic),
            sortino: sortino.ratio,
            downside_deviation: sortino.downside_deviation,
            max_drawdown: if max_dd.magnitude > 0.0 { -max_dd.magnitude } else { 0.0 },
            max_drawdown_points: max_dd.duration_points,
            max_drawdown_days: max_dd.calendar_days(),
            calmar: ratios::calmar(annualized, max_dd.magnitude),
        };

        // --- Trades ---
        let trading_days = equity
            .iter()
            .map(|p| p.timestamp.date_naive())
            .collect::<HashSet<_>>()
            .len();
        let trades = TradeStats::from_trades(trades, trading_days);

        tracing::info!(
            points = equity.len(),
            trades = trades.count,
            total_return = returns.total,
            max_drawdown = risk.max_drawdown,
            episodes = drawdowns.len(),
            "Performance report built."
        );

        PerformanceReport {
            returns,
            risk,
            trades,
            drawdowns,
        }
    }

    /// Like [`AnalyticsEngine::build`], but rejects out-of-order equity points
    /// and closing trades without a realised profit.
    pub fn build_checked(&self, equity: &[EquityPoint], trades: &[Trade]) -> Result<PerformanceReport> {
        if let Some((index, pair)) = equity
            .windows(2)
            .enumerate()
            .find(|(_, pair)| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(Error::NonMonotonicTimestamp {
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }

        if let Some(index) = trades
            .iter()
            .position(|t| t.exit_time.is_some() && t.profit.is_none())
        {
            return Err(Error::MissingProfit { index });
        }

        Ok(self.build(equity, trades))
    }

    /// Builds one report per run in parallel. Each run gets its own tracker
    /// and accumulators; output order matches input order.
    pub fn build_many(&self, runs: &[EvaluationRun]) -> Vec<PerformanceReport> {
        runs.par_iter()
            .map(|run| self.build(&run.equity, &run.trades))
            .collect()
    }
}

/// Simple returns between consecutive points. Pairs starting from a zero
/// value are skipped.
fn periodic_returns(equity: &[EquityPoint]) -> Vec<f64> {
    equity
        .windows(2)
        .filter_map(|pair| growth(pair[0].value, pair[1].value))
        .map(|g| g - 1.0)
        .collect()
}

fn growth(from: Decimal, to: Decimal) -> Option<f64> {
    if from.is_zero() {
        return None;
    }
    to.checked_div(from).and_then(|g| g.to_f64())
}

fn annualize(total: f64, days: i64) -> f64 {
    let growth = 1.0 + total;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(365.0 / days as f64) - 1.0
}
