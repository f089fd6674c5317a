// In crates/analytics/src/ratios.rs

use serde::Serialize;

use crate::types::AnalysisSettings;

/// Downside deviation substituted when no return falls below the target,
/// so strategies without losing periods still get a bounded ratio.
pub const DOWNSIDE_DEVIATION_FLOOR: f64 = 0.001;

const ZERO_VARIANCE: f64 = 1e-12;

/// Sortino ratio together with the downside deviation it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SortinoRatio {
    pub ratio: f64,
    pub downside_deviation: f64,
}

/// Risk-adjusted ratio calculator bound to one set of analysis settings.
#[derive(Debug, Clone)]
pub struct RatioCalculator {
    target_return: f64,
    risk_free_rate: f64,
    periods_per_year: f64,
    annualize: bool,
}

impl RatioCalculator {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            target_return: settings.target_return,
            risk_free_rate: settings.risk_free_rate,
            periods_per_year: settings.annualization_factor(),
            annualize: settings.annualize,
        }
    }

    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }

    pub fn sharpe(&self, returns: &[f64]) -> f64 {
        sharpe(returns, self.risk_free_rate, self.periods_per_year)
    }

    pub fn sortino(&self, returns: &[f64]) -> SortinoRatio {
        sortino(
            returns,
            self.target_return,
            self.risk_free_rate,
            self.periods_per_year,
            self.annualize,
        )
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); `None` with fewer than two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Annualized Sharpe ratio of periodic returns over a per-period risk-free rate.
///
/// NaN with fewer than two returns or when the excess returns have no variance.
pub fn sharpe(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let rf_period = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - rf_period).collect();

    match (mean(&excess), std_dev(&excess)) {
        (Some(avg), Some(std)) if std > ZERO_VARIANCE => periods_per_year.sqrt() * avg / std,
        _ => f64::NAN,
    }
}

/// Sortino ratio using the target downside deviation.
///
/// With `annualize`, `target_return` and `risk_free_rate` are annual figures
/// scaled down to one period, and the ratio is scaled up by `sqrt(periods_per_year)`.
/// Fewer than two returns yield a zero ratio and deviation.
pub fn sortino(
    returns: &[f64],
    target_return: f64,
    risk_free_rate: f64,
    periods_per_year: f64,
    annualize: bool,
) -> SortinoRatio {
    if returns.len() < 2 {
        return SortinoRatio::default();
    }

    let (target, risk_free) = if annualize {
        (target_return / periods_per_year, risk_free_rate / periods_per_year)
    } else {
        (target_return, risk_free_rate)
    };

    let shortfalls: Vec<f64> = returns
        .iter()
        .filter(|r| **r < target)
        .map(|r| (target - r).powi(2))
        .collect();
    let downside_deviation = match mean(&shortfalls) {
        Some(mean_square) => mean_square.sqrt(),
        None => DOWNSIDE_DEVIATION_FLOOR,
    };

    let avg = mean(returns).unwrap_or(0.0);
    let mut ratio = (avg - risk_free) / downside_deviation;
    if annualize && periods_per_year != 1.0 {
        ratio *= periods_per_year.sqrt();
    }

    tracing::trace!(mean = avg, downside_deviation, ratio, "Computed Sortino ratio.");
    SortinoRatio {
        ratio,
        downside_deviation,
    }
}

/// Annualized return over maximum drawdown magnitude.
///
/// Without any drawdown the ratio is `+inf` for a gain and 0 otherwise.
pub fn calmar(annualized_return: f64, max_drawdown: f64) -> f64 {
    let magnitude = max_drawdown.abs();
    if magnitude > 0.0 {
        annualized_return / magnitude
    } else if annualized_return > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// System Quality Number: `mean / std * sqrt(n)` over per-trade profits.
///
/// 0 with fewer than two trades or identical profits.
pub fn sqn(profits: &[f64]) -> f64 {
    match (mean(profits), std_dev(profits)) {
        (Some(avg), Some(std)) if std > ZERO_VARIANCE => avg / std * (profits.len() as f64).sqrt(),
        _ => 0.0,
    }
}
