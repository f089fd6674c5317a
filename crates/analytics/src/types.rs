// In crates/analytics/src/types.rs

use core_types::{EquityPoint, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::drawdown::DrawdownEpisode;

/// Sampling frequency of the equity curve.
///
/// Only used to pick a default annualization factor when none is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Ticks,
    Seconds,
    Minutes,
    Hours,
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Number of return periods per year for this frequency.
    ///
    /// Intraday frequencies have no canonical count and fall back to the
    /// trading-day factor.
    pub fn periods_per_year(self) -> f64 {
        match self {
            Frequency::Daily => 252.0,
            Frequency::Weekly => 52.0,
            Frequency::Monthly => 12.0,
            Frequency::Yearly => 1.0,
            Frequency::Ticks | Frequency::Seconds | Frequency::Minutes | Frequency::Hours => 252.0,
        }
    }
}

/// Parameters for return and ratio calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Minimum acceptable return for the Sortino ratio, annual when `annualize` is set.
    #[serde(default)]
    pub target_return: f64,
    /// Annual risk-free rate when `annualize` is set, per period otherwise.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    #[serde(default = "default_annualize")]
    pub annualize: bool,
    /// Explicit annualization factor. Derived from `frequency` when absent.
    #[serde(default)]
    pub periods_per_year: Option<f64>,
    #[serde(default)]
    pub frequency: Frequency,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            target_return: 0.0,
            risk_free_rate: default_risk_free_rate(),
            annualize: default_annualize(),
            periods_per_year: None,
            frequency: Frequency::default(),
        }
    }
}

impl AnalysisSettings {
    /// The annualization factor in effect: the explicit value if it is
    /// positive, otherwise the default for the sampling frequency.
    pub fn annualization_factor(&self) -> f64 {
        self.periods_per_year
            .filter(|factor| *factor > 0.0)
            .unwrap_or_else(|| self.frequency.periods_per_year())
    }
}

fn default_risk_free_rate() -> f64 {
    0.01
}

fn default_annualize() -> bool {
    true
}

/// The inputs of one backtest evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationRun {
    #[serde(default)]
    pub name: Option<String>,
    pub equity: Vec<EquityPoint>,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

/// Van Tharp's qualitative bands for the System Quality Number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemQuality {
    #[default]
    Poor,
    Average,
    Good,
    Excellent,
    Superb,
}

impl SystemQuality {
    pub fn from_sqn(sqn: f64) -> Self {
        if sqn < 1.0 {
            SystemQuality::Poor
        } else if sqn < 2.0 {
            SystemQuality::Average
        } else if sqn < 3.0 {
            SystemQuality::Good
        } else if sqn < 5.0 {
            SystemQuality::Excellent
        } else {
            SystemQuality::Superb
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnStats {
    /// `last / first - 1`.
    pub total: f64,
    /// Compounded over calendar days; 0 for same-day series.
    pub annualized: f64,
    /// Mean periodic return.
    pub mean: f64,
    /// Sample standard deviation of periodic returns.
    pub stddev: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskStats {
    pub annual_volatility: f64,
    /// NaN when there are fewer than two returns or no variance.
    #[serde(with = "crate::sentinel")]
    pub sharpe: f64,
    #[serde(with = "crate::sentinel")]
    pub sortino: f64,
    pub downside_deviation: f64,
    /// Reported as a loss, e.g. `-0.30` for a 30% drawdown.
    pub max_drawdown: f64,
    pub max_drawdown_points: u32,
    pub max_drawdown_days: Option<i64>,
    #[serde(with = "crate::sentinel")]
    pub calmar: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeStats {
    /// Closed trades, i.e. trades carrying a realised profit.
    pub count: u32,
    pub wins: u32,
    pub losses: u32,
    pub break_even: u32,
    pub win_rate: f64,
    /// `+inf` with no losing trades, 0 with no closed trades.
    #[serde(with = "crate::sentinel")]
    pub profit_factor: f64,
    pub gross_profit: Decimal,
    /// Positive sum of losing profits.
    pub gross_loss: Decimal,
    pub net_profit: Decimal,
    /// 0 without winning trades.
    pub avg_win: Decimal,
    /// Mean losing profit, negative; 0 without losing trades.
    pub avg_loss: Decimal,
    pub avg_trade: Decimal,
    /// `|avg_win / avg_loss|`; `+inf` with no losing trades, 0 with no closed trades.
    #[serde(with = "crate::sentinel")]
    pub win_loss_ratio: f64,
    /// `win_rate * avg_win + (1 - win_rate) * avg_loss`.
    pub expectancy: Decimal,
    pub total_commission: Decimal,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    pub sqn: f64,
    pub system_quality: SystemQuality,
    pub avg_trades_per_day: f64,
}

/// A comprehensive report of a strategy's performance over a backtest period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub returns: ReturnStats,
    pub risk: RiskStats,
    pub trades: TradeStats,
    /// Completed and still-open drawdown episodes in chronological order.
    pub drawdowns: Vec<DrawdownEpisode>,
}

impl PerformanceReport {
    /// Creates a new, empty report with zeroed values.
    pub fn new() -> Self {
        Self::default()
    }
}
