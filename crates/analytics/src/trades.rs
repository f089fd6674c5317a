// In crates/analytics/src/trades.rs

use core_types::Trade;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::ratios;
use crate::types::{SystemQuality, TradeStats};

impl TradeStats {
    /// Summarises closed trades. `trading_days` is the number of distinct
    /// calendar dates the evaluation covered and is clamped to at least 1.
    pub fn from_trades(trades: &[Trade], trading_days: usize) -> Self {
        let mut stats = TradeStats {
            total_commission: trades.iter().map(|t| t.commission).sum(),
            ..TradeStats::default()
        };

        let profits: Vec<Decimal> = trades.iter().filter_map(|t| t.profit).collect();
        if profits.is_empty() {
            return stats;
        }

        // --- Win / Loss Breakdown ---
        let mut win_streak = 0u32;
        let mut loss_streak = 0u32;
        for profit in &profits {
            if *profit > dec!(0) {
                stats.wins += 1;
                stats.gross_profit += *profit;
                win_streak += 1;
                loss_streak = 0;
            } else if *profit < dec!(0) {
                stats.losses += 1;
                stats.gross_loss += profit.abs();
                loss_streak += 1;
                win_streak = 0;
            } else {
                stats.break_even += 1;
                win_streak = 0;
                loss_streak = 0;
            }
            stats.longest_win_streak = stats.longest_win_streak.max(win_streak);
            stats.longest_loss_streak = stats.longest_loss_streak.max(loss_streak);
        }

        stats.count = profits.len() as u32;
        stats.win_rate = stats.wins as f64 / stats.count as f64;
        stats.profit_factor = if stats.gross_loss > dec!(0) {
            (stats.gross_profit / stats.gross_loss).to_f64().unwrap_or(0.0)
        } else if stats.gross_profit > dec!(0) {
            f64::INFINITY
        } else {
            0.0
        };

        // --- Averages & Expectancy ---
        let count = Decimal::from(stats.count);
        stats.net_profit = stats.gross_profit - stats.gross_loss;
        stats.avg_trade = stats.net_profit / count;
        if stats.wins > 0 {
            stats.avg_win = stats.gross_profit / Decimal::from(stats.wins);
        }
        if stats.losses > 0 {
            stats.avg_loss = -stats.gross_loss / Decimal::from(stats.losses);
        }
        stats.win_loss_ratio = if stats.avg_loss.is_zero() {
            f64::INFINITY
        } else {
            (stats.avg_win / stats.avg_loss).abs().to_f64().unwrap_or(0.0)
        };
        let non_winning = Decimal::from(stats.count - stats.wins);
        stats.expectancy = (Decimal::from(stats.wins) * stats.avg_win + non_winning * stats.avg_loss) / count;

        // --- System Quality ---
        let as_f64: Vec<f64> = profits.iter().filter_map(|p| p.to_f64()).collect();
        stats.sqn = ratios::sqn(&as_f64);
        stats.system_quality = SystemQuality::from_sqn(stats.sqn);

        stats.avg_trades_per_day = stats.count as f64 / trading_days.max(1) as f64;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_types::{Symbol, TradeAction};

    fn exit(profit: Decimal) -> Trade {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        Trade {
            symbol: Symbol("ES".into()),
            action: TradeAction::Sell,
            entry_time: at,
            exit_time: Some(at),
            price: dec!(100),
            quantity: dec!(1),
            value: dec!(100),
            commission: dec!(0.5),
            profit: Some(profit),
        }
    }

    fn entry() -> Trade {
        Trade {
            action: TradeAction::Buy,
            exit_time: None,
            profit: None,
            ..exit(dec!(0))
        }
    }

    #[test]
    fn no_closed_trades() {
        let stats = TradeStats::from_trades(&[entry(), entry()], 3);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.profit_factor, 0.0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.win_loss_ratio, 0.0);
        assert_eq!(stats.expectancy, dec!(0));
        assert_eq!(stats.total_commission, dec!(1.0));
        assert_eq!(stats.avg_trades_per_day, 0.0);
    }

    #[test]
    fn wins_without_losses_have_infinite_profit_factor() {
        let stats = TradeStats::from_trades(&[exit(dec!(10)), exit(dec!(5))], 1);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 0);
        assert_eq!(stats.profit_factor, f64::INFINITY);
        assert_eq!(stats.win_rate, 1.0);
    }

    #[test]
    fn mixed_trades() {
        let trades = [
            entry(),
            exit(dec!(30)),
            exit(dec!(-10)),
            exit(dec!(20)),
            exit(dec!(15)),
            exit(dec!(-5)),
            exit(dec!(-5)),
            exit(dec!(0)),
        ];
        let stats = TradeStats::from_trades(&trades, 4);

        assert_eq!(stats.count, 7);
        assert_eq!(stats.wins, 3);
        assert_eq!(stats.losses, 3);
        assert!((stats.win_rate - 3.0 / 7.0).abs() < 1e-12);
        assert_eq!(stats.gross_profit, dec!(65));
        assert_eq!(stats.gross_loss, dec!(20));
        assert!((stats.profit_factor - 3.25).abs() < 1e-12);
        assert_eq!(stats.longest_win_streak, 2);
        assert_eq!(stats.longest_loss_streak, 2);
        assert_eq!(stats.total_commission, dec!(4.0));
        assert!((stats.avg_trades_per_day - 1.75).abs() < 1e-12);
    }

    #[test]
    fn averages_ratio_and_expectancy() {
        let trades = [exit(dec!(30)), exit(dec!(10)), exit(dec!(-10)), exit(dec!(-30)), exit(dec!(0))];
        let stats = TradeStats::from_trades(&trades, 1);

        assert_eq!(stats.break_even, 1);
        assert_eq!(stats.net_profit, dec!(0));
        assert_eq!(stats.avg_win, dec!(20));
        assert_eq!(stats.avg_loss, dec!(-20));
        assert_eq!(stats.avg_trade, dec!(0));
        assert!((stats.win_loss_ratio - 1.0).abs() < 1e-12);
        // 0.4 * 20 + 0.6 * -20
        assert_eq!(stats.expectancy, dec!(-4));
    }

    #[test]
    fn no_losses_means_infinite_win_loss_ratio() {
        let stats = TradeStats::from_trades(&[exit(dec!(10)), exit(dec!(5))], 1);
        assert_eq!(stats.avg_loss, dec!(0));
        assert_eq!(stats.avg_win, dec!(7.5));
        assert_eq!(stats.win_loss_ratio, f64::INFINITY);
        assert_eq!(stats.expectancy, dec!(7.5));
        assert_eq!(stats.net_profit, dec!(15));
    }

    #[test]
    fn no_wins_means_zero_average_win() {
        let stats = TradeStats::from_trades(&[exit(dec!(-4)), exit(dec!(-8))], 2);
        assert_eq!(stats.avg_win, dec!(0));
        assert_eq!(stats.avg_loss, dec!(-6));
        assert_eq!(stats.win_loss_ratio, 0.0);
        assert_eq!(stats.avg_trade, dec!(-6));
        assert_eq!(stats.expectancy, dec!(-6));
    }

    #[test]
    fn breakeven_breaks_streaks() {
        let trades = [exit(dec!(1)), exit(dec!(0)), exit(dec!(1)), exit(dec!(-1)), exit(dec!(0)), exit(dec!(-1))];
        let stats = TradeStats::from_trades(&trades, 1);
        assert_eq!(stats.longest_win_streak, 1);
        assert_eq!(stats.longest_loss_streak, 1);
    }

    #[test]
    fn sqn_is_banded() {
        let trades = [exit(dec!(10)), exit(dec!(12)), exit(dec!(11)), exit(dec!(9))];
        let stats = TradeStats::from_trades(&trades, 0);
        assert!(stats.sqn > 5.0);
        assert_eq!(stats.system_quality, SystemQuality::Superb);
        assert_eq!(stats.avg_trades_per_day, 4.0);
    }
}
