//! Performance statistics computed from simulated trade records
//!
//! Everything here is derived from trades the engine actually produced;
//! nothing is sampled or projected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::trade::{TradeKind, TradeRecord};

/// Realized P&L for one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub profit: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceTracker {
    pub entries: u32,
    pub partial_exits: u32,
    pub full_exits: u32,
    pub winning_exits: u32,
    pub losing_exits: u32,
    pub realized_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    daily: BTreeMap<NaiveDate, f64>,
    trades: Vec<TradeRecord>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: &TradeRecord) {
        match trade.kind {
            TradeKind::Entry => self.entries += 1,
            TradeKind::PartialExit => self.partial_exits += 1,
            TradeKind::FullExit => self.full_exits += 1,
        }

        if trade.is_exit() {
            let pnl = trade.profit;
            self.realized_pnl += pnl;
            *self.daily.entry(trade.timestamp.date_naive()).or_insert(0.0) += pnl;

            if pnl > 0.0 {
                self.winning_exits += 1;
                self.gross_profit += pnl;
                self.largest_win = self.largest_win.max(pnl);
            } else if pnl < 0.0 {
                self.losing_exits += 1;
                self.gross_loss += pnl.abs();
                self.largest_loss = self.largest_loss.max(pnl.abs());
            }
        }

        self.trades.push(trade.clone());
    }

    /// Win rate over exits with non-zero P&L, 0-100
    pub fn win_rate(&self) -> f64 {
        let decided = self.winning_exits + self.losing_exits;
        if decided == 0 {
            return 0.0;
        }
        self.winning_exits as f64 / decided as f64 * 100.0
    }

    /// Gross profit over gross loss
    pub fn profit_factor(&self) -> f64 {
        if self.gross_loss < 1e-12 {
            if self.gross_profit > 0.0 {
                return f64::INFINITY;
            }
            return 0.0;
        }
        self.gross_profit / self.gross_loss
    }

    pub fn daily_pnl(&self) -> Vec<DailyPnl> {
        self.daily
            .iter()
            .map(|(date, profit)| DailyPnl { date: *date, profit: *profit })
            .collect()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Side;
    use crate::domain::trade::ExitReason;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn exit(profit: f64, day: u32) -> TradeRecord {
        TradeRecord::exit(
            TradeKind::FullExit,
            Side::Long,
            1.0,
            1.0,
            Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            profit,
            profit * 100.0,
            ExitReason::TakeProfit,
        )
    }

    #[test]
    fn test_empty_tracker() {
        let tracker = PerformanceTracker::new();
        assert_eq!(tracker.win_rate(), 0.0);
        assert_eq!(tracker.profit_factor(), 0.0);
        assert!(tracker.daily_pnl().is_empty());
    }

    #[test]
    fn test_entries_do_not_move_pnl() {
        let mut tracker = PerformanceTracker::new();
        tracker.record(&TradeRecord::entry(Side::Long, 1.0, 1.0, Utc::now()));
        assert_eq!(tracker.entries, 1);
        assert_eq!(tracker.realized_pnl, 0.0);
        assert!(tracker.daily_pnl().is_empty());
    }

    #[test]
    fn test_wins_losses_and_daily_series() {
        let mut tracker = PerformanceTracker::new();
        tracker.record(&exit(2.0, 1));
        tracker.record(&exit(-1.0, 1));
        tracker.record(&exit(3.0, 2));

        assert_eq!(tracker.full_exits, 3);
        assert_relative_eq!(tracker.realized_pnl, 4.0);
        assert_relative_eq!(tracker.win_rate(), 200.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(tracker.profit_factor(), 5.0);
        assert_eq!(tracker.largest_win, 3.0);
        assert_eq!(tracker.largest_loss, 1.0);

        let daily = tracker.daily_pnl();
        assert_eq!(daily.len(), 2);
        assert_relative_eq!(daily[0].profit, 1.0);
        assert_relative_eq!(daily[1].profit, 3.0);
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let mut tracker = PerformanceTracker::new();
        tracker.record(&exit(1.0, 5));
        assert!(tracker.profit_factor().is_infinite());
    }
}
