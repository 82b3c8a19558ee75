//! Backtest - replay recorded frames through the decision engine
//!
//! Runs synchronously, one frame per cycle, against a simulated balance.
//! Performance numbers come only from the trades produced.

use chrono::Utc;
use serde::Serialize;

use crate::domain::{PerformanceTracker, Position, TradeRecord};
use crate::ports::models::MarketFrame;
use crate::strategy::{build_snapshot, DecisionEngine, EngineConfig, EngineError};

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub cycles: usize,
    pub skipped: usize,
    pub initial_capital: f64,
    /// Cash balance after settling every trade
    pub final_capital: f64,
    /// Still open when the frames ran out
    pub open_position: Option<Position>,
    /// Mark-to-market value of the open position at the last price
    pub open_value: f64,
    pub performance: PerformanceTracker,
}

impl BacktestReport {
    pub fn trades(&self) -> &[TradeRecord] {
        self.performance.trades()
    }

    /// Cash plus open position value over initial capital, in percent
    pub fn return_pct(&self) -> f64 {
        if self.initial_capital <= 0.0 {
            return 0.0;
        }
        (self.final_capital + self.open_value - self.initial_capital) / self.initial_capital * 100.0
    }
}

pub fn run_backtest(
    config: EngineConfig,
    frames: &[MarketFrame],
    initial_capital: f64,
) -> Result<BacktestReport, EngineError> {
    let mut engine = DecisionEngine::new(config)?;
    let mut performance = PerformanceTracker::new();
    let mut balance = initial_capital;
    let mut skipped = 0;
    let mut last_price = None;

    for frame in frames {
        let (trend, entry) = (engine.config().trend.clone(), engine.config().entry.clone());
        let snapshot = match build_snapshot(frame, &trend, &entry, Utc::now()) {
            Some(snapshot) => snapshot,
            None => {
                skipped += 1;
                continue;
            }
        };
        last_price = Some(snapshot.price);

        let decision = engine.evaluate(&snapshot, Some(balance))?;
        if let Some(trade) = decision.trade() {
            balance += trade.cash_delta();
            performance.record(trade);
            tracing::debug!("Backtest trade: {}", trade);
        }
    }

    let open_position = engine.position().cloned();
    let open_value = match (&open_position, last_price) {
        (Some(position), Some(price)) => position.notional() + position.profit_for(price, position.size),
        _ => 0.0,
    };

    Ok(BacktestReport {
        cycles: frames.len(),
        skipped,
        initial_capital,
        final_capital: balance,
        open_position,
        open_value,
        performance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::models::{BookLevel, Fill, FillSide, OrderBook};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn frame(minute: i64, price: f64, bullish: bool) -> MarketFrame {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        let side = if bullish { FillSide::Buy } else { FillSide::Sell };
        MarketFrame {
            order_book: OrderBook {
                bids: vec![BookLevel { price, size: 1.0 }],
                asks: vec![BookLevel { price, size: 1.0 }],
            },
            fills: vec![Fill { timestamp: at, side, size: 1.0, price }],
            token: None,
            observed_at: Some(at),
        }
    }

    #[test]
    fn test_backtest_take_profit_cycle() {
        let frames = vec![
            frame(0, 100.0, true),
            frame(1, 102.0, true),
            MarketFrame::default(),
            frame(2, 105.0, true),
        ];
        let report = run_backtest(EngineConfig::trend_surfer(), &frames, 10.0).unwrap();

        assert_eq!(report.cycles, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.trades().len(), 2);
        assert!(report.open_position.is_none());
        assert_relative_eq!(report.final_capital, 10.25, epsilon = 1e-9);
        assert_relative_eq!(report.return_pct(), 2.5, epsilon = 1e-9);
        assert_eq!(report.performance.winning_exits, 1);
    }

    #[test]
    fn test_backtest_marks_open_position() {
        let frames = vec![frame(0, 100.0, true), frame(1, 101.0, true)];
        let report = run_backtest(EngineConfig::trend_surfer(), &frames, 10.0).unwrap();

        assert!(report.open_position.is_some());
        assert_relative_eq!(report.final_capital, 5.0, epsilon = 1e-9);
        assert_relative_eq!(report.open_value, 5.05, epsilon = 1e-9);
    }

    #[test]
    fn test_backtest_rejects_invalid_config() {
        let config = EngineConfig::trend_surfer().with_stop_loss(-1.0);
        assert!(run_backtest(config, &[], 10.0).is_err());
    }
}
