use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Side;

/// What a trade record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeKind {
    Entry,
    PartialExit,
    FullExit,
}

/// Why a trade happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    EntrySignal,
    StopLoss,
    TakeProfit,
    PartialTakeProfit,
    TrendReversal,
    Manual,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::EntrySignal => "entry signal",
            ExitReason::StopLoss => "stop loss",
            ExitReason::TakeProfit => "take profit",
            ExitReason::PartialTakeProfit => "partial take profit",
            ExitReason::TrendReversal => "trend reversal",
            ExitReason::Manual => "manual",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulated trade produced by one evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub kind: TradeKind,
    pub side: Side,
    pub price: f64,
    /// Size in base-asset units
    pub size: f64,
    pub timestamp: DateTime<Utc>,
    /// Realized profit for exits. Always 0 for entries.
    pub profit: f64,
    /// Profit relative to entry, in percent
    pub profit_pct: f64,
    pub reason: ExitReason,
}

impl TradeRecord {
    pub fn entry(side: Side, price: f64, size: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: TradeKind::Entry,
            side,
            price,
            size,
            timestamp,
            profit: 0.0,
            profit_pct: 0.0,
            reason: ExitReason::EntrySignal,
        }
    }

    pub fn exit(
        kind: TradeKind,
        side: Side,
        price: f64,
        size: f64,
        timestamp: DateTime<Utc>,
        profit: f64,
        profit_pct: f64,
        reason: ExitReason,
    ) -> Self {
        Self {
            kind,
            side,
            price,
            size,
            timestamp,
            profit,
            profit_pct,
            reason,
        }
    }

    /// Quote-currency value of the trade
    pub fn notional(&self) -> f64 {
        self.price * self.size
    }

    pub fn is_exit(&self) -> bool {
        self.kind != TradeKind::Entry
    }

    /// Entry value of the traded size, recovered from price and profit
    pub fn entry_value(&self) -> f64 {
        self.notional() - self.side.sign() * self.profit
    }

    /// Change in quote balance when this trade settles: entries lock the
    /// entry value, exits release it together with the profit
    pub fn cash_delta(&self) -> f64 {
        match self.kind {
            TradeKind::Entry => -self.notional(),
            TradeKind::PartialExit | TradeKind::FullExit => self.entry_value() + self.profit,
        }
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TradeKind::Entry => write!(
                f,
                "ENTRY {} {:.6} @ {:.6}",
                self.side, self.size, self.price
            ),
            TradeKind::PartialExit | TradeKind::FullExit => write!(
                f,
                "EXIT {} {:.6} @ {:.6} ({}) P/L {:.6} ({:.2}%)",
                self.side, self.size, self.price, self.reason, self.profit, self.profit_pct
            ),
        }
    }
}
