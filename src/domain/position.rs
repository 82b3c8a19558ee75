use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// An open position. Closed positions are not represented; the engine
/// holds `Option<Position>` and drops it on full exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    /// Remaining size in base-asset units
    pub size: f64,
    pub entered_at: DateTime<Utc>,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub partial_taken: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PositionError {
    #[error("Invalid size: {0}")]
    InvalidSize(f64),
    #[error("Invalid entry price: {0}")]
    InvalidEntryPrice(f64),
    #[error("Partial exit already taken")]
    PartialAlreadyTaken,
    #[error("Partial exit of {requested} would not leave a remainder of {size}")]
    PartialTooLarge { requested: f64, size: f64 },
}

impl Position {
    /// Open a position. Stop and target prices are percentage offsets from
    /// entry in the direction of the side.
    pub fn open(
        side: Side,
        entry_price: f64,
        size: f64,
        entered_at: DateTime<Utc>,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Result<Self, PositionError> {
        if !(entry_price > 0.0) || !entry_price.is_finite() {
            return Err(PositionError::InvalidEntryPrice(entry_price));
        }
        if !(size > 0.0) || !size.is_finite() {
            return Err(PositionError::InvalidSize(size));
        }

        let sign = side.sign();
        Ok(Self {
            side,
            entry_price,
            size,
            entered_at,
            stop_loss_price: entry_price * (1.0 - sign * stop_loss_pct / 100.0),
            take_profit_price: entry_price * (1.0 + sign * take_profit_pct / 100.0),
            partial_taken: false,
        })
    }

    /// Signed profit percentage at `price`, relative to entry
    pub fn profit_pct(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Realized profit for closing `size` units at `price`
    pub fn profit_for(&self, price: f64, size: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * size
    }

    /// Entry value of the remaining size
    pub fn notional(&self) -> f64 {
        self.entry_price * self.size
    }

    /// Reduce the position by `exit_size`, marking the partial exit as taken.
    /// Entry price, stop and target stay as they were.
    pub fn take_partial(&mut self, exit_size: f64) -> Result<(), PositionError> {
        if self.partial_taken {
            return Err(PositionError::PartialAlreadyTaken);
        }
        if !(exit_size > 0.0) {
            return Err(PositionError::InvalidSize(exit_size));
        }
        if exit_size >= self.size {
            return Err(PositionError::PartialTooLarge {
                requested: exit_size,
                size: self.size,
            });
        }
        self.size -= exit_size;
        self.partial_taken = true;
        Ok(())
    }
}
