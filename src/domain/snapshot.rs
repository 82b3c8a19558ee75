//! Market snapshot - the point-in-time view used for one evaluation cycle

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate buy/sell pressure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Mid of best bid and best ask
    pub price: f64,
    pub observed_at: DateTime<Utc>,
    pub trend: Trend,
    /// Share of buy-tagged fills among recent fills, 0-100
    pub bullish_pct: f64,
    pub fill_count: usize,
    /// Quote volume inside the lookback window
    pub window_volume: f64,
    /// Quote volume in the window immediately before
    pub prev_window_volume: f64,
    /// Price of the oldest fill inside the lookback window
    pub window_open_price: Option<f64>,
    pub token_age: Option<Duration>,
    pub market_cap: Option<f64>,
}

impl MarketSnapshot {
    /// Snapshot with only a price and trend, used where token data is irrelevant
    pub fn priced(price: f64, bullish_pct: f64, trend: Trend, observed_at: DateTime<Utc>) -> Self {
        Self {
            price,
            observed_at,
            trend,
            bullish_pct,
            fill_count: 0,
            window_volume: 0.0,
            prev_window_volume: 0.0,
            window_open_price: None,
            token_age: None,
            market_cap: None,
        }
    }

    /// The most recent window closed above where it opened.
    /// A window with no fills is never green.
    pub fn is_green_candle(&self) -> bool {
        match self.window_open_price {
            Some(open) => self.price > open,
            None => false,
        }
    }

    /// Volume acceleration versus the previous window, in percent.
    /// 100 when there was no previous volume.
    pub fn volume_change_pct(&self) -> f64 {
        if self.prev_window_volume > 0.0 {
            (self.window_volume - self.prev_window_volume) / self.prev_window_volume * 100.0
        } else {
            100.0
        }
    }

    pub fn token_age_minutes(&self) -> Option<f64> {
        self.token_age.map(|age| age.num_milliseconds() as f64 / 60_000.0)
    }
}
