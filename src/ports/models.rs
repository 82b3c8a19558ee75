//! Raw market data structures exchanged with market data adapters

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};

/// One price level of an order book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Order book levels. Neither side is assumed to be sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    /// Highest bid price
    pub fn best_bid(&self) -> Option<f64> {
        self.bids
            .iter()
            .map(|level| level.price)
            .filter(|price| price.is_finite() && *price > 0.0)
            .fold(None, |best, price| Some(best.map_or(price, |b: f64| b.max(price))))
    }

    /// Lowest ask price
    pub fn best_ask(&self) -> Option<f64> {
        self.asks
            .iter()
            .map(|level| level.price)
            .filter(|price| price.is_finite() && *price > 0.0)
            .fold(None, |best, price| Some(best.map_or(price, |b: f64| b.min(price))))
    }

    /// Mid of best bid and best ask; None when either side is empty
    pub fn mid_price(&self) -> Option<f64> {
        Some((self.best_bid()? + self.best_ask()?) / 2.0)
    }
}

/// Aggressor side of a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillSide {
    Buy,
    Sell,
}

/// An executed trade on the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub side: FillSide,
    /// Base-asset size
    pub size: f64,
    pub price: f64,
}

impl Fill {
    /// Quote value of the fill
    pub fn quote_volume(&self) -> f64 {
        self.size * self.price
    }
}

/// Token metadata used only by entry filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStats {
    pub launched_at: DateTime<Utc>,
    pub market_cap: f64,
}

/// Everything a market data source returns for one poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFrame {
    #[serde(default)]
    pub order_book: OrderBook,
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub token: Option<TokenStats>,
    /// Frame time; replay feeds set this, live feeds leave it empty
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl MarketFrame {
    /// Drop fills the query does not ask for. Ordering is preserved.
    pub fn retain_fills(&mut self, query: &FillQuery) {
        let reference = self
            .observed_at
            .or_else(|| self.fills.iter().map(|fill| fill.timestamp).max());
        let Some(reference) = reference else {
            return;
        };
        let cutoff = reference - query.lookback;

        let recent_floor = if query.recent == 0 {
            None
        } else if self.fills.len() <= query.recent {
            return;
        } else {
            let mut times: Vec<DateTime<Utc>> = self.fills.iter().map(|fill| fill.timestamp).collect();
            times.sort_unstable_by(|a, b| b.cmp(a));
            Some(times[query.recent - 1])
        };

        self.fills.retain(|fill| {
            fill.timestamp > cutoff || recent_floor.is_some_and(|floor| fill.timestamp >= floor)
        });
    }
}

/// Which fills a frame must carry: the newest `recent` fills plus every
/// fill newer than `lookback` before the frame time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillQuery {
    pub recent: usize,
    pub lookback: Duration,
}

impl FillQuery {
    pub fn new(recent: usize, lookback: Duration) -> Self {
        Self { recent, lookback }
    }
}

// Timestamps are serialized as RFC 3339 strings in UTC.
// Enums use snake_case naming in serialization.

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64) -> BookLevel {
        BookLevel { price, size: 1.0 }
    }

    #[test]
    fn test_mid_price_ignores_ordering() {
        let book = OrderBook {
            bids: vec![level(98.0), level(99.0), level(97.0)],
            asks: vec![level(102.0), level(101.0)],
        };
        assert_eq!(book.best_bid(), Some(99.0));
        assert_eq!(book.best_ask(), Some(101.0));
        assert_eq!(book.mid_price(), Some(100.0));
    }

    #[test]
    fn test_mid_price_needs_both_sides() {
        let book = OrderBook {
            bids: vec![level(99.0)],
            asks: vec![],
        };
        assert!(book.mid_price().is_none());
        assert!(OrderBook::default().mid_price().is_none());
    }

    fn fill_at(at: DateTime<Utc>) -> Fill {
        Fill { timestamp: at, side: FillSide::Buy, size: 1.0, price: 1.0 }
    }

    #[test]
    fn test_retain_fills_keeps_whole_lookback_window() {
        let observed = DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z").unwrap().with_timezone(&Utc);
        let mut frame = MarketFrame {
            fills: (0..300).map(|i| fill_at(observed - Duration::seconds(i + 1))).collect(),
            observed_at: Some(observed),
            ..MarketFrame::default()
        };

        // 300 fills within the last five minutes; all of them are in range
        frame.retain_fills(&FillQuery::new(100, Duration::minutes(10)));
        assert_eq!(frame.fills.len(), 300);

        // A short lookback falls back to the newest `recent` fills
        frame.retain_fills(&FillQuery::new(100, Duration::seconds(30)));
        assert_eq!(frame.fills.len(), 100);
        assert!(frame.fills.iter().all(|f| f.timestamp >= observed - Duration::seconds(100)));
    }

    #[test]
    fn test_retain_fills_drops_stale_fills_beyond_recent() {
        let observed = DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z").unwrap().with_timezone(&Utc);
        let mut frame = MarketFrame {
            fills: vec![
                fill_at(observed - Duration::hours(3)),
                fill_at(observed - Duration::minutes(5)),
                fill_at(observed - Duration::minutes(2)),
            ],
            observed_at: Some(observed),
            ..MarketFrame::default()
        };

        frame.retain_fills(&FillQuery::new(1, Duration::minutes(10)));
        assert_eq!(frame.fills.len(), 2);
        assert_eq!(frame.fills[0].timestamp, observed - Duration::minutes(5));

        frame.retain_fills(&FillQuery::new(0, Duration::minutes(3)));
        assert_eq!(frame.fills.len(), 1);
    }

    #[test]
    fn test_frame_deserializes_with_defaults() {
        let frame: MarketFrame = serde_json::from_str(
            r#"{"order_book":{"bids":[{"price":1.0,"size":2.0}]}}"#,
        )
        .unwrap();
        assert_eq!(frame.order_book.bids.len(), 1);
        assert!(frame.order_book.asks.is_empty());
        assert!(frame.fills.is_empty());
        assert!(frame.token.is_none());
    }
}
