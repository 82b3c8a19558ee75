//! Market Analysis - turns a raw market frame into a snapshot
//!
//! Price is the mid of best bid and best ask. Trend is the share of
//! buy-tagged fills among the most recent fills. Window volume is the quote
//! volume of fills inside the entry lookback window.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{MarketSnapshot, Trend};
use crate::ports::models::{Fill, FillQuery, FillSide, MarketFrame};
use super::params::{EntryConfig, TrendConfig};

/// Classify buy/sell pressure. Shares within 50 ± `neutral_band` are neutral.
pub fn classify_trend(bullish_pct: f64, neutral_band: f64) -> Trend {
    if bullish_pct > 50.0 + neutral_band {
        Trend::Bullish
    } else if bullish_pct < 50.0 - neutral_band {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Share of buy fills among the `lookback` most recent fills, 0-100.
/// No fills means balanced pressure (50).
pub fn bullish_share(fills: &[Fill], lookback: usize) -> (f64, usize) {
    let mut recent: Vec<&Fill> = fills.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(lookback);

    if recent.is_empty() {
        return (50.0, 0);
    }

    let buys = recent.iter().filter(|fill| fill.side == FillSide::Buy).count();
    (buys as f64 / recent.len() as f64 * 100.0, recent.len())
}

/// Fills `build_snapshot` reads: the trend lookback plus both volume windows
pub fn fill_query(trend: &TrendConfig, entry: &EntryConfig) -> FillQuery {
    let window = Duration::minutes(entry.volume_window_minutes as i64);
    FillQuery::new(trend.fill_lookback, window * 2)
}

/// Build the snapshot for one cycle.
///
/// Returns None when the order book is missing bids or asks; the caller
/// treats that as insufficient data and skips the cycle.
pub fn build_snapshot(
    frame: &MarketFrame,
    trend: &TrendConfig,
    entry: &EntryConfig,
    now: DateTime<Utc>,
) -> Option<MarketSnapshot> {
    let price = frame.order_book.mid_price()?;
    let observed_at = frame.observed_at.unwrap_or(now);

    let (bullish_pct, fill_count) = bullish_share(&frame.fills, trend.fill_lookback);
    let window = Duration::minutes(entry.volume_window_minutes as i64);
    let window_start = observed_at - window;
    let prev_window_start = window_start - window;

    let mut window_volume = 0.0;
    let mut prev_window_volume = 0.0;
    let mut window_open: Option<&Fill> = None;

    for fill in &frame.fills {
        if fill.timestamp > window_start && fill.timestamp <= observed_at {
            window_volume += fill.quote_volume();
            if window_open.map_or(true, |open| fill.timestamp < open.timestamp) {
                window_open = Some(fill);
            }
        } else if fill.timestamp > prev_window_start && fill.timestamp <= window_start {
            prev_window_volume += fill.quote_volume();
        }
    }

    let (token_age, market_cap) = match &frame.token {
        Some(token) => (Some(observed_at - token.launched_at), Some(token.market_cap)),
        None => (None, None),
    };

    Some(MarketSnapshot {
        price,
        observed_at,
        trend: classify_trend(bullish_pct, trend.neutral_band_pct),
        bullish_pct,
        fill_count,
        window_volume,
        prev_window_volume,
        window_open_price: window_open.map(|fill| fill.price),
        token_age,
        market_cap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::models::{BookLevel, OrderBook, TokenStats};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn fill(minutes_ago: i64, side: FillSide, size: f64, price: f64) -> Fill {
        Fill {
            timestamp: now() - Duration::minutes(minutes_ago),
            side,
            size,
            price,
        }
    }

    fn book(bid: f64, ask: f64) -> OrderBook {
        OrderBook {
            bids: vec![BookLevel { price: bid, size: 1.0 }],
            asks: vec![BookLevel { price: ask, size: 1.0 }],
        }
    }

    #[test]
    fn test_fill_query_covers_both_windows() {
        let trend = TrendConfig::default();
        let entry = EntryConfig { volume_window_minutes: 5, ..EntryConfig::default() };
        let query = fill_query(&trend, &entry);
        assert_eq!(query.recent, trend.fill_lookback);
        assert_eq!(query.lookback, Duration::minutes(10));
    }

    #[test]
    fn test_classify_trend_bands() {
        assert_eq!(classify_trend(56.0, 5.0), Trend::Bullish);
        assert_eq!(classify_trend(55.0, 5.0), Trend::Neutral);
        assert_eq!(classify_trend(45.0, 5.0), Trend::Neutral);
        assert_eq!(classify_trend(44.9, 5.0), Trend::Bearish);
    }

    #[test]
    fn test_bullish_share_uses_most_recent_fills() {
        let fills = vec![
            fill(10, FillSide::Sell, 1.0, 1.0),
            fill(1, FillSide::Buy, 1.0, 1.0),
            fill(2, FillSide::Buy, 1.0, 1.0),
            fill(3, FillSide::Sell, 1.0, 1.0),
        ];
        let (share, count) = bullish_share(&fills, 3);
        assert_eq!(count, 3);
        assert_relative_eq!(share, 200.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_fills_is_neutral() {
        let (share, count) = bullish_share(&[], 100);
        assert_eq!(share, 50.0);
        assert_eq!(count, 0);
        assert_eq!(classify_trend(share, 5.0), Trend::Neutral);
    }

    #[test]
    fn test_snapshot_requires_both_book_sides() {
        let frame = MarketFrame {
            order_book: OrderBook {
                bids: vec![BookLevel { price: 1.0, size: 1.0 }],
                asks: vec![],
            },
            ..MarketFrame::default()
        };
        let snapshot = build_snapshot(&frame, &TrendConfig::default(), &EntryConfig::default(), now());
        assert!(snapshot.is_none());
    }

    #[test]
    fn test_snapshot_windows_and_candle() {
        let frame = MarketFrame {
            order_book: book(0.99, 1.01),
            fills: vec![
                fill(1, FillSide::Buy, 100.0, 0.98),
                fill(4, FillSide::Buy, 100.0, 0.95),
                fill(7, FillSide::Sell, 50.0, 0.90),
                fill(12, FillSide::Sell, 50.0, 0.90),
            ],
            token: Some(TokenStats {
                launched_at: now() - Duration::hours(2),
                market_cap: 100_000.0,
            }),
            observed_at: None,
        };

        let snapshot =
            build_snapshot(&frame, &TrendConfig::default(), &EntryConfig::default(), now()).unwrap();

        assert_relative_eq!(snapshot.price, 1.0, epsilon = 1e-12);
        assert_relative_eq!(snapshot.window_volume, 98.0 + 95.0, epsilon = 1e-9);
        assert_relative_eq!(snapshot.prev_window_volume, 45.0, epsilon = 1e-9);
        assert_eq!(snapshot.window_open_price, Some(0.95));
        assert!(snapshot.is_green_candle());
        assert_eq!(snapshot.fill_count, 4);
        assert_eq!(snapshot.bullish_pct, 50.0);
        assert_eq!(snapshot.token_age_minutes(), Some(120.0));
        assert_eq!(snapshot.market_cap, Some(100_000.0));
    }

    #[test]
    fn test_frame_time_overrides_clock() {
        let frame_time = now() - Duration::hours(1);
        let frame = MarketFrame {
            order_book: book(1.0, 1.0),
            observed_at: Some(frame_time),
            ..MarketFrame::default()
        };
        let snapshot =
            build_snapshot(&frame, &TrendConfig::default(), &EntryConfig::default(), now()).unwrap();
        assert_eq!(snapshot.observed_at, frame_time);
    }
}
