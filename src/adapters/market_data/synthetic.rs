//! Synthetic Feed
//!
//! SYNTHETIC DEMO DATA. Generates a random-walk market with regime-biased
//! buy/sell flow so the bot can be exercised without a market source.
//! Prices, fills and market cap are made up; nothing here reflects a real
//! token.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ports::market_data::{MarketDataError, MarketDataPort};
use crate::ports::models::{BookLevel, Fill, FillQuery, FillSide, MarketFrame, OrderBook, TokenStats};

/// Token supply used to derive the synthetic market cap
const SYNTHETIC_SUPPLY: f64 = 1_000_000_000.0;
/// Fills generated per poll
const FILLS_PER_POLL: usize = 20;

#[derive(Debug)]
struct WalkState {
    rng: StdRng,
    price: f64,
    /// Probability a generated fill is a buy
    buy_bias: f64,
    clock: DateTime<Utc>,
    fills: Vec<Fill>,
}

#[derive(Debug)]
pub struct SyntheticFeed {
    state: Mutex<WalkState>,
    launched_at: DateTime<Utc>,
    step: Duration,
    spread_pct: f64,
}

impl SyntheticFeed {
    /// Deterministic feed for a given seed. Each poll advances the
    /// synthetic clock by `step`.
    pub fn new(seed: u64, start_price: f64, step: Duration) -> Self {
        let clock = Utc::now();
        tracing::warn!("Using SYNTHETIC market data (seed {}) - demo only", seed);

        Self {
            state: Mutex::new(WalkState {
                rng: StdRng::seed_from_u64(seed),
                price: start_price,
                buy_bias: 0.5,
                clock,
                fills: Vec::new(),
            }),
            launched_at: clock - Duration::hours(2),
            step,
            spread_pct: 0.2,
        }
    }

    fn advance(&self, query: &FillQuery) -> Result<MarketFrame, MarketDataError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| MarketDataError::Unavailable("synthetic state poisoned".to_string()))?;

        // Regime switch: occasionally flip between buy and sell pressure
        if state.rng.gen_bool(0.15) {
            state.buy_bias = state.rng.gen_range(0.25..0.75);
        }

        let drift = (state.buy_bias - 0.5) * 0.02;
        let shock = state.rng.gen_range(-0.01..0.01);
        state.price = (state.price * (1.0 + drift + shock)).max(1e-9);
        state.clock = state.clock + self.step;

        let step_ms = self.step.num_milliseconds().max(FILLS_PER_POLL as i64);
        for i in 0..FILLS_PER_POLL {
            let offset = Duration::milliseconds(step_ms * (FILLS_PER_POLL - i) as i64 / FILLS_PER_POLL as i64);
            let bias = state.buy_bias;
            let side = if state.rng.gen_bool(bias) { FillSide::Buy } else { FillSide::Sell };
            let size = state.rng.gen_range(1_000.0..50_000.0);
            let jitter = state.rng.gen_range(-0.005..0.005);
            let fill = Fill {
                timestamp: state.clock - offset,
                side,
                size,
                price: state.price * (1.0 + jitter),
            };
            state.fills.push(fill);
        }

        let half_spread = state.price * self.spread_pct / 200.0;
        let mut frame = MarketFrame {
            order_book: OrderBook {
                bids: vec![BookLevel { price: state.price - half_spread, size: 10_000.0 }],
                asks: vec![BookLevel { price: state.price + half_spread, size: 10_000.0 }],
            },
            fills: std::mem::take(&mut state.fills),
            token: Some(TokenStats {
                launched_at: self.launched_at,
                market_cap: state.price * SYNTHETIC_SUPPLY,
            }),
            observed_at: Some(state.clock),
        };

        // The buffer only ever holds what the last query needed
        frame.retain_fills(query);
        state.fills = frame.fills.clone();
        Ok(frame)
    }
}

#[async_trait]
impl MarketDataPort for SyntheticFeed {
    async fn fetch_frame(&self, query: FillQuery) -> Result<MarketFrame, MarketDataError> {
        self.advance(&query)
    }

    fn market(&self) -> String {
        "SYNTHETIC/USDC".to_string()
    }
}
