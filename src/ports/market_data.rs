use async_trait::async_trait;
use thiserror::Error;

use super::models::{FillQuery, MarketFrame};

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Market source unavailable: {0}")]
    Unavailable(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Feed exhausted")]
    Exhausted,
}

/// Market data port trait
///
/// One call returns the order book, the rolling fill list and (where the
/// source knows it) token stats for the configured market.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch the current frame. It carries at least the fills `query` covers;
    /// older fills may be dropped.
    async fn fetch_frame(&self, query: FillQuery) -> Result<MarketFrame, MarketDataError>;

    /// Human-readable market label for logs
    fn market(&self) -> String;
}
