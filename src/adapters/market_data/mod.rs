//! Market Data Adapters
//!
//! Sources that implement `MarketDataPort`:
//! - `ReplayFeed`: recorded frames from a JSON file
//! - `SyntheticFeed`: seeded random walk for demos

mod replay;
mod synthetic;

use thiserror::Error;

pub use replay::{load_frames, ReplayFeed};
pub use synthetic::SyntheticFeed;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to read frames: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse frames: {0}")]
    Parse(#[from] serde_json::Error),
}
