//! Replay Feed
//!
//! Serves recorded market frames from a JSON file, one frame per poll.
//! The file holds a JSON array of frames:
//!
//! ```json
//! [{"observed_at": "2024-06-01T12:00:00Z",
//!   "order_book": {"bids": [{"price": 0.99, "size": 10.0}], "asks": [{"price": 1.01, "size": 8.0}]},
//!   "fills": [{"timestamp": "2024-06-01T11:59:30Z", "side": "buy", "size": 120.0, "price": 1.0}],
//!   "token": {"launched_at": "2024-06-01T09:00:00Z", "market_cap": 85000.0}}]
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::ports::market_data::{MarketDataError, MarketDataPort};
use crate::ports::models::{FillQuery, MarketFrame};
use super::FeedError;

#[derive(Debug)]
pub struct ReplayFeed {
    label: String,
    frames: Vec<MarketFrame>,
    cursor: AtomicUsize,
}

impl ReplayFeed {
    pub fn new(label: impl Into<String>, frames: Vec<MarketFrame>) -> Self {
        Self {
            label: label.into(),
            frames,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Load frames from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let frames = load_frames(path)?;
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "replay".to_string());

        tracing::info!("Loaded {} frames from {}", frames.len(), path.display());
        Ok(Self::new(label, frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor.load(Ordering::SeqCst))
    }

    pub fn frames(&self) -> &[MarketFrame] {
        &self.frames
    }
}

/// Read a JSON array of frames
pub fn load_frames(path: &Path) -> Result<Vec<MarketFrame>, FeedError> {
    let content = std::fs::read_to_string(path)?;
    let frames: Vec<MarketFrame> = serde_json::from_str(&content)?;
    Ok(frames)
}

#[async_trait]
impl MarketDataPort for ReplayFeed {
    async fn fetch_frame(&self, query: FillQuery) -> Result<MarketFrame, MarketDataError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let mut frame = self.frames.get(index).cloned().ok_or(MarketDataError::Exhausted)?;
        frame.retain_fills(&query);
        Ok(frame)
    }

    fn market(&self) -> String {
        self.label.clone()
    }
}
