use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use super::capital::{CapitalError, CapitalPort};
use super::market_data::{MarketDataError, MarketDataPort};
use super::models::{FillQuery, MarketFrame};
use crate::domain::TradeRecord;

/// Stub market data port that serves queued responses and records calls
#[derive(Debug, Default, Clone)]
pub struct StubMarketData {
    calls: Arc<Mutex<Vec<FillQuery>>>,
    responses: Arc<Mutex<VecDeque<Result<MarketFrame, String>>>>,
}

impl StubMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a frame
    pub fn with_frame(self, frame: MarketFrame) -> Self {
        self.push_frame(frame);
        self
    }

    /// Builder method to queue a failure
    pub fn with_error(self, message: &str) -> Self {
        self.responses.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn push_frame(&self, frame: MarketFrame) {
        self.responses.lock().unwrap().push_back(Ok(frame));
    }

    /// Get all recorded calls (the fill query of each)
    pub fn get_calls(&self) -> Vec<FillQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataPort for StubMarketData {
    async fn fetch_frame(&self, query: FillQuery) -> Result<MarketFrame, MarketDataError> {
        self.calls.lock().unwrap().push(query);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(message)) => Err(MarketDataError::Unavailable(message)),
            None => Err(MarketDataError::Exhausted),
        }
    }

    fn market(&self) -> String {
        "STUB/USDC".to_string()
    }
}

/// Stub capital port with a fixed balance that records settled trades
#[derive(Debug, Default, Clone)]
pub struct StubCapital {
    balance: Arc<Mutex<Option<f64>>>,
    settled: Arc<Mutex<Vec<TradeRecord>>>,
}

impl StubCapital {
    pub fn new(balance: f64) -> Self {
        Self {
            balance: Arc::new(Mutex::new(Some(balance))),
            settled: Arc::default(),
        }
    }

    /// Capital source whose balance query always fails
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn get_settled(&self) -> Vec<TradeRecord> {
        self.settled.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapitalPort for StubCapital {
    async fn available_balance(&self) -> Result<f64, CapitalError> {
        self.balance
            .lock()
            .unwrap()
            .ok_or_else(|| CapitalError::QueryFailed("No balance configured".to_string()))
    }

    async fn settle(&self, trade: &TradeRecord) -> Result<(), CapitalError> {
        self.settled.lock().unwrap().push(trade.clone());
        Ok(())
    }
}
