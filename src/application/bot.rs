//! Trading Bot
//!
//! Host-side polling loop around the decision engine. Each tick fetches a
//! market frame, builds a snapshot, queries capital and hands both to the
//! engine. Ticks never overlap: the loop awaits each tick before the next,
//! missed intervals are skipped, and a tick requested while another is
//! running is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::{PerformanceTracker, Side, TradeRecord};
use crate::ports::{CapitalError, CapitalPort, MarketDataError, MarketDataPort};
use crate::strategy::{build_snapshot, fill_query, ConfigUpdate, Decision, DecisionEngine, EngineConfig, EngineError};

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Not connected: no capital source")]
    NotConnected,
    #[error("Not initialized: no market reference")]
    NotInitialized,
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),
    #[error("Capital error: {0}")]
    Capital(#[from] CapitalError),
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Why a tick did not reach the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Order book missing bids or asks
    InsufficientData,
    /// Another tick is still running
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Evaluated(Decision),
}

/// Read-only status snapshot
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub is_active: bool,
    pub market: Option<String>,
    pub position: Option<Side>,
    pub entry_price: Option<f64>,
    pub entry_size: Option<f64>,
    pub entry_timestamp: Option<DateTime<Utc>>,
    pub partial_taken: bool,
    pub last_price: Option<f64>,
    pub realized_pnl: f64,
    pub config: EngineConfig,
}

/// Polling host for one decision engine
#[derive(Clone)]
pub struct TradingBot {
    engine: Arc<RwLock<DecisionEngine>>,
    market: Arc<RwLock<Option<Arc<dyn MarketDataPort>>>>,
    capital: Arc<RwLock<Option<Arc<dyn CapitalPort>>>>,
    performance: Arc<RwLock<PerformanceTracker>>,
    last_price: Arc<RwLock<Option<f64>>>,
    is_active: Arc<RwLock<bool>>,
    poll_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_guard: Arc<Mutex<()>>,
    poll_interval: Duration,
}

impl TradingBot {
    pub fn new(config: EngineConfig) -> Result<Self, BotError> {
        let engine = DecisionEngine::new(config)?;

        Ok(Self {
            engine: Arc::new(RwLock::new(engine)),
            market: Arc::new(RwLock::new(None)),
            capital: Arc::new(RwLock::new(None)),
            performance: Arc::new(RwLock::new(PerformanceTracker::new())),
            last_price: Arc::new(RwLock::new(None)),
            is_active: Arc::new(RwLock::new(false)),
            poll_task: Arc::new(Mutex::new(None)),
            tick_guard: Arc::new(Mutex::new(())),
            poll_interval: Duration::from_secs(60),
        })
    }

    /// Set custom poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Attach the market reference
    pub async fn initialize(&self, market: Arc<dyn MarketDataPort>) {
        tracing::info!("Market initialized: {}", market.market());
        *self.market.write().await = Some(market);
    }

    /// Attach the capital source
    pub async fn connect(&self, capital: Arc<dyn CapitalPort>) {
        *self.capital.write().await = Some(capital);
        tracing::info!("Capital source connected");
    }

    /// Schedule the polling loop. The first tick runs immediately.
    pub async fn activate(&self) -> Result<(), BotError> {
        if self.capital.read().await.is_none() {
            return Err(BotError::NotConnected);
        }

        let mut task = self.poll_task.lock().await;
        let mut active = self.is_active.write().await;
        if *active {
            tracing::info!("Bot is already active");
            return Ok(());
        }
        *active = true;
        drop(active);

        let bot = self.clone();
        *task = Some(tokio::spawn(async move { bot.poll_loop().await }));

        tracing::info!("Bot activated, polling every {:?}", self.poll_interval);
        Ok(())
    }

    /// Cancel the polling loop. An open position stays in memory.
    pub async fn deactivate(&self) {
        let mut task = self.poll_task.lock().await;
        let mut active = self.is_active.write().await;
        if !*active {
            tracing::info!("Bot is already inactive");
            return;
        }
        *active = false;
        drop(active);

        // A cycle in flight runs to completion before the task is dropped
        let _cycle = self.tick_guard.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }

        if let Some(position) = self.engine.read().await.position() {
            tracing::warn!(
                "Bot deactivated with open {} position @ {:.6}, size {:.6}",
                position.side, position.entry_price, position.size
            );
        } else {
            tracing::info!("Bot deactivated");
        }
    }

    pub async fn is_active(&self) -> bool {
        *self.is_active.read().await
    }

    async fn poll_loop(&self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if !*self.is_active.read().await {
                break;
            }
            match self.tick().await {
                Ok(TickOutcome::Skipped(reason)) => {
                    tracing::warn!("Cycle skipped: {:?}", reason);
                }
                Ok(TickOutcome::Evaluated(_)) => {}
                Err(e) => {
                    // Cycle-scoped; the next tick retries
                    tracing::error!("Tick error: {}", e);
                }
            }
        }
    }

    /// Run one evaluation cycle
    pub async fn tick(&self) -> Result<TickOutcome, BotError> {
        let _guard = match self.tick_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(TickOutcome::Skipped(SkipReason::Busy)),
        };

        let market = self.market.read().await.clone().ok_or(BotError::NotInitialized)?;
        let capital = self.capital.read().await.clone().ok_or(BotError::NotConnected)?;

        let (trend, entry) = {
            let engine = self.engine.read().await;
            let config = engine.config();
            (config.trend.clone(), config.entry.clone())
        };

        let frame = market.fetch_frame(fill_query(&trend, &entry)).await?;
        let snapshot = match build_snapshot(&frame, &trend, &entry, Utc::now()) {
            Some(snapshot) => snapshot,
            None => {
                tracing::info!("Insufficient order book data for {}", market.market());
                return Ok(TickOutcome::Skipped(SkipReason::InsufficientData));
            }
        };

        tracing::debug!(
            "Market analysis {}: price {:.6}, trend {}, bullish {:.2}%, window volume {:.2} ({:+.2}%)",
            market.market(),
            snapshot.price,
            snapshot.trend,
            snapshot.bullish_pct,
            snapshot.window_volume,
            snapshot.volume_change_pct()
        );
        *self.last_price.write().await = Some(snapshot.price);

        let balance = capital.available_balance().await?;
        let decision = self.engine.write().await.evaluate(&snapshot, Some(balance))?;

        if let Some(trade) = decision.trade() {
            self.settle(capital.as_ref(), trade).await;
        }

        Ok(TickOutcome::Evaluated(decision))
    }

    async fn settle(&self, capital: &dyn CapitalPort, trade: &TradeRecord) {
        if let Err(e) = capital.settle(trade).await {
            tracing::warn!("Failed to settle {}: {}", trade, e);
        }
        self.performance.write().await.record(trade);
    }

    /// Close the whole position at `price`
    pub async fn close_position(&self, price: f64) -> Result<Option<TradeRecord>, BotError> {
        let capital = self.capital.read().await.clone().ok_or(BotError::NotConnected)?;
        let record = self.engine.write().await.close_manual(price, Utc::now())?;
        if let Some(trade) = &record {
            self.settle(capital.as_ref(), trade).await;
        }
        Ok(record)
    }

    /// Apply a partial configuration update and return the new status
    pub async fn update_config(&self, update: ConfigUpdate) -> BotStatus {
        let rejected = self.engine.write().await.update_config(&update);
        for field in &rejected {
            tracing::warn!("Rejected configuration value for {}", field);
        }
        let status = self.status().await;
        tracing::info!(
            "Configuration updated: stop loss {}%, take profit {}%, max position {}",
            status.config.stop_loss_pct,
            status.config.take_profit_pct,
            status.config.max_position_size
        );
        status
    }

    pub async fn set_risk_pct(&self, risk_pct: f64) -> Result<(), BotError> {
        self.engine.write().await.set_risk_pct(risk_pct)?;
        Ok(())
    }

    /// Get current status snapshot
    pub async fn status(&self) -> BotStatus {
        let engine = self.engine.read().await;
        let position = engine.position();
        let market = self.market.read().await.as_ref().map(|m| m.market());

        BotStatus {
            is_active: *self.is_active.read().await,
            market,
            position: position.map(|p| p.side),
            entry_price: position.map(|p| p.entry_price),
            entry_size: position.map(|p| p.size),
            entry_timestamp: position.map(|p| p.entered_at),
            partial_taken: position.map_or(false, |p| p.partial_taken),
            last_price: *self.last_price.read().await,
            realized_pnl: self.performance.read().await.realized_pnl,
            config: engine.config().clone(),
        }
    }

    pub async fn performance(&self) -> PerformanceTracker {
        self.performance.read().await.clone()
    }
}
