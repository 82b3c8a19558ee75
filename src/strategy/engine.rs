//! Position Decision Engine
//!
//! Pure evaluation of one cycle: given configuration, the current position
//! (if any), a market snapshot and available capital, decide to open, hold,
//! partially exit or fully exit.
//!
//! Exit checks run in priority order and at most one fires per cycle:
//! 1. Stop loss
//! 2. Take profit
//! 3. Partial take profit (once per position)
//! 4. Trend reversal
//!
//! `evaluate` never mutates its inputs. `DecisionEngine` owns the position
//! and commits an evaluation only when it succeeds.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    ExitReason, MarketSnapshot, Position, PositionError, Side, TradeKind, TradeRecord,
};
use super::entry::{check_entry, EntryRejection};
use super::params::{ConfigUpdate, EngineConfig, ParamsError};

/// Tolerance for percentage threshold comparisons
const PCT_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not connected: no capital source")]
    NotConnected,
    #[error("Not initialized: no market reference")]
    NotInitialized,
    #[error("Invalid snapshot price: {0}")]
    InvalidPrice(f64),
    #[error("Position error: {0}")]
    Position(#[from] PositionError),
    #[error("Invalid parameters: {0}")]
    Params(#[from] ParamsError),
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Flat and entry conditions not met
    NoEntry(EntryRejection),
    Opened(TradeRecord),
    Held,
    PartialExit(TradeRecord),
    Closed(TradeRecord),
}

impl Decision {
    pub fn trade(&self) -> Option<&TradeRecord> {
        match self {
            Decision::Opened(trade) | Decision::PartialExit(trade) | Decision::Closed(trade) => {
                Some(trade)
            }
            Decision::NoEntry(_) | Decision::Held => None,
        }
    }
}

/// New position state plus the decision that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub position: Option<Position>,
    pub decision: Decision,
}

/// Evaluate one cycle.
///
/// `capital` is the available balance from the capital source; None means
/// no source is connected.
pub fn evaluate(
    config: &EngineConfig,
    position: Option<&Position>,
    snapshot: &MarketSnapshot,
    capital: Option<f64>,
) -> Result<Evaluation, EngineError> {
    let capital = capital.ok_or(EngineError::NotConnected)?;
    check_price(snapshot.price)?;

    match position {
        None => evaluate_entry(config, snapshot, capital),
        Some(position) => evaluate_hold(config, position, snapshot),
    }
}

fn evaluate_entry(
    config: &EngineConfig,
    snapshot: &MarketSnapshot,
    capital: f64,
) -> Result<Evaluation, EngineError> {
    let side = match check_entry(&config.entry, snapshot) {
        Ok(side) => side,
        Err(rejection) => {
            debug!("No entry: {}", rejection);
            return Ok(Evaluation {
                position: None,
                decision: Decision::NoEntry(rejection),
            });
        }
    };

    if !(capital > 0.0) || !capital.is_finite() {
        return Ok(Evaluation {
            position: None,
            decision: Decision::NoEntry(EntryRejection::NoCapital(capital)),
        });
    }

    let notional = capital * config.effective_size_fraction();
    let size = notional / snapshot.price;
    let position = Position::open(
        side,
        snapshot.price,
        size,
        snapshot.observed_at,
        config.stop_loss_pct,
        config.take_profit_pct,
    )?;

    info!(
        "Opening {} position: price {:.6}, size {:.6} ({:.6} notional), stop {:.6}, target {:.6}",
        side, position.entry_price, position.size, notional,
        position.stop_loss_price, position.take_profit_price
    );

    let record = TradeRecord::entry(side, snapshot.price, size, snapshot.observed_at);
    Ok(Evaluation {
        position: Some(position),
        decision: Decision::Opened(record),
    })
}

fn evaluate_hold(
    config: &EngineConfig,
    position: &Position,
    snapshot: &MarketSnapshot,
) -> Result<Evaluation, EngineError> {
    let price = snapshot.price;
    let profit_pct = position.profit_pct(price);

    if profit_pct <= -config.stop_loss_pct + PCT_EPSILON {
        return Ok(full_exit(position, price, snapshot.observed_at, ExitReason::StopLoss));
    }

    if profit_pct >= config.take_profit_pct - PCT_EPSILON {
        return Ok(full_exit(position, price, snapshot.observed_at, ExitReason::TakeProfit));
    }

    if let Some(partial_pct) = config.partial_take_profit_pct {
        if !position.partial_taken && profit_pct >= partial_pct - PCT_EPSILON {
            let exit_size = position.size * config.partial_take_profit_fraction;
            let mut remaining = position.clone();
            remaining.take_partial(exit_size)?;

            let record = TradeRecord::exit(
                TradeKind::PartialExit,
                position.side,
                price,
                exit_size,
                snapshot.observed_at,
                position.profit_for(price, exit_size),
                profit_pct,
                ExitReason::PartialTakeProfit,
            );
            info!("Partial exit: {}", record);
            return Ok(Evaluation {
                position: Some(remaining),
                decision: Decision::PartialExit(record),
            });
        }
    }

    if config.trend.reversal_exit && is_reversal(position.side, snapshot.bullish_pct, config.trend.reversal_band_pct) {
        return Ok(full_exit(position, price, snapshot.observed_at, ExitReason::TrendReversal));
    }

    debug!(
        "Holding {} @ {:.6}: price {:.6}, P/L {:.2}%",
        position.side, position.entry_price, price, profit_pct
    );
    Ok(Evaluation {
        position: Some(position.clone()),
        decision: Decision::Held,
    })
}

/// Pressure has moved past the reversal band against the held side
fn is_reversal(side: Side, bullish_pct: f64, band: f64) -> bool {
    match side {
        Side::Long => bullish_pct < 50.0 - band,
        Side::Short => bullish_pct > 50.0 + band,
    }
}

fn full_exit(
    position: &Position,
    price: f64,
    at: DateTime<Utc>,
    reason: ExitReason,
) -> Evaluation {
    let record = close_position(position, price, at, reason);
    info!("Closing position: {}", record);
    Evaluation {
        position: None,
        decision: Decision::Closed(record),
    }
}

fn check_price(price: f64) -> Result<(), EngineError> {
    if !(price > 0.0) || !price.is_finite() {
        return Err(EngineError::InvalidPrice(price));
    }
    Ok(())
}

/// Trade record for closing the whole remaining position at `price`
pub fn close_position(
    position: &Position,
    price: f64,
    at: DateTime<Utc>,
    reason: ExitReason,
) -> TradeRecord {
    TradeRecord::exit(
        TradeKind::FullExit,
        position.side,
        price,
        position.size,
        at,
        position.profit_for(price, position.size),
        position.profit_pct(price),
        reason,
    )
}

/// Stateful wrapper owning the configuration and at most one position
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: EngineConfig,
    position: Option<Position>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            position: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Evaluate and commit. On error the position is left untouched.
    pub fn evaluate(
        &mut self,
        snapshot: &MarketSnapshot,
        capital: Option<f64>,
    ) -> Result<Decision, EngineError> {
        let evaluation = evaluate(&self.config, self.position.as_ref(), snapshot, capital)?;
        self.position = evaluation.position;
        Ok(evaluation.decision)
    }

    /// Close the whole position at `price` with reason "manual".
    /// Ok(None) when flat; an unusable price leaves the position open.
    pub fn close_manual(
        &mut self,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<TradeRecord>, EngineError> {
        if self.position.is_none() {
            return Ok(None);
        }
        check_price(price)?;

        let Some(position) = self.position.take() else {
            return Ok(None);
        };
        let record = close_position(&position, price, at, ExitReason::Manual);
        info!("Manual close: {}", record);
        Ok(Some(record))
    }

    /// Apply a partial update and re-derive the open position's stop and
    /// target from its entry price. Returns the rejected field names.
    pub fn update_config(&mut self, update: &ConfigUpdate) -> Vec<&'static str> {
        let rejected = self.config.apply_update(update);
        self.rederive_levels();
        rejected
    }

    pub fn set_risk_pct(&mut self, risk_pct: f64) -> Result<(), EngineError> {
        let candidate = self.config.clone().with_risk_pct(risk_pct);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    fn rederive_levels(&mut self) {
        if let Some(position) = self.position.as_mut() {
            let sign = position.side.sign();
            position.stop_loss_price =
                position.entry_price * (1.0 - sign * self.config.stop_loss_pct / 100.0);
            position.take_profit_price =
                position.entry_price * (1.0 + sign * self.config.take_profit_pct / 100.0);
        }
    }
}
