//! Surfbot - Paper-Trading Position Decision Engine
//!
//! Polls a market feed, classifies buy/sell pressure from recent fills and
//! manages a single simulated position with stop loss, take profit, an
//! optional partial exit and a trend reversal exit.
//!
//! # Modules
//!
//! - `domain`: Core types (Position, TradeRecord, MarketSnapshot, PerformanceTracker)
//! - `ports`: Trait abstractions (MarketDataPort, CapitalPort)
//! - `strategy`: Snapshot analysis, entry filters and the decision engine
//! - `adapters`: External implementations (replay/synthetic feeds, paper wallet, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Polling bot and backtest runner

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
