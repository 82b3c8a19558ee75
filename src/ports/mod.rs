//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Market data feeds (order book, fills, token stats)
//! - Capital sources (available balance, trade settlement)

pub mod market_data;
pub mod capital;
pub mod models;
pub mod mocks;

pub use market_data::{MarketDataPort, MarketDataError};
pub use capital::{CapitalPort, CapitalError};
pub use models::{BookLevel, Fill, FillQuery, FillSide, MarketFrame, OrderBook, TokenStats};
