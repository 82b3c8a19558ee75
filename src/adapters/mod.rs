//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Market Data: replay and synthetic feeds
//! - Wallet: paper capital source
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod market_data;
pub mod wallet;

pub use cli::CliApp;
pub use market_data::{ReplayFeed, SyntheticFeed, FeedError};
pub use wallet::PaperWallet;
