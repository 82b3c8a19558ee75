//! Strategy Layer - Position decision procedure
//!
//! - `analysis`: raw market frame to snapshot (mid price, trend, window volume)
//! - `entry`: entry filters (volume breakout or trend momentum)
//! - `engine`: open / hold / partial exit / full exit decisions
//! - `params`: engine configuration and presets

pub mod params;
pub mod analysis;
pub mod entry;
pub mod engine;

pub use params::{EngineConfig, EntryConfig, TrendConfig, EntryMode, ConfigUpdate, ParamsError};
pub use analysis::{build_snapshot, classify_trend, bullish_share, fill_query};
pub use entry::{check_entry, volume_threshold, EntryRejection};
pub use engine::{evaluate, close_position, DecisionEngine, Decision, Evaluation, EngineError};
