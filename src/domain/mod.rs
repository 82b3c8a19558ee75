//! Domain Layer - Core types for the position decision engine
//!
//! Pure data types with no I/O. Market data and capital arrive through
//! the ports layer; decisions are made in `strategy`.

pub mod position;
pub mod trade;
pub mod snapshot;
pub mod performance;

pub use position::{Position, Side, PositionError};
pub use trade::{TradeRecord, TradeKind, ExitReason};
pub use snapshot::{MarketSnapshot, Trend};
pub use performance::{PerformanceTracker, DailyPnl};
