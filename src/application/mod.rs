pub mod bot;
pub mod backtest;

pub use bot::{TradingBot, BotError, BotStatus, TickOutcome, SkipReason};
pub use backtest::{run_backtest, BacktestReport};
