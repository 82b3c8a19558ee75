//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, EngineSection, BotSection, LoggingSection, Preset,
    load_config, parse_config, ENV_POLL_SECS, ENV_CAPITAL,
};
