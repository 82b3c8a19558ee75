//! Configuration Loader
//!
//! Loads and validates the bot configuration from a TOML file. Every
//! section is optional; missing values fall back to the selected preset.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::strategy::params::{EngineConfig, EntryConfig, TrendConfig};

/// Poll interval override, in seconds
pub const ENV_POLL_SECS: &str = "SURFBOT_POLL_SECS";
/// Paper capital override
pub const ENV_CAPITAL: &str = "SURFBOT_CAPITAL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSection,
    /// Replaces the preset's entry filters when present
    pub entry: Option<EntryConfig>,
    /// Replaces the preset's trend settings when present
    pub trend: Option<TrendConfig>,
    pub bot: BotSection,
    pub logging: LoggingSection,
}

/// Named starting point for the engine parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    TrendSurfer,
    VolumeTracker,
}

/// Engine section: a preset plus individual overrides
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub preset: Preset,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub max_position_size: Option<f64>,
    pub risk_pct: Option<f64>,
    pub partial_take_profit_pct: Option<f64>,
    pub partial_take_profit_fraction: Option<f64>,
    /// Turns the partial exit off even if the preset enables it
    pub disable_partial: bool,
}

/// Host loop and data source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotSection {
    pub poll_interval_secs: u64,
    /// Paper wallet starting balance in quote units
    pub initial_capital: f64,
    /// Recorded frames to replay; `~` is expanded
    pub replay_file: Option<String>,
    pub synthetic_seed: u64,
    pub synthetic_start_price: f64,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            initial_capital: 10.0,
            replay_file: None,
            synthetic_seed: 42,
            synthetic_start_price: 0.0001,
        }
    }
}

impl BotSection {
    /// Replay file path with `~` and environment variables expanded
    pub fn replay_path(&self) -> Result<Option<PathBuf>, ConfigError> {
        self.replay_file
            .as_deref()
            .map(|raw| expand_path(raw))
            .transpose()
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file, then apply environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = expand_path(&path.as_ref().to_string_lossy())?;
    let content = std::fs::read_to_string(&path)?;
    let mut config = parse_config(&content)?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from a TOML string without touching the environment
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

fn expand_path(raw: &str) -> Result<PathBuf, ConfigError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ConfigError::ValidationError(format!("cannot expand path {}: {}", raw, e)))
}

impl Config {
    /// Engine parameters: preset, then section overrides
    pub fn engine_config(&self) -> EngineConfig {
        let section = &self.engine;
        let mut config = match section.preset {
            Preset::TrendSurfer => EngineConfig::trend_surfer(),
            Preset::VolumeTracker => EngineConfig::volume_tracker(),
        };

        if let Some(pct) = section.stop_loss_pct {
            config.stop_loss_pct = pct;
        }
        if let Some(pct) = section.take_profit_pct {
            config.take_profit_pct = pct;
        }
        if let Some(fraction) = section.max_position_size {
            config.max_position_size = fraction;
        }
        if let Some(pct) = section.risk_pct {
            config.risk_pct = pct;
        }
        if let Some(pct) = section.partial_take_profit_pct {
            config.partial_take_profit_pct = Some(pct);
        }
        if let Some(fraction) = section.partial_take_profit_fraction {
            config.partial_take_profit_fraction = fraction;
        }
        if section.disable_partial {
            config.partial_take_profit_pct = None;
        }
        if let Some(entry) = &self.entry {
            config.entry = entry.clone();
        }
        if let Some(trend) = &self.trend {
            config.trend = trend.clone();
        }
        config
    }

    /// Apply SURFBOT_POLL_SECS and SURFBOT_CAPITAL when set
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var(ENV_POLL_SECS) {
            self.bot.poll_interval_secs = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("{} must be an integer, got {:?}", ENV_POLL_SECS, raw))
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_CAPITAL) {
            self.bot.initial_capital = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("{} must be a number, got {:?}", ENV_CAPITAL, raw))
            })?;
        }
        Ok(())
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.bot.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if !(self.bot.initial_capital >= 0.0) || !self.bot.initial_capital.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "initial_capital must be >= 0, got {}",
                self.bot.initial_capital
            )));
        }

        if !(self.bot.synthetic_start_price > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "synthetic_start_price must be > 0, got {}",
                self.bot.synthetic_start_price
            )));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown log level {:?}",
                self.logging.level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::params::EntryMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[engine]
preset = "volume_tracker"
stop_loss_pct = 30.0

[entry]
mode = "volume_breakout"
min_market_cap = 50000.0
volume_window_minutes = 10

[trend]
fill_lookback = 200

[bot]
poll_interval_secs = 15
initial_capital = 25.0
replay_file = "data/frames.json"

[logging]
level = "debug"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        let engine = config.engine_config();

        assert_eq!(engine.stop_loss_pct, 30.0);
        assert_eq!(engine.take_profit_pct, 140.0);
        assert_eq!(engine.partial_take_profit_pct, Some(70.0));
        assert_eq!(engine.entry.min_market_cap, 50000.0);
        assert_eq!(engine.entry.volume_window_minutes, 10);
        assert_eq!(engine.entry.launch_exclusion_minutes, 30);
        assert_eq!(engine.trend.fill_lookback, 200);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.bot.replay_path().unwrap(),
            Some(PathBuf::from("data/frames.json"))
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        let engine = config.engine_config();

        assert_eq!(engine, EngineConfig::trend_surfer());
        assert_eq!(engine.entry.mode, EntryMode::Trend);
        assert_eq!(config.bot.poll_interval_secs, 60);
        assert_eq!(config.bot.initial_capital, 10.0);
        assert!(config.bot.replay_path().unwrap().is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_disable_partial() {
        let config = parse_config("[engine]\npreset = \"volume_tracker\"\ndisable_partial = true\n").unwrap();
        assert!(config.engine_config().partial_take_profit_pct.is_none());
    }

    #[test]
    fn test_bundled_config_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/surfbot.toml");
        let content = std::fs::read_to_string(path).unwrap();
        let config = parse_config(&content).unwrap();
        assert_eq!(config.engine.preset, Preset::TrendSurfer);
        assert_eq!(config.engine_config().take_profit_pct, 5.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let result = parse_config("[engine\nstop_loss_pct = 2.0");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_stop_loss() {
        let result = parse_config("[engine]\nstop_loss_pct = 0.0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_poll_interval() {
        let result = parse_config("[bot]\npoll_interval_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        let result = parse_config("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let result = parse_config("[engine]\npreset = \"yolo\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_tilde_expansion() {
        let config = parse_config("[bot]\nreplay_file = \"~/frames.json\"\n").unwrap();
        let path = config.bot.replay_path().unwrap().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.to_string_lossy().ends_with("frames.json"));
    }
}
