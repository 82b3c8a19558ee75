//! Strategy Parameters
//!
//! Configuration structs for the position decision engine.
//! `Default` is the Trend Surfer preset; `volume_tracker()` is the
//! memecoin volume-breakout preset.

use serde::{Deserialize, Serialize};

/// How new positions are opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// Token age, market cap, green candle and volume filters must all pass
    VolumeBreakout,
    /// Buy/sell pressure beyond `entry_band_pct` from balance
    Trend,
}

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Adverse move from entry that forces a full exit, in percent
    pub stop_loss_pct: f64,
    /// Favourable move from entry that takes the full position off, in percent
    pub take_profit_pct: f64,
    /// Hard cap on position notional as a fraction of capital, (0, 1]
    pub max_position_size: f64,
    /// Share of capital committed per trade, in percent
    pub risk_pct: f64,
    /// Profit level for the one-off partial exit; None disables it
    pub partial_take_profit_pct: Option<f64>,
    /// Fraction of the position sold at the partial exit, (0, 1)
    pub partial_take_profit_fraction: f64,
    pub entry: EntryConfig,
    pub trend: TrendConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::trend_surfer()
    }
}

impl EngineConfig {
    /// Trend-following preset: tight stops, no partial exit
    pub fn trend_surfer() -> Self {
        Self {
            stop_loss_pct: 2.5,
            take_profit_pct: 5.0,
            max_position_size: 0.5,
            risk_pct: 100.0,
            partial_take_profit_pct: None,
            partial_take_profit_fraction: 0.5,
            entry: EntryConfig {
                mode: EntryMode::Trend,
                ..EntryConfig::default()
            },
            trend: TrendConfig::default(),
        }
    }

    /// Memecoin volume-breakout preset: wide stops, 4:1 reward-risk,
    /// half the position taken off at +70%
    pub fn volume_tracker() -> Self {
        Self {
            stop_loss_pct: 35.0,
            take_profit_pct: 140.0,
            max_position_size: 1.0,
            risk_pct: 15.0,
            partial_take_profit_pct: Some(70.0),
            partial_take_profit_fraction: 0.5,
            entry: EntryConfig {
                mode: EntryMode::VolumeBreakout,
                ..EntryConfig::default()
            },
            trend: TrendConfig::default(),
        }
    }

    pub fn with_stop_loss(mut self, pct: f64) -> Self {
        self.stop_loss_pct = pct;
        self
    }

    pub fn with_take_profit(mut self, pct: f64) -> Self {
        self.take_profit_pct = pct;
        self
    }

    pub fn with_max_position_size(mut self, fraction: f64) -> Self {
        self.max_position_size = fraction;
        self
    }

    pub fn with_risk_pct(mut self, pct: f64) -> Self {
        self.risk_pct = pct;
        self
    }

    pub fn with_partial_take_profit(mut self, pct: f64, fraction: f64) -> Self {
        self.partial_take_profit_pct = Some(pct);
        self.partial_take_profit_fraction = fraction;
        self
    }

    pub fn with_entry_mode(mut self, mode: EntryMode) -> Self {
        self.entry.mode = mode;
        self
    }

    /// Fraction of capital a new position may use
    pub fn effective_size_fraction(&self) -> f64 {
        (self.risk_pct / 100.0).min(self.max_position_size).clamp(0.0, 1.0)
    }

    /// Apply a partial update. Fields left as None are unchanged; invalid
    /// values are skipped and their names returned.
    pub fn apply_update(&mut self, update: &ConfigUpdate) -> Vec<&'static str> {
        let mut rejected = Vec::new();

        if let Some(pct) = update.stop_loss_pct {
            if valid_stop_loss(pct) {
                self.stop_loss_pct = pct;
            } else {
                rejected.push("stop_loss_pct");
            }
        }
        if let Some(pct) = update.take_profit_pct {
            if pct.is_finite() && pct > 0.0 {
                self.take_profit_pct = pct;
            } else {
                rejected.push("take_profit_pct");
            }
        }
        if let Some(fraction) = update.max_position_size {
            if fraction > 0.0 && fraction <= 1.0 {
                self.max_position_size = fraction;
            } else {
                rejected.push("max_position_size");
            }
        }

        rejected
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !valid_stop_loss(self.stop_loss_pct) {
            return Err(ParamsError::InvalidStopLoss(self.stop_loss_pct));
        }
        if !(self.take_profit_pct > 0.0) || !self.take_profit_pct.is_finite() {
            return Err(ParamsError::InvalidTakeProfit(self.take_profit_pct));
        }
        if !(self.max_position_size > 0.0 && self.max_position_size <= 1.0) {
            return Err(ParamsError::InvalidPositionSize(self.max_position_size));
        }
        if !(self.risk_pct > 0.0 && self.risk_pct <= 100.0) {
            return Err(ParamsError::InvalidRisk(self.risk_pct));
        }
        if let Some(pct) = self.partial_take_profit_pct {
            if !(pct > 0.0) || !pct.is_finite() {
                return Err(ParamsError::InvalidPartial(format!("threshold {}", pct)));
            }
        }
        if !(self.partial_take_profit_fraction > 0.0 && self.partial_take_profit_fraction < 1.0) {
            return Err(ParamsError::InvalidPartial(format!(
                "fraction {}",
                self.partial_take_profit_fraction
            )));
        }
        self.entry.validate()?;
        self.trend.validate()?;
        Ok(())
    }
}

/// A stop at or beyond 100% would put a long's stop price at or below zero
fn valid_stop_loss(pct: f64) -> bool {
    pct > 0.0 && pct < 100.0
}

/// Partial configuration update accepted while the bot is running
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub max_position_size: Option<f64>,
}

/// Entry filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    pub mode: EntryMode,
    /// Minimum market cap in quote units
    pub min_market_cap: f64,
    /// Lookback for volume and candle colour
    pub volume_window_minutes: u32,
    /// Required window volume as percent of market cap
    pub volume_threshold_pct: f64,
    /// Required window volume for caps above `large_cap_threshold`
    pub large_cap_volume_threshold_pct: f64,
    pub large_cap_threshold: f64,
    /// No entries this soon after launch
    pub launch_exclusion_minutes: u32,
    pub max_token_age_hours: u32,
    /// Trend mode: distance of the bullish share from 50% needed to enter
    pub entry_band_pct: f64,
    /// Trend mode: open shorts on bearish pressure
    pub allow_short: bool,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            mode: EntryMode::VolumeBreakout,
            min_market_cap: 40_000.0,
            volume_window_minutes: 5,
            volume_threshold_pct: 25.0,
            large_cap_volume_threshold_pct: 15.0,
            large_cap_threshold: 500_000.0,
            launch_exclusion_minutes: 30,
            max_token_age_hours: 24,
            entry_band_pct: 10.0,
            allow_short: false,
        }
    }
}

impl EntryConfig {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.volume_window_minutes == 0 {
            return Err(ParamsError::InvalidEntryFilter(
                "volume_window_minutes must be > 0".to_string(),
            ));
        }
        if self.min_market_cap < 0.0 || self.large_cap_threshold < 0.0 {
            return Err(ParamsError::InvalidEntryFilter(
                "market cap thresholds must be >= 0".to_string(),
            ));
        }
        if !(self.volume_threshold_pct >= 0.0) || !(self.large_cap_volume_threshold_pct >= 0.0) {
            return Err(ParamsError::InvalidEntryFilter(
                "volume thresholds must be >= 0".to_string(),
            ));
        }
        if (self.max_token_age_hours as u64) * 60 <= self.launch_exclusion_minutes as u64 {
            return Err(ParamsError::InvalidEntryFilter(format!(
                "token age window is empty: exclusion {}min, max {}h",
                self.launch_exclusion_minutes, self.max_token_age_hours
            )));
        }
        if !(self.entry_band_pct >= 0.0 && self.entry_band_pct < 50.0) {
            return Err(ParamsError::InvalidEntryFilter(format!(
                "entry_band_pct must be 0-50, got {}",
                self.entry_band_pct
            )));
        }
        Ok(())
    }
}

/// Trend classification and reversal-exit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Number of most recent fills used for buy/sell pressure
    pub fill_lookback: usize,
    /// Bullish share within 50 ± band is neutral
    pub neutral_band_pct: f64,
    /// Exit when pressure is this far past 50% against the position
    pub reversal_band_pct: f64,
    pub reversal_exit: bool,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            fill_lookback: 100,
            neutral_band_pct: 5.0,
            reversal_band_pct: 15.0,
            reversal_exit: true,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.fill_lookback == 0 {
            return Err(ParamsError::InvalidTrend("fill_lookback must be > 0".to_string()));
        }
        if !(self.neutral_band_pct >= 0.0 && self.neutral_band_pct < 50.0) {
            return Err(ParamsError::InvalidTrend(format!(
                "neutral_band_pct must be 0-50, got {}",
                self.neutral_band_pct
            )));
        }
        if !(self.reversal_band_pct >= 0.0 && self.reversal_band_pct < 50.0) {
            return Err(ParamsError::InvalidTrend(format!(
                "reversal_band_pct must be 0-50, got {}",
                self.reversal_band_pct
            )));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid stop loss: {0}% (must be 0 < loss < 100)")]
    InvalidStopLoss(f64),
    #[error("Invalid take profit: {0}% (must be > 0)")]
    InvalidTakeProfit(f64),
    #[error("Invalid max position size: {0} (must be 0 < size <= 1)")]
    InvalidPositionSize(f64),
    #[error("Invalid risk: {0}% (must be 0 < risk <= 100)")]
    InvalidRisk(f64),
    #[error("Invalid partial take profit: {0}")]
    InvalidPartial(String),
    #[error("Invalid entry filter: {0}")]
    InvalidEntryFilter(String),
    #[error("Invalid trend settings: {0}")]
    InvalidTrend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_trend_surfer() {
        let config = EngineConfig::default();
        assert_eq!(config.stop_loss_pct, 2.5);
        assert_eq!(config.take_profit_pct, 5.0);
        assert_eq!(config.max_position_size, 0.5);
        assert_eq!(config.entry.mode, EntryMode::Trend);
        assert!(config.partial_take_profit_pct.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_volume_tracker_preset() {
        let config = EngineConfig::volume_tracker();
        assert_eq!(config.partial_take_profit_pct, Some(70.0));
        assert_eq!(config.entry.mode, EntryMode::VolumeBreakout);
        assert_eq!(config.entry.launch_exclusion_minutes, 30);
        assert!((config.effective_size_fraction() - 0.15).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_fraction_is_capped() {
        let config = EngineConfig::default().with_risk_pct(80.0).with_max_position_size(0.25);
        assert_eq!(config.effective_size_fraction(), 0.25);

        let config = EngineConfig::default().with_risk_pct(10.0).with_max_position_size(0.25);
        assert!((config.effective_size_fraction() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let mut config = EngineConfig::default();
        let rejected = config.apply_update(&ConfigUpdate {
            stop_loss_pct: Some(3.0),
            ..ConfigUpdate::default()
        });
        assert!(rejected.is_empty());
        assert_eq!(config.stop_loss_pct, 3.0);
        assert_eq!(config.take_profit_pct, 5.0);
        assert_eq!(config.max_position_size, 0.5);
    }

    #[test]
    fn test_update_rejects_out_of_range_position_size() {
        let mut config = EngineConfig::default();
        for bad in [0.0, -0.5, 1.5] {
            let rejected = config.apply_update(&ConfigUpdate {
                max_position_size: Some(bad),
                ..ConfigUpdate::default()
            });
            assert_eq!(rejected, vec!["max_position_size"]);
            assert_eq!(config.max_position_size, 0.5);
        }

        let rejected = config.apply_update(&ConfigUpdate {
            max_position_size: Some(1.0),
            take_profit_pct: Some(8.0),
            ..ConfigUpdate::default()
        });
        assert!(rejected.is_empty());
        assert_eq!(config.max_position_size, 1.0);
        assert_eq!(config.take_profit_pct, 8.0);
    }

    #[test]
    fn test_invalid_stop_loss() {
        let config = EngineConfig::default().with_stop_loss(0.0);
        assert!(matches!(config.validate(), Err(ParamsError::InvalidStopLoss(_))));
    }

    #[test]
    fn test_update_rejects_stop_loss_at_or_above_full_loss() {
        let mut config = EngineConfig::default();
        for bad in [100.0, 150.0, f64::INFINITY] {
            let rejected = config.apply_update(&ConfigUpdate {
                stop_loss_pct: Some(bad),
                ..ConfigUpdate::default()
            });
            assert_eq!(rejected, vec!["stop_loss_pct"]);
            assert_eq!(config.stop_loss_pct, EngineConfig::default().stop_loss_pct);
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_invalid_partial_fraction() {
        let config = EngineConfig::default().with_partial_take_profit(10.0, 1.0);
        assert!(matches!(config.validate(), Err(ParamsError::InvalidPartial(_))));
    }

    #[test]
    fn test_empty_age_window_rejected() {
        let mut config = EngineConfig::volume_tracker();
        config.entry.launch_exclusion_minutes = 120;
        config.entry.max_token_age_hours = 1;
        assert!(matches!(config.validate(), Err(ParamsError::InvalidEntryFilter(_))));
    }

    #[test]
    fn test_partial_toml_section_uses_defaults() {
        let config: EngineConfig = toml::from_str("stop_loss_pct = 4.0\n[trend]\nreversal_band_pct = 20.0\n").unwrap();
        assert_eq!(config.stop_loss_pct, 4.0);
        assert_eq!(config.take_profit_pct, 5.0);
        assert_eq!(config.trend.reversal_band_pct, 20.0);
        assert_eq!(config.trend.fill_lookback, 100);
    }
}
