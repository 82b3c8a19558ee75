//! Entry Filters
//!
//! Decides whether a flat engine should open a position. Volume-breakout
//! mode requires every filter to pass:
//! 1. Token age strictly inside (launch exclusion, max age)
//! 2. Market cap at or above the minimum
//! 3. Current window closed green
//! 4. Window volume above a market-cap-relative threshold, with a lower
//!    percentage for large caps

use thiserror::Error;

use crate::domain::{MarketSnapshot, Side};
use super::params::{EntryConfig, EntryMode};

/// Why an entry did not fire
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryRejection {
    #[error("token stats unavailable")]
    MissingTokenStats,
    #[error("token age {age_minutes:.2}min outside trading range")]
    TokenAge { age_minutes: f64 },
    #[error("market cap too low: {market_cap} < {minimum}")]
    MarketCapTooLow { market_cap: f64, minimum: f64 },
    #[error("candle is not green")]
    RedCandle,
    #[error("volume too low: {volume:.2}, needed > {needed:.2}")]
    VolumeTooLow { volume: f64, needed: f64 },
    #[error("no momentum: bullish share {bullish_pct:.2}%")]
    NoMomentum { bullish_pct: f64 },
    #[error("no capital available: {0}")]
    NoCapital(f64),
}

/// Required window volume for a token of this market cap
pub fn volume_threshold(config: &EntryConfig, market_cap: f64) -> f64 {
    let pct = if market_cap > config.large_cap_threshold {
        config.large_cap_volume_threshold_pct
    } else {
        config.volume_threshold_pct
    };
    market_cap * pct / 100.0
}

/// Evaluate entry conditions; on success returns the side to open
pub fn check_entry(config: &EntryConfig, snapshot: &MarketSnapshot) -> Result<Side, EntryRejection> {
    match config.mode {
        EntryMode::VolumeBreakout => check_volume_breakout(config, snapshot),
        EntryMode::Trend => check_trend(config, snapshot),
    }
}

fn check_volume_breakout(
    config: &EntryConfig,
    snapshot: &MarketSnapshot,
) -> Result<Side, EntryRejection> {
    let (age_minutes, market_cap) = match (snapshot.token_age_minutes(), snapshot.market_cap) {
        (Some(age), Some(cap)) => (age, cap),
        _ => return Err(EntryRejection::MissingTokenStats),
    };

    let min_age = config.launch_exclusion_minutes as f64;
    let max_age = config.max_token_age_hours as f64 * 60.0;
    if age_minutes <= min_age || age_minutes >= max_age {
        return Err(EntryRejection::TokenAge { age_minutes });
    }

    if market_cap < config.min_market_cap {
        return Err(EntryRejection::MarketCapTooLow {
            market_cap,
            minimum: config.min_market_cap,
        });
    }

    if !snapshot.is_green_candle() {
        return Err(EntryRejection::RedCandle);
    }

    let needed = volume_threshold(config, market_cap);
    if snapshot.window_volume <= needed {
        return Err(EntryRejection::VolumeTooLow {
            volume: snapshot.window_volume,
            needed,
        });
    }

    Ok(Side::Long)
}

fn check_trend(config: &EntryConfig, snapshot: &MarketSnapshot) -> Result<Side, EntryRejection> {
    if snapshot.bullish_pct > 50.0 + config.entry_band_pct {
        Ok(Side::Long)
    } else if config.allow_short && snapshot.bullish_pct < 50.0 - config.entry_band_pct {
        Ok(Side::Short)
    } else {
        Err(EntryRejection::NoMomentum {
            bullish_pct: snapshot.bullish_pct,
        })
    }
}
