//! Indicator derivation: trend bias from two EMAs and zone classification.
//!
//! - `TrendBias`: per trend-timeframe bar, from fast vs slow EMA of closes
//! - `ZoneClassification`: per trading-timeframe bar, from a pluggable `ZoneStrategy`
//! - `IndicatorEngine`: evaluates both over freshly fetched windows
//!
//! Nothing here carries state between evaluations.

pub mod ema;
pub mod extremum;
pub mod quantile;

use crate::domain::bar::{closes, Bar, Timeframe};
use crate::domain::error::BotError;
use std::fmt;
use std::str::FromStr;

use self::extremum::LocalExtremumStrategy;
use self::quantile::{QuantileBandStrategy, QuantileLevels};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendBias {
    Neutral,
    Long,
    Short,
}

impl TrendBias {
    pub fn from_emas(fast: f64, slow: f64) -> Self {
        if fast > slow {
            TrendBias::Long
        } else if fast < slow {
            TrendBias::Short
        } else {
            TrendBias::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneClassification {
    None,
    Support,
    Resistance,
}

/// Price levels behind a zone classification, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneLevels {
    Bands(QuantileLevels),
    Extrema {
        support: Option<f64>,
        resistance: Option<f64>,
    },
}

/// Interchangeable support/resistance backend.
pub trait ZoneStrategy {
    fn name(&self) -> &'static str;

    /// Smallest window the strategy can classify.
    fn min_bars(&self) -> usize;

    /// Whether an entry also needs the trend bias to agree with the zone.
    fn requires_trend_confirmation(&self) -> bool;

    /// Classify every close in the window, oldest first.
    fn classify(&self, closes: &[f64]) -> (Vec<ZoneClassification>, Option<ZoneLevels>);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneMethod {
    QuantileBand(QuantileBandStrategy),
    LocalExtremum(LocalExtremumStrategy),
}

impl ZoneMethod {
    pub fn strategy(&self) -> Box<dyn ZoneStrategy> {
        match *self {
            ZoneMethod::QuantileBand(s) => Box::new(s),
            ZoneMethod::LocalExtremum(s) => Box::new(s),
        }
    }
}

impl fmt::Display for ZoneMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneMethod::QuantileBand(s) => write!(
                f,
                "quantile({},{},{},{})",
                s.inner_support_q, s.support_q, s.resistance_q, s.inner_resistance_q
            ),
            ZoneMethod::LocalExtremum(s) => write!(f, "extremum({})", s.order),
        }
    }
}

/// Method name as written in config; parameters come from separate keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneMethodKind {
    Quantile,
    Extremum,
}

impl FromStr for ZoneMethodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quantile" | "quantile_band" => Ok(ZoneMethodKind::Quantile),
            "extremum" | "local_extremum" => Ok(ZoneMethodKind::Extremum),
            other => Err(format!("unknown zone method '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSettings {
    pub fast_length: usize,
    pub slow_length: usize,
    pub trend_timeframe: Timeframe,
    pub zone_timeframe: Timeframe,
    pub trend_bars: usize,
    pub zone_bars: usize,
    pub zone_method: ZoneMethod,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            fast_length: 9,
            slow_length: 20,
            trend_timeframe: Timeframe::H4,
            zone_timeframe: Timeframe::H1,
            trend_bars: 45,
            zone_bars: 45,
            zone_method: ZoneMethod::QuantileBand(QuantileBandStrategy::default()),
        }
    }
}

/// Everything derived from one pair of bar windows.
#[derive(Debug, Clone)]
pub struct IndicatorSnapshot {
    pub fast_ema: Vec<f64>,
    pub slow_ema: Vec<f64>,
    pub trend: Vec<TrendBias>,
    pub zones: Vec<ZoneClassification>,
    pub levels: Option<ZoneLevels>,
    pub last_close: f64,
    pub requires_trend_confirmation: bool,
}

impl IndicatorSnapshot {
    pub fn latest_trend(&self) -> TrendBias {
        self.trend.last().copied().unwrap_or(TrendBias::Neutral)
    }

    pub fn latest_zone(&self) -> ZoneClassification {
        self.zones.last().copied().unwrap_or(ZoneClassification::None)
    }

    pub fn latest_fast(&self) -> f64 {
        self.fast_ema.last().copied().unwrap_or(f64::NAN)
    }

    pub fn latest_slow(&self) -> f64 {
        self.slow_ema.last().copied().unwrap_or(f64::NAN)
    }
}

pub struct IndicatorEngine {
    settings: IndicatorSettings,
    strategy: Box<dyn ZoneStrategy>,
}

impl IndicatorEngine {
    pub fn new(settings: IndicatorSettings) -> Self {
        let strategy = settings.zone_method.strategy();
        Self { settings, strategy }
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Longest lookback each window must satisfy: (trend, zone).
    pub fn min_bars(&self) -> (usize, usize) {
        (
            self.settings.slow_length.max(self.settings.fast_length).max(1),
            self.strategy.min_bars().max(1),
        )
    }

    /// Derive trend and zones. Fails with `InsufficientData` when either
    /// window is shorter than its lookback.
    pub fn evaluate(&self, trend_bars: &[Bar], zone_bars: &[Bar]) -> Result<IndicatorSnapshot, BotError> {
        let (trend_min, zone_min) = self.min_bars();
        check_window(trend_bars, trend_min, self.settings.trend_timeframe)?;
        check_window(zone_bars, zone_min, self.settings.zone_timeframe)?;

        let trend_closes = closes(trend_bars);
        let fast_ema = ema::calculate_ema(&trend_closes, self.settings.fast_length);
        let slow_ema = ema::calculate_ema(&trend_closes, self.settings.slow_length);
        let trend = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(&f, &s)| TrendBias::from_emas(f, s))
            .collect();

        let zone_closes = closes(zone_bars);
        let (zones, levels) = self.strategy.classify(&zone_closes);
        let last_close = zone_closes.last().copied().unwrap_or(f64::NAN);

        Ok(IndicatorSnapshot {
            fast_ema,
            slow_ema,
            trend,
            zones,
            levels,
            last_close,
            requires_trend_confirmation: self.strategy.requires_trend_confirmation(),
        })
    }
}

fn check_window(bars: &[Bar], minimum: usize, timeframe: Timeframe) -> Result<(), BotError> {
    if bars.len() < minimum {
        return Err(BotError::InsufficientData {
            timeframe: timeframe.to_string(),
            bars: bars.len(),
            minimum,
        });
    }
    Ok(())
}
