//! Typed bot configuration, validated before any session is opened.

use crate::domain::bar::Timeframe;
use crate::domain::calendar::TradingCalendar;
use crate::domain::error::BotError;
use crate::domain::indicator::extremum::LocalExtremumStrategy;
use crate::domain::indicator::quantile::QuantileBandStrategy;
use crate::domain::indicator::{IndicatorSettings, ZoneMethod, ZoneMethodKind};
use crate::domain::order::RiskParams;
use crate::ports::config_port::ConfigPort;
use chrono::TimeDelta;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for every `*_secs` key (30 days).
pub const MAX_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct CooldownSettings {
    pub blocked: TimeDelta,
    pub no_signal: TimeDelta,
    pub entry: TimeDelta,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            blocked: TimeDelta::seconds(20),
            no_signal: TimeDelta::seconds(60),
            entry: TimeDelta::hours(6),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSettings {
    pub interval: TimeDelta,
    pub poll: Duration,
    pub trading_days: TradingCalendar,
    pub cooldowns: CooldownSettings,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval: TimeDelta::seconds(60),
            poll: Duration::from_secs(10),
            trading_days: TradingCalendar::default(),
            cooldowns: CooldownSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSettings {
    pub mode: String,
    pub login: Option<String>,
    pub server: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub symbol: String,
    pub indicators: IndicatorSettings,
    pub risk: RiskParams,
    pub schedule: ScheduleSettings,
    pub session: SessionSettings,
    pub log_level: String,
}

pub fn load_bot_config(config: &dyn ConfigPort) -> Result<BotConfig, BotError> {
    let symbol = match config.get_string("instrument", "symbol") {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err(BotError::missing("instrument", "symbol")),
    };

    Ok(BotConfig {
        symbol,
        indicators: load_indicators(config)?,
        risk: load_risk(config)?,
        schedule: load_schedule(config)?,
        session: load_session(config)?,
        log_level: config
            .get_string("logging", "level")
            .unwrap_or_else(|| "info".to_string()),
    })
}

/// Numeric key with a default. A present value that does not parse is an
/// error rather than a silent fallback.
pub(crate) fn number<T>(config: &dyn ConfigPort, section: &str, key: &str, default: T) -> Result<T, BotError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BotError::invalid(section, key, format!("'{}' is not a number: {}", raw.trim(), e))),
    }
}

fn positive_count(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<usize, BotError> {
    let value: i64 = number(config, section, key, default)?;
    if value < 1 {
        return Err(BotError::invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(value as usize)
}

fn positive_secs(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<i64, BotError> {
    let value: i64 = number(config, section, key, default)?;
    if value <= 0 {
        return Err(BotError::invalid(section, key, format!("{} must be positive", key)));
    }
    if value > MAX_SECS {
        return Err(BotError::invalid(section, key, format!("{} must be at most {}", key, MAX_SECS)));
    }
    Ok(value)
}

fn non_negative_secs(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<TimeDelta, BotError> {
    let value: i64 = number(config, section, key, default)?;
    if value < 0 {
        return Err(BotError::invalid(section, key, format!("{} must be non-negative", key)));
    }
    if value > MAX_SECS {
        return Err(BotError::invalid(section, key, format!("{} must be at most {}", key, MAX_SECS)));
    }
    Ok(TimeDelta::seconds(value))
}

fn timeframe(config: &dyn ConfigPort, key: &str, default: Timeframe) -> Result<Timeframe, BotError> {
    match config.get_string("indicators", key) {
        None => Ok(default),
        Some(s) => s.parse().map_err(|e: String| BotError::invalid("indicators", key, e)),
    }
}

fn quantile(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, BotError> {
    let value: f64 = number(config, "indicators", key, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(BotError::invalid("indicators", key, format!("{} must be between 0 and 1", key)));
    }
    Ok(value)
}

fn load_indicators(config: &dyn ConfigPort) -> Result<IndicatorSettings, BotError> {
    let fast_length = positive_count(config, "indicators", "fast_length", 9)?;
    let slow_length = positive_count(config, "indicators", "slow_length", 20)?;
    if fast_length >= slow_length {
        return Err(BotError::invalid(
            "indicators",
            "fast_length",
            "fast_length must be shorter than slow_length",
        ));
    }

    let trend_bars = positive_count(config, "indicators", "trend_bars", 45)?;
    if trend_bars < slow_length {
        return Err(BotError::invalid(
            "indicators",
            "trend_bars",
            format!("trend_bars must cover slow_length ({})", slow_length),
        ));
    }
    let zone_bars = positive_count(config, "indicators", "zone_bars", 45)?;

    let kind = match config.get_string("indicators", "zone_method") {
        None => ZoneMethodKind::Quantile,
        Some(s) => s
            .parse()
            .map_err(|e: String| BotError::invalid("indicators", "zone_method", e))?,
    };

    let zone_method = match kind {
        ZoneMethodKind::Quantile => {
            let strategy = QuantileBandStrategy {
                support_q: quantile(config, "support_quantile", 0.25)?,
                resistance_q: quantile(config, "resistance_quantile", 0.75)?,
                inner_support_q: quantile(config, "inner_support_quantile", 0.15)?,
                inner_resistance_q: quantile(config, "inner_resistance_quantile", 0.85)?,
            };
            let nested = strategy.inner_support_q <= strategy.support_q
                && strategy.support_q <= strategy.resistance_q
                && strategy.resistance_q <= strategy.inner_resistance_q;
            if !nested {
                return Err(BotError::invalid(
                    "indicators",
                    "inner_support_quantile",
                    "quantiles must satisfy inner_support <= support <= resistance <= inner_resistance",
                ));
            }
            if zone_bars < 2 {
                return Err(BotError::invalid("indicators", "zone_bars", "zone_bars must be at least 2"));
            }
            ZoneMethod::QuantileBand(strategy)
        }
        ZoneMethodKind::Extremum => {
            let order = positive_count(config, "indicators", "extremum_order", 5)?;
            if zone_bars <= order {
                return Err(BotError::invalid(
                    "indicators",
                    "zone_bars",
                    format!("zone_bars must exceed extremum_order ({})", order),
                ));
            }
            ZoneMethod::LocalExtremum(LocalExtremumStrategy::new(order))
        }
    };

    Ok(IndicatorSettings {
        fast_length,
        slow_length,
        trend_timeframe: timeframe(config, "trend_timeframe", Timeframe::H4)?,
        zone_timeframe: timeframe(config, "zone_timeframe", Timeframe::H1)?,
        trend_bars,
        zone_bars,
        zone_method,
    })
}

fn load_risk(config: &dyn ConfigPort) -> Result<RiskParams, BotError> {
    let defaults = RiskParams::default();
    let lot = number(config, "risk", "lot", defaults.lot)?;
    if lot <= 0.0 {
        return Err(BotError::invalid("risk", "lot", "lot must be positive"));
    }
    let stop_loss_points = number(config, "risk", "stop_loss_points", defaults.stop_loss_points)?;
    if stop_loss_points <= 0.0 {
        return Err(BotError::invalid("risk", "stop_loss_points", "stop_loss_points must be positive"));
    }
    let take_profit_points = number(config, "risk", "take_profit_points", defaults.take_profit_points)?;
    if take_profit_points <= 0.0 {
        return Err(BotError::invalid(
            "risk",
            "take_profit_points",
            "take_profit_points must be positive",
        ));
    }
    Ok(RiskParams {
        lot,
        stop_loss_points,
        take_profit_points,
        comment: config.get_string("risk", "comment").unwrap_or(defaults.comment),
    })
}

fn load_schedule(config: &dyn ConfigPort) -> Result<ScheduleSettings, BotError> {
    let interval = positive_secs(config, "schedule", "interval_secs", 60)?;
    let poll = positive_secs(config, "schedule", "poll_secs", 10)?;

    let trading_days = match config.get_string("schedule", "trading_days") {
        None => TradingCalendar::default(),
        Some(s) => s
            .parse::<TradingCalendar>()
            .map_err(|e| BotError::invalid("schedule", "trading_days", e))?,
    };

    Ok(ScheduleSettings {
        interval: TimeDelta::seconds(interval),
        poll: Duration::from_secs(poll as u64),
        trading_days,
        cooldowns: CooldownSettings {
            blocked: non_negative_secs(config, "schedule", "blocked_cooldown_secs", 20)?,
            no_signal: non_negative_secs(config, "schedule", "no_signal_cooldown_secs", 60)?,
            entry: non_negative_secs(config, "schedule", "entry_cooldown_secs", 21_600)?,
        },
    })
}

fn load_session(config: &dyn ConfigPort) -> Result<SessionSettings, BotError> {
    let mode = config
        .get_string("session", "mode")
        .unwrap_or_else(|| "paper".to_string())
        .trim()
        .to_lowercase();
    if mode != "paper" {
        return Err(BotError::invalid(
            "session",
            "mode",
            format!("unsupported session mode '{}'", mode),
        ));
    }
    Ok(SessionSettings {
        mode,
        login: config.get_string("session", "login"),
        server: config.get_string("session", "server"),
    })
}
