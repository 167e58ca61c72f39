//! One evaluation cycle: day gate, cooldown, position gate, indicators,
//! signal, order.
//!
//! ```text
//! DayGate ──non-trading──▶ NonTradingDay
//!    │
//! Cooldown ──deadline ahead──▶ CoolingDown
//!    │
//! PositionGate ──blocked──▶ Blocked            (blocked cooldown)
//!    │
//! Indicators ──error──▶ Abandoned              (no cooldown)
//!    │
//! Signal ──none──▶ NoSignal                    (no-signal cooldown)
//!    │
//! OrderBuilder ──invalid bracket──▶ Abandoned  (no cooldown)
//!    │
//! Submit ──accepted──▶ Submitted               (entry cooldown)
//!        ──rejected / failed──▶ Rejected / SubmitFailed (no-signal cooldown)
//! ```
//!
//! The cooldown is a deadline held here and checked on the next call; the
//! orchestrator never sleeps.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::domain::bar::Bar;
use crate::domain::calendar::TradingCalendar;
use crate::domain::config::{BotConfig, CooldownSettings};
use crate::domain::error::BotError;
use crate::domain::indicator::{IndicatorEngine, IndicatorSnapshot, ZoneLevels};
use crate::domain::order::{OrderBuilder, OrderRequest, OrderResult};
use crate::domain::position::Position;
use crate::domain::position_gate::{self, GateDecision};
use crate::domain::signal::{self, Signal};
use crate::ports::clock_port::Clock;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_data_port::MarketDataPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    Blocked,
    NoSignal,
    Entry,
}

#[derive(Debug)]
pub enum CycleOutcome {
    NonTradingDay,
    CoolingDown { until: DateTime<Utc> },
    Blocked { positions: Vec<Position> },
    NoSignal { snapshot: IndicatorSnapshot },
    Submitted { request: OrderRequest, result: OrderResult },
    Rejected { request: OrderRequest, result: OrderResult },
    SubmitFailed { request: OrderRequest, error: BotError },
    Abandoned { error: BotError },
}

impl CycleOutcome {
    pub fn cooldown(&self) -> Option<Cooldown> {
        match self {
            CycleOutcome::Blocked { .. } => Some(Cooldown::Blocked),
            CycleOutcome::NoSignal { .. }
            | CycleOutcome::Rejected { .. }
            | CycleOutcome::SubmitFailed { .. } => Some(Cooldown::NoSignal),
            CycleOutcome::Submitted { .. } => Some(Cooldown::Entry),
            CycleOutcome::NonTradingDay
            | CycleOutcome::CoolingDown { .. }
            | CycleOutcome::Abandoned { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::NonTradingDay => "non_trading_day",
            CycleOutcome::CoolingDown { .. } => "cooling_down",
            CycleOutcome::Blocked { .. } => "blocked",
            CycleOutcome::NoSignal { .. } => "no_signal",
            CycleOutcome::Submitted { .. } => "submitted",
            CycleOutcome::Rejected { .. } => "rejected",
            CycleOutcome::SubmitFailed { .. } => "submit_failed",
            CycleOutcome::Abandoned { .. } => "abandoned",
        }
    }
}

#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
    /// Deadline before which the next cycle is a no-op.
    pub cooldown_until: Option<DateTime<Utc>>,
}

pub struct Orchestrator<'a> {
    symbol: String,
    engine: IndicatorEngine,
    builder: OrderBuilder,
    calendar: TradingCalendar,
    cooldowns: CooldownSettings,
    market: &'a dyn MarketDataPort,
    execution: &'a dyn ExecutionPort,
    clock: &'a dyn Clock,
    cooldown_until: Option<DateTime<Utc>>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &BotConfig,
        market: &'a dyn MarketDataPort,
        execution: &'a dyn ExecutionPort,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            symbol: config.symbol.clone(),
            engine: IndicatorEngine::new(config.indicators.clone()),
            builder: OrderBuilder::new(config.symbol.clone(), config.risk.clone()),
            calendar: config.schedule.trading_days,
            cooldowns: config.schedule.cooldowns.clone(),
            market,
            execution,
            clock,
            cooldown_until: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    fn cooldown_length(&self, cooldown: Cooldown) -> TimeDelta {
        match cooldown {
            Cooldown::Blocked => self.cooldowns.blocked,
            Cooldown::NoSignal => self.cooldowns.no_signal,
            Cooldown::Entry => self.cooldowns.entry,
        }
    }

    /// Run exactly one decision point against the most recent bar.
    pub fn evaluate(&mut self) -> CycleReport {
        let started_at = self.clock.now();
        let outcome = self.run_cycle(started_at);

        if let Some(cooldown) = outcome.cooldown() {
            let until = self
                .clock
                .now()
                .checked_add_signed(self.cooldown_length(cooldown))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            debug!(?cooldown, %until, "cooldown set");
            self.cooldown_until = Some(until);
        }

        CycleReport {
            started_at,
            outcome,
            cooldown_until: self.cooldown_until,
        }
    }

    fn run_cycle(&self, now: DateTime<Utc>) -> CycleOutcome {
        if !self.calendar.is_trading_day(now) {
            info!(date = %now.date_naive(), "not a trading day, skipping");
            return CycleOutcome::NonTradingDay;
        }

        if let Some(until) = self.cooldown_until.filter(|until| now < *until) {
            debug!(%until, "cooling down");
            return CycleOutcome::CoolingDown { until };
        }

        self.log_account();

        match position_gate::check(self.execution, &self.symbol) {
            Ok(GateDecision::Open) => {
                debug!(symbol = %self.symbol, "no open position");
            }
            Ok(GateDecision::Blocked(positions)) => {
                info!(symbol = %self.symbol, count = positions.len(), "position already open");
                for position in &positions {
                    info!(%position, "open position");
                }
                return CycleOutcome::Blocked { positions };
            }
            Err(error) => {
                warn!(%error, "position query failed, abandoning cycle");
                return CycleOutcome::Abandoned { error };
            }
        }

        let snapshot = match self.compute_indicators(now) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "indicator evaluation failed, abandoning cycle");
                return CycleOutcome::Abandoned { error };
            }
        };
        log_snapshot(&snapshot, self.engine.strategy_name());

        let signal = signal::classify_snapshot(&snapshot);
        if signal == Signal::None {
            info!("checking for long and short signals: none");
            return CycleOutcome::NoSignal { snapshot };
        }
        info!(%signal, "entry signal");

        let request = match self.build_order(signal) {
            Ok(request) => request,
            Err(error) => {
                warn!(%error, "order construction failed, abandoning cycle");
                return CycleOutcome::Abandoned { error };
            }
        };

        info!(order = %request, "submitting order");
        match self.execution.submit_order(&request) {
            Ok(result) if result.accepted => {
                info!(ticket = ?result.ticket, retcode = result.retcode, "order placed");
                CycleOutcome::Submitted { request, result }
            }
            Ok(result) => {
                warn!(
                    retcode = result.retcode,
                    reason = result.reason.as_deref().unwrap_or("unspecified"),
                    "order rejected"
                );
                CycleOutcome::Rejected { request, result }
            }
            Err(error) => {
                warn!(%error, "order submission failed");
                CycleOutcome::SubmitFailed { request, error }
            }
        }
    }

    fn log_account(&self) {
        match self.execution.account_snapshot() {
            Ok(account) => info!(
                login = %account.login,
                balance = account.balance,
                equity = account.equity,
                margin_free = account.margin_free,
                currency = %account.currency,
                "account"
            ),
            Err(error) => warn!(%error, "account snapshot unavailable"),
        }
    }

    fn compute_indicators(&self, now: DateTime<Utc>) -> Result<IndicatorSnapshot, BotError> {
        let settings = self.engine.settings();
        let (trend_bars, zone_bars) = if settings.trend_timeframe == settings.zone_timeframe {
            let count = settings.trend_bars.max(settings.zone_bars);
            let bars = self
                .market
                .fetch_bars(&self.symbol, settings.zone_timeframe, now, count)?;
            (tail(&bars, settings.trend_bars).to_vec(), tail(&bars, settings.zone_bars).to_vec())
        } else {
            let trend = self.market.fetch_bars(
                &self.symbol,
                settings.trend_timeframe,
                now,
                settings.trend_bars,
            )?;
            let zone = self.market.fetch_bars(
                &self.symbol,
                settings.zone_timeframe,
                now,
                settings.zone_bars,
            )?;
            (trend, zone)
        };
        debug!(
            trend_bars = trend_bars.len(),
            zone_bars = zone_bars.len(),
            "bars fetched"
        );
        self.engine.evaluate(&trend_bars, &zone_bars)
    }

    fn build_order(&self, signal: Signal) -> Result<OrderRequest, BotError> {
        let info = self.market.instrument_info(&self.symbol)?;
        let quote = self.market.quote(&self.symbol)?;
        debug!(bid = quote.bid, ask = quote.ask, point = info.point, "quote");
        self.builder.build(signal, &quote, info.point)
    }
}

fn tail(bars: &[Bar], n: usize) -> &[Bar] {
    &bars[bars.len().saturating_sub(n)..]
}

fn log_snapshot(snapshot: &IndicatorSnapshot, strategy: &str) {
    let trend = snapshot.latest_trend();
    let zone = snapshot.latest_zone();
    match snapshot.levels {
        Some(ZoneLevels::Bands(levels)) => info!(
            strategy,
            fast = snapshot.latest_fast(),
            slow = snapshot.latest_slow(),
            ?trend,
            ?zone,
            close = snapshot.last_close,
            support = levels.support,
            resistance = levels.resistance,
            inner_support = levels.inner_support,
            inner_resistance = levels.inner_resistance,
            "indicators"
        ),
        Some(ZoneLevels::Extrema { support, resistance }) => info!(
            strategy,
            fast = snapshot.latest_fast(),
            slow = snapshot.latest_slow(),
            ?trend,
            ?zone,
            close = snapshot.last_close,
            ?support,
            ?resistance,
            "indicators"
        ),
        None => info!(strategy, ?trend, ?zone, close = snapshot.last_close, "indicators"),
    }
}
