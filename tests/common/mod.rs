#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;
use zonetrader::domain::bar::{Bar, Timeframe};
use zonetrader::domain::calendar::TradingCalendar;
use zonetrader::domain::config::{BotConfig, ScheduleSettings, SessionSettings};
use zonetrader::domain::error::BotError;
use zonetrader::domain::indicator::extremum::LocalExtremumStrategy;
use zonetrader::domain::indicator::{IndicatorSettings, ZoneMethod};
use zonetrader::domain::market::{AccountSnapshot, InstrumentInfo, Quote};
use zonetrader::domain::order::{OrderRequest, OrderResult, RiskParams};
use zonetrader::domain::position::{Position, Side};
use zonetrader::ports::clock_port::Clock;
use zonetrader::ports::execution_port::ExecutionPort;
use zonetrader::ports::market_data_port::MarketDataPort;

pub const POINT: f64 = 0.00001;

/// Clock whose `sleep` advances time instead of blocking.
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(TimeDelta::from_std(duration).unwrap());
    }
}

pub enum SubmitBehavior {
    Accept,
    Reject(u32, String),
    Fail(String),
}

/// Brokerage double implementing both collaborator ports, counting calls.
pub struct MockBroker {
    pub symbol: String,
    pub bars: HashMap<Timeframe, Vec<Bar>>,
    pub quote: Quote,
    pub point: f64,
    pub positions: RefCell<Vec<Position>>,
    pub submit: SubmitBehavior,
    pub submitted: RefCell<Vec<OrderRequest>>,
    pub bar_fetches: Cell<usize>,
    pub quote_fetches: Cell<usize>,
    pub position_queries: Cell<usize>,
    pub account_queries: Cell<usize>,
}

impl MockBroker {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            bars: HashMap::new(),
            quote: Quote {
                bid: 1.08100,
                ask: 1.08112,
                time: monday(),
            },
            point: POINT,
            positions: RefCell::new(Vec::new()),
            submit: SubmitBehavior::Accept,
            submitted: RefCell::new(Vec::new()),
            bar_fetches: Cell::new(0),
            quote_fetches: Cell::new(0),
            position_queries: Cell::new(0),
            account_queries: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.bars.insert(timeframe, bars);
        self
    }

    pub fn with_quote(mut self, bid: f64, ask: f64) -> Self {
        self.quote.bid = bid;
        self.quote.ask = ask;
        self
    }

    pub fn with_position(self, position: Position) -> Self {
        self.positions.borrow_mut().push(position);
        self
    }

    pub fn with_submit(mut self, submit: SubmitBehavior) -> Self {
        self.submit = submit;
        self
    }

    pub fn total_queries(&self) -> usize {
        self.bar_fetches.get()
            + self.quote_fetches.get()
            + self.position_queries.get()
            + self.account_queries.get()
    }
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

impl MarketDataPort for MockBroker {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        _from: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Bar>, BotError> {
        bump(&self.bar_fetches);
        assert_eq!(symbol, self.symbol);
        let bars = self.bars.get(&timeframe).cloned().unwrap_or_default();
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    fn quote(&self, symbol: &str) -> Result<Quote, BotError> {
        bump(&self.quote_fetches);
        assert_eq!(symbol, self.symbol);
        Ok(self.quote)
    }

    fn instrument_info(&self, symbol: &str) -> Result<InstrumentInfo, BotError> {
        Ok(InstrumentInfo {
            symbol: symbol.to_string(),
            point: self.point,
            digits: 5,
        })
    }
}

impl ExecutionPort for MockBroker {
    fn open_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, BotError> {
        bump(&self.position_queries);
        Ok(self
            .positions
            .borrow()
            .iter()
            .filter(|p| symbol.is_none_or(|s| p.symbol == s))
            .cloned()
            .collect())
    }

    fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult, BotError> {
        self.submitted.borrow_mut().push(request.clone());
        match &self.submit {
            SubmitBehavior::Accept => {
                let ticket = self.submitted.borrow().len() as u64;
                self.positions.borrow_mut().push(Position {
                    ticket,
                    symbol: request.symbol().to_string(),
                    side: request.side(),
                    volume: request.volume(),
                    open_price: request.price(),
                    open_time: self.quote.time,
                    stop_loss: request.stop_loss(),
                    take_profit: request.take_profit(),
                    comment: request.comment().to_string(),
                });
                Ok(OrderResult::accepted(10009, ticket, request.price()))
            }
            SubmitBehavior::Reject(code, reason) => Ok(OrderResult::rejected(*code, reason.clone())),
            SubmitBehavior::Fail(reason) => Err(BotError::Execution {
                reason: reason.clone(),
            }),
        }
    }

    fn account_snapshot(&self) -> Result<AccountSnapshot, BotError> {
        bump(&self.account_queries);
        Ok(AccountSnapshot {
            login: "5025".into(),
            server: "Demo".into(),
            currency: "USD".into(),
            balance: 10_000.0,
            equity: 10_000.0,
            margin_free: 10_000.0,
        })
    }
}

/// 2024-03-04 10:00 UTC, a Monday.
pub fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
}

/// 2024-03-10 10:00 UTC, a Sunday.
pub fn sunday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap()
}

pub fn bars_from_closes(closes: &[f64], timeframe: Timeframe, end: DateTime<Utc>) -> Vec<Bar> {
    let n = closes.len() as i32;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            time: end - timeframe.duration() * (n - 1 - i as i32),
            open: close,
            high: close + 0.0002,
            low: close - 0.0002,
            close,
            volume: 1000,
        })
        .collect()
}

/// 44 rising closes then a dip below the 15th percentile; fast EMA stays above slow.
pub fn uptrend_with_dip() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..44).map(|i| 1.0800 + i as f64 * 0.0005).collect();
    closes.push(1.0810);
    closes
}

/// Mirror image: falling closes then a spike above the 85th percentile.
pub fn downtrend_with_spike() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..44).map(|i| 1.1015 - i as f64 * 0.0005).collect();
    closes.push(1.1005);
    closes
}

/// Closes cycling through seven levels around 1.0850; the last close is
/// neither a band extreme nor a local extremum.
pub fn ranging() -> Vec<f64> {
    (0..45)
        .map(|i| 1.0850 + 0.0010 * ((i % 7) as f64 - 3.0) / 3.0)
        .collect()
}

pub fn single_timeframe_settings(zone_method: ZoneMethod) -> IndicatorSettings {
    IndicatorSettings {
        trend_timeframe: Timeframe::H1,
        zone_timeframe: Timeframe::H1,
        zone_method,
        ..IndicatorSettings::default()
    }
}

pub fn bot_config(indicators: IndicatorSettings) -> BotConfig {
    BotConfig {
        symbol: "EURUSD".to_string(),
        indicators,
        risk: RiskParams::default(),
        schedule: ScheduleSettings {
            trading_days: TradingCalendar::default(),
            ..ScheduleSettings::default()
        },
        session: SessionSettings {
            mode: "paper".into(),
            login: None,
            server: None,
        },
        log_level: "info".to_string(),
    }
}

pub fn extremum(order: usize) -> ZoneMethod {
    ZoneMethod::LocalExtremum(LocalExtremumStrategy::new(order))
}

pub fn open_position(symbol: &str) -> Position {
    Position {
        ticket: 99,
        symbol: symbol.to_string(),
        side: Side::Buy,
        volume: 0.01,
        open_price: 1.0850,
        open_time: monday() - TimeDelta::hours(3),
        stop_loss: 1.0835,
        take_profit: 1.0880,
        comment: "zonetrader open".into(),
    }
}
