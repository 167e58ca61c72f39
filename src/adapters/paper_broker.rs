//! Paper brokerage session.
//!
//! Serves bars and quotes from a CSV history up to the clock's current time,
//! fills accepted orders at the quoted price, and closes positions when a
//! later bar trades through the stop-loss or take-profit (stop-loss first
//! when one bar touches both).

use std::cell::RefCell;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::domain::bar::{aggregate, Bar, Timeframe};
use crate::domain::config::{number, SessionSettings};
use crate::domain::error::BotError;
use crate::domain::market::{AccountSnapshot, InstrumentInfo, Quote};
use crate::domain::order::{OrderRequest, OrderResult};
use crate::domain::position::{Position, Side};
use crate::ports::clock_port::Clock;
use crate::ports::config_port::ConfigPort;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_data_port::MarketDataPort;

pub const RETCODE_DONE: u32 = 10009;
pub const RETCODE_REQUOTE: u32 = 10004;
pub const RETCODE_INVALID: u32 = 10013;
pub const RETCODE_INVALID_VOLUME: u32 = 10014;

#[derive(Debug, Clone, PartialEq)]
pub struct PaperSettings {
    pub bars_file: PathBuf,
    pub base_timeframe: Timeframe,
    pub point: f64,
    pub digits: u32,
    pub spread_points: f64,
    pub contract_size: f64,
    pub balance: f64,
    pub currency: String,
    pub login: String,
    pub server: String,
}

impl PaperSettings {
    pub fn from_config(config: &dyn ConfigPort, session: &SessionSettings) -> Result<Self, BotError> {
        let bars_file = match config.get_string("paper", "bars_file") {
            Some(s) if !s.trim().is_empty() => PathBuf::from(s.trim()),
            _ => return Err(BotError::missing("paper", "bars_file")),
        };
        let base_timeframe = match config.get_string("paper", "base_timeframe") {
            None => Timeframe::H1,
            Some(s) => s
                .parse()
                .map_err(|e: String| BotError::invalid("paper", "base_timeframe", e))?,
        };
        let point = number(config, "paper", "point", 0.00001)?;
        if point <= 0.0 {
            return Err(BotError::invalid("paper", "point", "point must be positive"));
        }
        let spread_points = number(config, "paper", "spread_points", 10.0)?;
        if spread_points < 0.0 {
            return Err(BotError::invalid("paper", "spread_points", "spread_points must be non-negative"));
        }
        let balance = number(config, "paper", "balance", 10_000.0)?;
        if balance <= 0.0 {
            return Err(BotError::invalid("paper", "balance", "balance must be positive"));
        }
        let contract_size = number(config, "paper", "contract_size", 100_000.0)?;
        if contract_size <= 0.0 {
            return Err(BotError::invalid("paper", "contract_size", "contract_size must be positive"));
        }

        Ok(Self {
            bars_file,
            base_timeframe,
            point,
            digits: (-point.log10()).round().max(0.0) as u32,
            spread_points,
            contract_size,
            balance,
            currency: config
                .get_string("paper", "currency")
                .unwrap_or_else(|| "USD".to_string()),
            login: session.login.clone().unwrap_or_else(|| "paper".to_string()),
            server: session.server.clone().unwrap_or_else(|| "local".to_string()),
        })
    }
}

#[derive(Debug)]
struct PaperState {
    positions: Vec<Position>,
    next_ticket: u64,
    balance: f64,
}

pub struct PaperBroker<'a> {
    settings: PaperSettings,
    symbol: String,
    bars: Vec<Bar>,
    clock: &'a dyn Clock,
    state: RefCell<PaperState>,
}

impl<'a> PaperBroker<'a> {
    /// Open the session. Any failure here is fatal to the caller.
    pub fn connect(settings: PaperSettings, symbol: &str, clock: &'a dyn Clock) -> Result<Self, BotError> {
        let bars = CsvAdapter::new(settings.bars_file.clone())
            .load_bars()
            .map_err(|e| BotError::Session {
                reason: e.to_string(),
            })?;
        Self::with_bars(settings, symbol, bars, clock)
    }

    pub fn with_bars(
        settings: PaperSettings,
        symbol: &str,
        bars: Vec<Bar>,
        clock: &'a dyn Clock,
    ) -> Result<Self, BotError> {
        if bars.is_empty() {
            return Err(BotError::Session {
                reason: format!("no bars in {}", settings.bars_file.display()),
            });
        }
        info!(
            symbol,
            bars = bars.len(),
            first = %bars[0].time,
            last = %bars[bars.len() - 1].time,
            "paper session connected"
        );
        let balance = settings.balance;
        Ok(Self {
            settings,
            symbol: symbol.to_string(),
            bars,
            clock,
            state: RefCell::new(PaperState {
                positions: Vec::new(),
                next_ticket: 1,
                balance,
            }),
        })
    }

    /// Close the session, reporting what is still open.
    pub fn shutdown(self) {
        let state = self.state.into_inner();
        info!(
            open_positions = state.positions.len(),
            balance = state.balance,
            "paper session closed"
        );
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), BotError> {
        if symbol != self.symbol {
            return Err(BotError::MarketData {
                reason: format!("unknown symbol {}", symbol),
            });
        }
        Ok(())
    }

    fn visible(&self, until: DateTime<Utc>) -> &[Bar] {
        let end = self.bars.partition_point(|b| b.time <= until);
        &self.bars[..end]
    }

    fn current_bid(&self, now: DateTime<Utc>) -> Option<f64> {
        self.visible(now).last().map(|b| b.close)
    }

    /// Close positions whose bracket was traded through by bars up to `now`.
    fn settle(&self, now: DateTime<Utc>) {
        let mut state = self.state.borrow_mut();
        let visible = self.visible(now);
        let contract_size = self.settings.contract_size;
        let spread = self.settings.spread_points * self.settings.point;
        let mut realized = 0.0;

        state.positions.retain(|position| {
            // bars are bid prices; shorts close on the ask
            let offset = if position.is_short() { spread } else { 0.0 };
            let exit = visible
                .iter()
                .filter(|bar| bar.time > position.open_time)
                .find_map(|bar| {
                    if bar.touches(position.stop_loss - offset)
                        || position.should_stop_loss(bar.close + offset)
                    {
                        Some(position.stop_loss)
                    } else if bar.touches(position.take_profit - offset)
                        || position.should_take_profit(bar.close + offset)
                    {
                        Some(position.take_profit)
                    } else {
                        None
                    }
                });
            match exit {
                Some(price) => {
                    let pnl = position_pnl(position, price, contract_size);
                    info!(ticket = position.ticket, exit = price, pnl, "paper position closed");
                    realized += pnl;
                    false
                }
                None => true,
            }
        });
        state.balance += realized;
    }
}

fn position_pnl(position: &Position, exit: f64, contract_size: f64) -> f64 {
    let direction = match position.side {
        Side::Buy => 1.0,
        Side::Sell => -1.0,
    };
    direction * (exit - position.open_price) * position.volume * contract_size
}

impl MarketDataPort for PaperBroker<'_> {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Bar>, BotError> {
        self.check_symbol(symbol)?;
        let base = self.settings.base_timeframe;
        if timeframe.minutes() % base.minutes() != 0 {
            return Err(BotError::MarketData {
                reason: format!("cannot build {} bars from {} history", timeframe, base),
            });
        }

        let visible = self.visible(from);
        let bars = if timeframe == base {
            visible.to_vec()
        } else {
            aggregate(visible, timeframe)
        };
        let start = bars.len().saturating_sub(count);
        debug!(%timeframe, returned = bars.len() - start, "paper bars");
        Ok(bars[start..].to_vec())
    }

    fn quote(&self, symbol: &str) -> Result<Quote, BotError> {
        self.check_symbol(symbol)?;
        let now = self.clock.now();
        let bid = self.current_bid(now).ok_or_else(|| BotError::MarketData {
            reason: format!("no price for {} at {}", symbol, now),
        })?;
        Ok(Quote {
            bid,
            ask: bid + self.settings.spread_points * self.settings.point,
            time: now,
        })
    }

    fn instrument_info(&self, symbol: &str) -> Result<InstrumentInfo, BotError> {
        self.check_symbol(symbol)?;
        Ok(InstrumentInfo {
            symbol: self.symbol.clone(),
            point: self.settings.point,
            digits: self.settings.digits,
        })
    }
}

impl ExecutionPort for PaperBroker<'_> {
    fn open_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, BotError> {
        self.settle(self.clock.now());
        let state = self.state.borrow();
        Ok(state
            .positions
            .iter()
            .filter(|p| symbol.is_none_or(|s| p.symbol == s))
            .cloned()
            .collect())
    }

    fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult, BotError> {
        if request.symbol() != self.symbol {
            return Ok(OrderResult::rejected(
                RETCODE_INVALID,
                format!("unknown symbol {}", request.symbol()),
            ));
        }
        if request.volume() <= 0.0 {
            return Ok(OrderResult::rejected(RETCODE_INVALID_VOLUME, "invalid volume"));
        }

        let quote = self.quote(request.symbol())?;
        let market = match request.side() {
            Side::Buy => quote.ask,
            Side::Sell => quote.bid,
        };
        if (market - request.price()).abs() > self.settings.point / 2.0 {
            return Ok(OrderResult::rejected(
                RETCODE_REQUOTE,
                format!("requote: market {} vs requested {}", market, request.price()),
            ));
        }

        let mut state = self.state.borrow_mut();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.positions.push(Position {
            ticket,
            symbol: request.symbol().to_string(),
            side: request.side(),
            volume: request.volume(),
            open_price: market,
            open_time: quote.time,
            stop_loss: request.stop_loss(),
            take_profit: request.take_profit(),
            comment: request.comment().to_string(),
        });
        Ok(OrderResult::accepted(RETCODE_DONE, ticket, market))
    }

    fn account_snapshot(&self) -> Result<AccountSnapshot, BotError> {
        let now = self.clock.now();
        self.settle(now);
        let state = self.state.borrow();
        let bid = self.current_bid(now).unwrap_or(0.0);
        let ask = bid + self.settings.spread_points * self.settings.point;
        let floating: f64 = state
            .positions
            .iter()
            .map(|p| {
                let exit = if p.is_long() { bid } else { ask };
                position_pnl(p, exit, self.settings.contract_size)
            })
            .sum();
        Ok(AccountSnapshot {
            login: self.settings.login.clone(),
            server: self.settings.server.clone(),
            currency: self.settings.currency.clone(),
            balance: state.balance,
            equity: state.balance + floating,
            margin_free: state.balance + floating,
        })
    }
}
