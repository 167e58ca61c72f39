//! Bracket order construction.
//!
//! An `OrderRequest` can only come out of `OrderBuilder::build`, which prices
//! the entry off the live quote and places the stop-loss and take-profit a
//! fixed number of points away on the losing and winning side respectively:
//!
//! - Long: entry = ask, SL = ask - sl_points * point, TP = ask + tp_points * point
//! - Short: entry = bid, SL = bid + sl_points * point, TP = bid - tp_points * point

use crate::domain::error::BotError;
use crate::domain::market::Quote;
use crate::domain::position::Side;
use crate::domain::signal::Signal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    GoodTillCancelled,
}

/// Partial-fill handling. `Return` leaves the unfilled remainder working;
/// the exact semantics belong to the brokerage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillingPolicy {
    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    symbol: String,
    volume: f64,
    side: Side,
    price: f64,
    stop_loss: f64,
    take_profit: f64,
    time_in_force: TimeInForce,
    filling: FillingPolicy,
    comment: String,
}

impl OrderRequest {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn stop_loss(&self) -> f64 {
        self.stop_loss
    }

    pub fn take_profit(&self) -> f64 {
        self.take_profit
    }

    pub fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    pub fn filling(&self) -> FillingPolicy {
        self.filling
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} sl={} tp={}",
            self.side, self.volume, self.symbol, self.price, self.stop_loss, self.take_profit
        )
    }
}

/// Broker verdict on a submitted request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    pub accepted: bool,
    pub retcode: u32,
    pub ticket: Option<u64>,
    pub fill_price: Option<f64>,
    pub reason: Option<String>,
}

impl OrderResult {
    pub fn accepted(retcode: u32, ticket: u64, fill_price: f64) -> Self {
        Self {
            accepted: true,
            retcode,
            ticket: Some(ticket),
            fill_price: Some(fill_price),
            reason: None,
        }
    }

    pub fn rejected(retcode: u32, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            retcode,
            ticket: None,
            fill_price: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskParams {
    pub lot: f64,
    pub stop_loss_points: f64,
    pub take_profit_points: f64,
    pub comment: String,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            lot: 0.01,
            stop_loss_points: 150.0,
            take_profit_points: 300.0,
            comment: "zonetrader open".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderBuilder {
    symbol: String,
    risk: RiskParams,
}

impl OrderBuilder {
    pub fn new(symbol: impl Into<String>, risk: RiskParams) -> Self {
        Self {
            symbol: symbol.into(),
            risk,
        }
    }

    pub fn risk(&self) -> &RiskParams {
        &self.risk
    }

    pub fn build(&self, signal: Signal, quote: &Quote, point: f64) -> Result<OrderRequest, BotError> {
        let side = match signal {
            Signal::Long => Side::Buy,
            Signal::Short => Side::Sell,
            Signal::None => return Err(invalid("no entry direction")),
        };
        if !quote.is_valid() {
            return Err(invalid(format!("unusable quote bid={} ask={}", quote.bid, quote.ask)));
        }
        if !(point.is_finite() && point > 0.0) {
            return Err(invalid(format!("point size must be positive, got {}", point)));
        }
        if !(self.risk.lot > 0.0) {
            return Err(invalid(format!("lot must be positive, got {}", self.risk.lot)));
        }
        if !(self.risk.stop_loss_points > 0.0 && self.risk.take_profit_points > 0.0) {
            return Err(invalid("stop-loss and take-profit distances must be positive"));
        }

        let sl_offset = self.risk.stop_loss_points * point;
        let tp_offset = self.risk.take_profit_points * point;
        let (price, stop_loss, take_profit) = match side {
            Side::Buy => (quote.ask, quote.ask - sl_offset, quote.ask + tp_offset),
            Side::Sell => (quote.bid, quote.bid + sl_offset, quote.bid - tp_offset),
        };

        let straddles = match side {
            Side::Buy => stop_loss < price && price < take_profit,
            Side::Sell => take_profit < price && price < stop_loss,
        };
        if !straddles {
            return Err(invalid(format!(
                "{} at {} with sl={} tp={} does not straddle entry",
                side, price, stop_loss, take_profit
            )));
        }
        if stop_loss <= 0.0 || take_profit <= 0.0 {
            return Err(invalid(format!(
                "bracket level at or below zero: sl={} tp={}",
                stop_loss, take_profit
            )));
        }

        Ok(OrderRequest {
            symbol: self.symbol.clone(),
            volume: self.risk.lot,
            side,
            price,
            stop_loss,
            take_profit,
            time_in_force: TimeInForce::GoodTillCancelled,
            filling: FillingPolicy::Return,
            comment: self.risk.comment.clone(),
        })
    }
}

fn invalid(reason: impl Into<String>) -> BotError {
    BotError::InvalidBracket {
        reason: reason.into(),
    }
}
