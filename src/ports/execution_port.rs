//! Execution port: positions, order submission and account state.
//!
//! Positions are owned by the brokerage; callers read them fresh each time.

use crate::domain::error::BotError;
use crate::domain::market::AccountSnapshot;
use crate::domain::order::{OrderRequest, OrderResult};
use crate::domain::position::Position;

pub trait ExecutionPort {
    /// Open positions, optionally restricted to one symbol.
    fn open_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>, BotError>;

    /// `Err` means the request never reached the broker; a broker refusal is
    /// an `Ok` result with `accepted == false`.
    fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult, BotError>;

    fn account_snapshot(&self) -> Result<AccountSnapshot, BotError>;
}
