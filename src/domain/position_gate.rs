//! Single-position gate. The brokerage is the only source of truth, so the
//! gate re-queries on every call and keeps nothing.

use crate::domain::error::BotError;
use crate::domain::position::Position;
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Open,
    Blocked(Vec<Position>),
}

impl GateDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GateDecision::Blocked(_))
    }
}

pub fn check(execution: &dyn ExecutionPort, symbol: &str) -> Result<GateDecision, BotError> {
    let positions = execution.open_positions(Some(symbol))?;
    if positions.is_empty() {
        Ok(GateDecision::Open)
    } else {
        Ok(GateDecision::Blocked(positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::AccountSnapshot;
    use crate::domain::order::{OrderRequest, OrderResult};
    use crate::domain::position::Side;
    use chrono::{TimeZone, Utc};

    struct Book(Result<Vec<Position>, String>);

    impl ExecutionPort for Book {
        fn open_positions(&self, _symbol: Option<&str>) -> Result<Vec<Position>, BotError> {
            self.0.clone().map_err(|reason| BotError::Execution { reason })
        }

        fn submit_order(&self, _request: &OrderRequest) -> Result<OrderResult, BotError> {
            unreachable!("the gate never submits")
        }

        fn account_snapshot(&self) -> Result<AccountSnapshot, BotError> {
            unreachable!("the gate never reads the account")
        }
    }

    fn position(ticket: u64) -> Position {
        Position {
            ticket,
            symbol: "EURUSD".into(),
            side: Side::Sell,
            volume: 0.01,
            open_price: 1.0850,
            open_time: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            stop_loss: 1.0865,
            take_profit: 1.0820,
            comment: String::new(),
        }
    }

    #[test]
    fn empty_book_is_open() {
        let decision = check(&Book(Ok(vec![])), "EURUSD").unwrap();
        assert_eq!(decision, GateDecision::Open);
        assert!(!decision.is_blocked());
    }

    #[test]
    fn any_position_blocks() {
        let decision = check(&Book(Ok(vec![position(1), position(2)])), "EURUSD").unwrap();
        match decision {
            GateDecision::Blocked(positions) => assert_eq!(positions.len(), 2),
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[test]
    fn query_failure_propagates() {
        let result = check(&Book(Err("terminal offline".into())), "EURUSD");
        assert!(matches!(result, Err(BotError::Execution { .. })));
    }
}
