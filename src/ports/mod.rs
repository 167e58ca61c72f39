//! Port traits: the contracts the decision engine consumes.

pub mod clock_port;
pub mod config_port;
pub mod execution_port;
pub mod market_data_port;
