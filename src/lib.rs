//! zonetrader: automated intraday bracket-order trading loop.
//!
//! Hexagonal architecture: decision logic in [`domain`], collaborator
//! contracts in [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
