//! Core domain types and decision logic.

pub mod bar;
pub mod calendar;
pub mod config;
pub mod error;
pub mod indicator;
pub mod market;
pub mod orchestrator;
pub mod order;
pub mod position;
pub mod position_gate;
pub mod scheduler;
pub mod signal;
