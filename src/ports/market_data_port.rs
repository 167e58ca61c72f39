//! Market data port: bars, quotes and instrument metadata.

use crate::domain::bar::{Bar, Timeframe};
use crate::domain::error::BotError;
use crate::domain::market::{InstrumentInfo, Quote};
use chrono::{DateTime, Utc};

pub trait MarketDataPort {
    /// Up to `count` bars opened at or before `from`, oldest first.
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Bar>, BotError>;

    fn quote(&self, symbol: &str) -> Result<Quote, BotError>;

    fn instrument_info(&self, symbol: &str) -> Result<InstrumentInfo, BotError>;
}
