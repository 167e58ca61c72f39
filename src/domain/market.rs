//! Live market and account values returned by the brokerage.

use chrono::{DateTime, Utc};

/// Best bid/ask at the instant of retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub time: DateTime<Utc>,
}

impl Quote {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    pub fn is_valid(&self) -> bool {
        self.bid.is_finite() && self.ask.is_finite() && self.bid > 0.0 && self.ask >= self.bid
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentInfo {
    pub symbol: String,
    /// Minimum price increment.
    pub point: f64,
    pub digits: u32,
}

/// Read-only account state; logged, never acted upon.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub login: String,
    pub server: String,
    pub currency: String,
    pub balance: f64,
    pub equity: f64,
    pub margin_free: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quote(bid: f64, ask: f64) -> Quote {
        Quote {
            bid,
            ask,
            time: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn spread_is_ask_minus_bid() {
        let q = quote(1.08500, 1.08510);
        assert!((q.spread() - 0.00010).abs() < 1e-12);
    }

    #[test]
    fn validity() {
        assert!(quote(1.0850, 1.0851).is_valid());
        assert!(quote(1.0850, 1.0850).is_valid());
        assert!(!quote(1.0851, 1.0850).is_valid());
        assert!(!quote(0.0, 1.0).is_valid());
        assert!(!quote(f64::NAN, 1.0).is_valid());
    }
}
