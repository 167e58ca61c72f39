//! Entry signal from the latest indicator values.
//!
//! Quantile bands need the trend to agree with the zone: Long at support in
//! an up-trend, Short at resistance in a down-trend. Local extrema trade the
//! zone alone; a local minimum is Long, a local maximum is Short.

use crate::domain::indicator::{IndicatorSnapshot, TrendBias, ZoneClassification};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Long,
    Short,
    None,
}

impl Signal {
    pub fn is_entry(self) -> bool {
        self != Signal::None
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Long => "long",
            Signal::Short => "short",
            Signal::None => "none",
        };
        write!(f, "{}", s)
    }
}

pub fn classify(trend: TrendBias, zone: ZoneClassification, requires_trend: bool) -> Signal {
    match zone {
        ZoneClassification::Support if !requires_trend || trend == TrendBias::Long => Signal::Long,
        ZoneClassification::Resistance if !requires_trend || trend == TrendBias::Short => {
            Signal::Short
        }
        _ => Signal::None,
    }
}

/// Signal for the most recent bar of a snapshot.
pub fn classify_snapshot(snapshot: &IndicatorSnapshot) -> Signal {
    classify(
        snapshot.latest_trend(),
        snapshot.latest_zone(),
        snapshot.requires_trend_confirmation,
    )
}
