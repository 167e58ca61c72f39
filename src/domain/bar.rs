//! Price bar representation and timeframes.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Whether the bar's range touched `price`.
    pub fn touches(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn minutes(self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    pub fn duration(self) -> TimeDelta {
        TimeDelta::minutes(self.minutes())
    }

    /// Open time of the bar of this timeframe that contains `time`.
    pub fn bucket_start(self, time: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.minutes() * 60;
        let ts = time.timestamp();
        let start = ts - ts.rem_euclid(secs);
        DateTime::from_timestamp(start, 0).unwrap_or(time)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            other => Err(format!("unknown timeframe '{}'", other)),
        }
    }
}

/// Roll bars of a finer timeframe up into `target` buckets.
///
/// Input must be ordered oldest-first. Buckets keep the first open, the last
/// close, the extreme high/low and the summed volume.
pub fn aggregate(bars: &[Bar], target: Timeframe) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    for bar in bars {
        let start = target.bucket_start(bar.time);
        match out.last_mut() {
            Some(current) if current.time == start => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => out.push(Bar {
                time: start,
                ..bar.clone()
            }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar_at(hour: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time: Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 100,
        }
    }

    #[test]
    fn typical_price() {
        let bar = bar_at(0, 1.1000, 1.1100, 1.0900, 1.1050);
        let expected = (1.1100 + 1.0900 + 1.1050) / 3.0;
        assert!((bar.typical_price() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn touches_inclusive_range() {
        let bar = bar_at(0, 1.10, 1.12, 1.08, 1.11);
        assert!(bar.touches(1.08));
        assert!(bar.touches(1.12));
        assert!(!bar.touches(1.13));
    }

    #[test]
    fn timeframe_parse_and_display() {
        assert_eq!("h4".parse::<Timeframe>().unwrap(), Timeframe::H4);
        assert_eq!(" M15 ".parse::<Timeframe>().unwrap(), Timeframe::M15);
        assert!("W1".parse::<Timeframe>().is_err());
        assert_eq!(Timeframe::D1.to_string(), "D1");
    }

    #[test]
    fn bucket_start_floors_to_timeframe() {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 7, 42, 10).unwrap();
        assert_eq!(
            Timeframe::H4.bucket_start(t),
            Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap()
        );
        assert_eq!(
            Timeframe::H1.bucket_start(t),
            Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn aggregate_hourly_into_h4() {
        let bars = vec![
            bar_at(0, 1.0, 1.5, 0.9, 1.2),
            bar_at(1, 1.2, 1.3, 0.8, 1.1),
            bar_at(2, 1.1, 1.6, 1.0, 1.4),
            bar_at(3, 1.4, 1.4, 1.3, 1.35),
            bar_at(4, 1.35, 1.7, 1.3, 1.6),
        ];
        let h4 = aggregate(&bars, Timeframe::H4);
        assert_eq!(h4.len(), 2);
        assert_eq!(h4[0].open, 1.0);
        assert_eq!(h4[0].high, 1.6);
        assert_eq!(h4[0].low, 0.8);
        assert_eq!(h4[0].close, 1.35);
        assert_eq!(h4[0].volume, 400);
        assert_eq!(h4[1].close, 1.6);
        assert_eq!(h4[1].time, Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap());
    }

    #[test]
    fn aggregate_same_timeframe_is_identity() {
        let bars = vec![bar_at(0, 1.0, 1.5, 0.9, 1.2), bar_at(1, 1.2, 1.3, 0.8, 1.1)];
        assert_eq!(aggregate(&bars, Timeframe::H1), bars);
    }
}
