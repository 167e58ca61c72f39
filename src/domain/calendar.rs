//! Trading-day gate.
//!
//! Accepts a weekday range (`mon-fri`, wrapping ranges like `sun-thu` allowed)
//! or a comma-separated list (`mon,wed,fri`).

use chrono::{DateTime, Datelike, Utc, Weekday};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingCalendar {
    days: [bool; 7],
}

impl TradingCalendar {
    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = [false; 7];
        for d in days {
            set[d.num_days_from_monday() as usize] = true;
        }
        Self { days: set }
    }

    pub fn is_trading_day(&self, time: DateTime<Utc>) -> bool {
        self.allows(time.weekday())
    }

    pub fn allows(&self, day: Weekday) -> bool {
        self.days[day.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.days.iter().any(|d| *d)
    }
}

impl Default for TradingCalendar {
    /// Monday through Saturday.
    fn default() -> Self {
        Self::from_days(&[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ])
    }
}

fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday '{}'", s.trim()))
}

impl FromStr for TradingCalendar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("no trading days given".to_string());
        }

        if let Some((from, to)) = s.split_once('-') {
            let from = parse_weekday(from)?;
            let to = parse_weekday(to)?;
            let mut days = vec![from];
            let mut day = from;
            while day != to {
                day = day.succ();
                days.push(day);
            }
            return Ok(Self::from_days(&days));
        }

        let days = s
            .split(',')
            .map(parse_weekday)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_days(&days))
    }
}

impl fmt::Display for TradingCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = (0..7u8)
            .filter(|i| self.days[*i as usize])
            .filter_map(|i| Weekday::try_from(i).ok())
            .map(|d| d.to_string().to_lowercase())
            .collect();
        write!(f, "{}", names.join(","))
    }
}
