//! CSV bar file reader.
//!
//! Columns: `time,open,high,low,close,volume`. `time` is either
//! `YYYY-MM-DD HH:MM:SS` (UTC) or unix seconds, as terminal exports write it.

use crate::domain::bar::Bar;
use crate::domain::error::BotError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every bar in the file, oldest first.
    pub fn load_bars(&self) -> Result<Vec<Bar>, BotError> {
        let content = fs::read_to_string(&self.path).map_err(|e| BotError::MarketData {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        parse_bars(&content)
    }
}

pub fn parse_bars(content: &str) -> Result<Vec<Bar>, BotError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| BotError::MarketData {
            reason: format!("CSV parse error: {}", e),
        })?;

        let time_str = field(&record, 0, "time", line)?;
        let time = parse_time(time_str).ok_or_else(|| BotError::MarketData {
            reason: format!("row {}: invalid time '{}'", line + 1, time_str),
        })?;

        bars.push(Bar {
            time,
            open: number(&record, 1, "open", line)?,
            high: number(&record, 2, "high", line)?,
            low: number(&record, 3, "low", line)?,
            close: number(&record, 4, "close", line)?,
            volume: match record.get(5) {
                Some(v) if !v.is_empty() => v.parse::<f64>().map_err(|e| BotError::MarketData {
                    reason: format!("row {}: invalid volume value: {}", line + 1, e),
                })? as i64,
                _ => 0,
            },
        });
    }

    bars.sort_by_key(|b| b.time);
    Ok(bars)
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str, line: usize) -> Result<&'r str, BotError> {
    record.get(idx).ok_or_else(|| BotError::MarketData {
        reason: format!("row {}: missing {} column", line + 1, name),
    })
}

fn number(record: &csv::StringRecord, idx: usize, name: &str, line: usize) -> Result<f64, BotError> {
    field(record, idx, name, line)?
        .parse()
        .map_err(|e| BotError::MarketData {
            reason: format!("row {}: invalid {} value: {}", line + 1, name, e),
        })
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y.%m.%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
