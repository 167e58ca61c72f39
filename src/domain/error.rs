//! Domain error types.

/// Top-level error type for zonetrader.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("session error: {reason}")]
    Session { reason: String },

    #[error("market data error: {reason}")]
    MarketData { reason: String },

    #[error("execution error: {reason}")]
    Execution { reason: String },

    #[error("insufficient data on {timeframe}: have {bars} bars, need {minimum}")]
    InsufficientData {
        timeframe: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid bracket: {reason}")]
    InvalidBracket { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BotError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BotError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        BotError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&BotError> for std::process::ExitCode {
    fn from(err: &BotError) -> Self {
        let code: u8 = match err {
            BotError::Io(_) => 1,
            BotError::ConfigParse { .. }
            | BotError::ConfigMissing { .. }
            | BotError::ConfigInvalid { .. } => 2,
            BotError::Session { .. } => 3,
            BotError::MarketData { .. }
            | BotError::Execution { .. }
            | BotError::InsufficientData { .. }
            | BotError::InvalidBracket { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = BotError::InsufficientData {
            timeframe: "H4".into(),
            bars: 12,
            minimum: 20,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data on H4: have 12 bars, need 20"
        );
    }

    #[test]
    fn config_helpers_build_variants() {
        let err = BotError::invalid("risk", "lot", "lot must be positive");
        assert_eq!(
            err.to_string(),
            "invalid config value [risk] lot: lot must be positive"
        );
        let err = BotError::missing("instrument", "symbol");
        assert_eq!(err.to_string(), "missing config key [instrument] symbol");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BotError = io.into();
        assert!(matches!(err, BotError::Io(_)));
    }
}
