use thiserror::Error;

/// Validation and contract errors exposed by `stockcast-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("ticker '{symbol}' is not available, expected one of {allowed}")]
    TickerNotAllowed { symbol: String, allowed: String },

    #[error("horizon must be between {min} and {max} years, got {value}")]
    HorizonOutOfRange { value: u32, min: u32, max: u32 },
    #[error("horizon must be at least one day")]
    EmptyHorizon,

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },

    #[error("ticker allow-list cannot be empty")]
    EmptyAllowList,
    #[error("year bounds must satisfy 1 <= min <= max, got [{min}, {max}]")]
    InvalidYearBounds { min: u32, max: u32 },
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: String, end: String },
    #[error("base url must start with http:// or https://: '{value}'")]
    InvalidBaseUrl { value: String },
}

/// Failure to read runtime configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}': {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
