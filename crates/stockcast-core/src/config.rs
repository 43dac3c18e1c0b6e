//! Runtime configuration passed into the dashboard at construction time.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use time::macros::date;
use time::Date;

use crate::domain::date::{format_date, parse_date, today_utc};
use crate::{ConfigError, Horizon, Symbol, ValidationError};

pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com";
pub const DEFAULT_START_DATE: Date = date!(2015 - 01 - 01);
pub const DEFAULT_TICKERS: [&str; 4] = ["AAPL", "GOOG", "MSFT", "GME"];
pub const DEFAULT_MIN_YEARS: u32 = 1;
pub const DEFAULT_MAX_YEARS: u32 = 4;
pub const DEFAULT_TAIL_ROWS: usize = 5;

pub const ENV_BASE_URL: &str = "STOCKCAST_BASE_URL";
pub const ENV_API_KEY: &str = "STOCKCAST_API_KEY";
pub const ENV_START_DATE: &str = "STOCKCAST_START_DATE";
pub const ENV_TICKERS: &str = "STOCKCAST_TICKERS";
pub const ENV_CACHE_TTL_SECS: &str = "STOCKCAST_CACHE_TTL_SECS";
pub const ENV_TIMEOUT_MS: &str = "STOCKCAST_TIMEOUT_MS";

/// API key for the price-history endpoint. Never printed.
#[derive(Clone)]
pub struct ApiKey(Arc<SecretString>);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        let value: String = value.into();
        Self(Arc::new(SecretString::new(value.into_boxed_str())))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Everything the pipeline needs that used to be module-level state.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub base_url: String,
    pub api_key: ApiKey,
    pub start_date: Date,
    pub end_date: Date,
    pub tickers: Vec<Symbol>,
    pub min_years: u32,
    pub max_years: u32,
    /// `None` keeps fetched series for the lifetime of the process.
    pub cache_ttl: Option<Duration>,
    /// `None` waits on the upstream indefinitely.
    pub request_timeout: Option<Duration>,
    pub tail_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_key: ApiKey::new(""),
            start_date: DEFAULT_START_DATE,
            end_date: today_utc(),
            tickers: default_tickers(),
            min_years: DEFAULT_MIN_YEARS,
            max_years: DEFAULT_MAX_YEARS,
            cache_ttl: None,
            request_timeout: None,
            tail_rows: DEFAULT_TAIL_ROWS,
        }
    }
}

impl DashboardConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = read(ENV_BASE_URL) {
            config.base_url = base_url.trim().trim_end_matches('/').to_owned();
        }

        if let Some(api_key) = lookup(ENV_API_KEY) {
            config.api_key = ApiKey::new(api_key.trim());
        }

        if let Some(raw) = read(ENV_START_DATE) {
            config.start_date = parse_date(&raw).map_err(|error| ConfigError::InvalidVar {
                name: ENV_START_DATE,
                value: raw.clone(),
                reason: error.to_string(),
            })?;
        }

        if let Some(raw) = read(ENV_TICKERS) {
            config.tickers = raw
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(Symbol::parse)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| ConfigError::InvalidVar {
                    name: ENV_TICKERS,
                    value: raw.clone(),
                    reason: error.to_string(),
                })?;
        }

        if let Some(raw) = read(ENV_CACHE_TTL_SECS) {
            let secs = parse_u64(ENV_CACHE_TTL_SECS, &raw)?;
            config.cache_ttl = Some(Duration::from_secs(secs));
        }

        if let Some(raw) = read(ENV_TIMEOUT_MS) {
            let millis = parse_u64(ENV_TIMEOUT_MS, &raw)?;
            config.request_timeout = Some(Duration::from_millis(millis));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_tickers(mut self, tickers: Vec<Symbol>) -> Self {
        self.tickers = tickers;
        self
    }

    pub fn with_start_date(mut self, start_date: Date) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn with_end_date(mut self, end_date: Date) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = ApiKey::new(api_key);
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Option<Duration>) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_tail_rows(mut self, tail_rows: usize) -> Self {
        self.tail_rows = tail_rows;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl {
                value: self.base_url.clone(),
            });
        }

        if self.tickers.is_empty() {
            return Err(ValidationError::EmptyAllowList);
        }

        if self.min_years == 0 || self.min_years > self.max_years {
            return Err(ValidationError::InvalidYearBounds {
                min: self.min_years,
                max: self.max_years,
            });
        }

        if self.start_date > self.end_date {
            return Err(ValidationError::StartAfterEnd {
                start: format_date(self.start_date),
                end: format_date(self.end_date),
            });
        }

        Ok(())
    }

    /// Resolve user input to a ticker from the allow-list.
    pub fn resolve_ticker(&self, input: &str) -> Result<Symbol, ValidationError> {
        let symbol = Symbol::parse(input)?;
        if self.tickers.contains(&symbol) {
            Ok(symbol)
        } else {
            Err(ValidationError::TickerNotAllowed {
                symbol: symbol.to_string(),
                allowed: self.allow_list_display(),
            })
        }
    }

    pub fn horizon(&self, years: u32) -> Result<Horizon, ValidationError> {
        Horizon::from_years(years, self.min_years, self.max_years)
    }

    pub fn allow_list_display(&self) -> String {
        self.tickers
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn default_tickers() -> Vec<Symbol> {
    DEFAULT_TICKERS
        .iter()
        .filter_map(|raw| Symbol::parse(raw).ok())
        .collect()
}

fn parse_u64(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| ConfigError::InvalidVar {
            name,
            value: raw.to_owned(),
            reason: error.to_string(),
        })
}
