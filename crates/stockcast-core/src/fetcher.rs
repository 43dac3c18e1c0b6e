//! Price history fetcher for the `historical-price-full` REST endpoint.
//!
//! Every upstream problem (transport error, non-2xx status, undecodable body,
//! missing `historical` key, nothing left after filtering) is folded into
//! [`FetchOutcome::Empty`]. Callers branch on the outcome; they never see an
//! error for a bad upstream.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheMode, CacheStore};
use crate::domain::date::parse_date;
use crate::http_client::{HttpClient, HttpRequest};
use crate::{DashboardConfig, PriceRecord, PriceSeries, Symbol, ValidationError};

const HISTORICAL_KEY: &str = "historical";

/// Why a fetch produced no data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("upstream returned status {status}")]
    Status { status: u16 },
    #[error("failed to decode payload: {message}")]
    Decode { message: String },
    #[error("payload has no 'historical' data")]
    MissingHistorical,
    #[error("no price records on or after the start date")]
    NoRecords,
}

impl FetchFailure {
    /// Stable machine-readable code used in CLI envelopes.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "upstream_status",
            Self::Decode { .. } => "decode",
            Self::MissingHistorical => "missing_historical",
            Self::NoRecords => "no_records",
        }
    }
}

/// A price series, or the explicit empty-result marker with its reason.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(Arc<PriceSeries>),
    Empty(FetchFailure),
}

impl FetchOutcome {
    pub fn series(&self) -> Option<&Arc<PriceSeries>> {
        match self {
            Self::Loaded(series) => Some(series),
            Self::Empty(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

/// Outcome plus bookkeeping for one fetch call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub outcome: FetchOutcome,
    pub cache_hit: bool,
    /// Records dropped because they could not be parsed.
    pub skipped_records: usize,
    pub latency_ms: u64,
}

/// Upstream record shape; extra fields (`adjClose`, `vwap`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Fetches and memoizes daily price history per ticker.
#[derive(Clone)]
pub struct PriceHistoryFetcher {
    http_client: Arc<dyn HttpClient>,
    config: DashboardConfig,
    cache: CacheStore,
}

impl PriceHistoryFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>, config: DashboardConfig) -> Self {
        let cache = CacheStore::new(config.cache_ttl);
        Self {
            http_client,
            config,
            cache,
        }
    }

    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Endpoint URL for `symbol`. Contains the API key; never log it.
    fn endpoint(&self, symbol: &Symbol) -> String {
        format!(
            "{}/api/v3/historical-price-full/{}?apikey={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(self.config.api_key.expose()),
        )
    }

    /// Fetch the history for an allow-listed ticker.
    ///
    /// Only the allow-list check can fail; upstream problems are reported
    /// through [`FetchOutcome::Empty`]. Only loaded series are cached, so a
    /// failed ticker is retried on the next call.
    pub async fn fetch(
        &self,
        symbol: &Symbol,
        mode: CacheMode,
    ) -> Result<FetchResult, ValidationError> {
        if !self.config.tickers.contains(symbol) {
            return Err(ValidationError::TickerNotAllowed {
                symbol: symbol.to_string(),
                allowed: self.config.allow_list_display(),
            });
        }

        let started = Instant::now();
        if mode == CacheMode::Use {
            if let Some(series) = self.cache.get(symbol).await {
                debug!(symbol = %symbol, rows = series.len(), "price history cache hit");
                return Ok(FetchResult {
                    outcome: FetchOutcome::Loaded(series),
                    cache_hit: true,
                    skipped_records: 0,
                    latency_ms: elapsed_ms(started),
                });
            }
            debug!(symbol = %symbol, "price history cache miss");
        }

        let (outcome, skipped_records) = self.fetch_remote(symbol).await;

        if let FetchOutcome::Loaded(series) = &outcome {
            if mode != CacheMode::Bypass {
                self.cache.put(symbol.clone(), Arc::clone(series)).await;
            }
        }

        Ok(FetchResult {
            outcome,
            cache_hit: false,
            skipped_records,
            latency_ms: elapsed_ms(started),
        })
    }

    async fn fetch_remote(&self, symbol: &Symbol) -> (FetchOutcome, usize) {
        info!(symbol = %symbol, "fetching price history");
        let request = HttpRequest::get(self.endpoint(symbol))
            .with_header("accept", "application/json")
            .with_timeout(self.config.request_timeout);

        let response = match self.http_client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "price history transport failure");
                return (
                    FetchOutcome::Empty(FetchFailure::Transport {
                        message: error.message().to_owned(),
                    }),
                    0,
                );
            }
        };

        if !response.is_ok() {
            warn!(symbol = %symbol, status = response.status, "price history request rejected");
            return (
                FetchOutcome::Empty(FetchFailure::Status {
                    status: response.status,
                }),
                0,
            );
        }

        match self.parse_payload(symbol, &response.body) {
            Ok((series, skipped)) => {
                info!(
                    symbol = %symbol,
                    rows = series.len(),
                    skipped,
                    "price history loaded"
                );
                (FetchOutcome::Loaded(Arc::new(series)), skipped)
            }
            Err((failure, skipped)) => {
                warn!(symbol = %symbol, reason = %failure, "price history unavailable");
                (FetchOutcome::Empty(failure), skipped)
            }
        }
    }

    fn parse_payload(
        &self,
        symbol: &Symbol,
        body: &str,
    ) -> Result<(PriceSeries, usize), (FetchFailure, usize)> {
        let payload: Value = serde_json::from_str(body).map_err(|error| {
            (
                FetchFailure::Decode {
                    message: error.to_string(),
                },
                0,
            )
        })?;

        let historical = payload
            .get(HISTORICAL_KEY)
            .ok_or((FetchFailure::MissingHistorical, 0))?;
        let entries = historical.as_array().ok_or_else(|| {
            (
                FetchFailure::Decode {
                    message: format!("'{HISTORICAL_KEY}' is not an array"),
                },
                0,
            )
        })?;

        let mut skipped = 0;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match normalize_record(entry) {
                Ok(record) => {
                    if record.date <= self.config.end_date {
                        records.push(record);
                    }
                }
                Err(reason) => {
                    skipped += 1;
                    warn!(symbol = %symbol, reason = %reason, "skipping malformed price record");
                }
            }
        }

        let series = PriceSeries::from_unordered(symbol.clone(), self.config.start_date, records);
        if series.is_empty() {
            return Err((FetchFailure::NoRecords, skipped));
        }

        Ok((series, skipped))
    }
}

fn normalize_record(entry: &Value) -> Result<PriceRecord, String> {
    let raw = RawRecord::deserialize(entry).map_err(|error| error.to_string())?;
    let date = parse_date(&raw.date).map_err(|error| error.to_string())?;
    let volume = match raw.volume {
        Some(volume) if volume.is_finite() && volume >= 0.0 => volume.round() as u64,
        Some(volume) => return Err(format!("invalid volume {volume}")),
        None => 0,
    };

    PriceRecord::new(date, raw.open, raw.high, raw.low, raw.close, volume)
        .map_err(|error| error.to_string())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
