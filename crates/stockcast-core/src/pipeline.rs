//! The fetch → forecast → project pipeline.
//!
//! One [`Dashboard::run`] call is one full re-execution for a selection. The
//! state is picked once, right after the fetch: an empty fetch short-circuits
//! to the error view and the forecast adapter is never called.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::cache::CacheMode;
use crate::fetcher::{FetchOutcome, PriceHistoryFetcher};
use crate::forecast::{ForecastAdapter, ForecastEngine};
use crate::http_client::HttpClient;
use crate::presentation::{DashboardReport, DashboardView, Unavailable};
use crate::{DashboardConfig, Horizon, Symbol, ValidationError};

/// Validated user input: an allow-listed ticker and a horizon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub symbol: Symbol,
    pub horizon: Horizon,
}

/// One pipeline execution and its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub view: DashboardView,
    pub cache_hit: bool,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
}

pub struct Dashboard<E> {
    config: DashboardConfig,
    fetcher: PriceHistoryFetcher,
    adapter: ForecastAdapter<E>,
}

impl<E: ForecastEngine> Dashboard<E> {
    pub fn new(
        config: DashboardConfig,
        http_client: Arc<dyn HttpClient>,
        engine: E,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let fetcher = PriceHistoryFetcher::new(http_client, config.clone());
        Ok(Self {
            config,
            fetcher,
            adapter: ForecastAdapter::new(engine),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &PriceHistoryFetcher {
        &self.fetcher
    }

    /// Validate raw user input against the allow-list and year bounds.
    pub fn select(&self, ticker: &str, years: u32) -> Result<Selection, ValidationError> {
        Ok(Selection {
            symbol: self.config.resolve_ticker(ticker)?,
            horizon: self.config.horizon(years)?,
        })
    }

    /// Drop the cached series for one ticker so the next run refetches it.
    pub async fn invalidate(&self, symbol: &Symbol) -> bool {
        self.fetcher.cache().invalidate(symbol).await
    }

    pub async fn run(
        &self,
        selection: &Selection,
        mode: CacheMode,
    ) -> Result<PipelineRun, ValidationError> {
        let started = Instant::now();
        let fetched = self.fetcher.fetch(&selection.symbol, mode).await?;

        let mut warnings = Vec::new();
        if fetched.skipped_records > 0 {
            warnings.push(format!(
                "skipped {} malformed price record(s) for {}",
                fetched.skipped_records, selection.symbol
            ));
        }

        let view = match &fetched.outcome {
            FetchOutcome::Empty(failure) => {
                warn!(symbol = %selection.symbol, reason = %failure, "data unavailable");
                DashboardView::Unavailable(Unavailable::from_fetch(
                    selection.symbol.clone(),
                    failure,
                ))
            }
            FetchOutcome::Loaded(series) => {
                match self.adapter.forecast(series, selection.horizon) {
                    Ok(frame) => {
                        info!(
                            symbol = %selection.symbol,
                            horizon = %selection.horizon,
                            rows = frame.len(),
                            "data available"
                        );
                        DashboardView::Available(Box::new(DashboardReport::project(
                            series,
                            &frame,
                            selection.horizon,
                            self.config.tail_rows,
                        )))
                    }
                    Err(error) => {
                        warn!(symbol = %selection.symbol, error = %error, "forecast failed");
                        DashboardView::Unavailable(Unavailable::from_forecast(
                            selection.symbol.clone(),
                            &error,
                        ))
                    }
                }
            }
        };

        Ok(PipelineRun {
            view,
            cache_hit: fetched.cache_hit,
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            warnings,
        })
    }
}
