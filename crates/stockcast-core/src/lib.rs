//! # Stockcast Core
//!
//! Price history fetching, time-series forecasting and dashboard projection.
//!
//! ## Overview
//!
//! A dashboard run takes a ticker from a fixed allow-list and a horizon of
//! 1 to 4 years, then:
//!
//! - **fetches** daily OHLCV history from a `historical-price-full` REST endpoint,
//!   memoized per ticker
//! - **forecasts** the closing price with an additive trend + seasonality model
//! - **projects** the result into tables and three charts, or into an error view
//!   when no data could be loaded
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Per-ticker memoization of fetched series |
//! | [`config`] | Runtime configuration and the API key |
//! | [`domain`] | Symbols, price records, training and forecast frames |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Validation and configuration errors |
//! | [`fetcher`] | Price history fetcher |
//! | [`forecast`] | Forecast engine trait, additive engine, adapter |
//! | [`http_client`] | HTTP client abstraction |
//! | [`pipeline`] | Fetch → forecast → project orchestration |
//! | [`presentation`] | Dashboard views and the renderer trait |
//! | [`synthetic`] | Deterministic offline transport |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / TUI      │
//! └────────┬────────┘
//!          │ Selection
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Dashboard       │────▶│ CacheStore       │
//! │ (pipeline)      │     └──────────────────┘
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PriceHistory    │────▶│ HTTP Client      │
//! │ Fetcher         │     │ (reqwest/synth)  │
//! └────────┬────────┘     └──────────────────┘
//!          │ PriceSeries
//!          ▼
//! ┌─────────────────┐
//! │ ForecastAdapter │──── ForecastEngine
//! └────────┬────────┘
//!          │ ForecastFrame
//!          ▼
//! ┌─────────────────┐
//! │ DashboardView   │
//! └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockcast_core::{AdditiveEngine, CacheMode, Dashboard, DashboardConfig, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::from_env()?;
//!     let dashboard = Dashboard::new(config, Arc::new(ReqwestHttpClient::new()), AdditiveEngine::default())?;
//!
//!     let selection = dashboard.select("AAPL", 1)?;
//!     let run = dashboard.run(&selection, CacheMode::Use).await?;
//!     println!("available: {}", run.view.is_available());
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! The API key is held in a [`secrecy::SecretString`] and is redacted from
//! `Debug` output, logs and transport errors.

pub mod cache;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod http_client;
pub mod pipeline;
pub mod presentation;
pub mod synthetic;

pub use cache::{CacheMode, CacheStore};

pub use config::{ApiKey, DashboardConfig};

pub use domain::{
    ForecastFrame, ForecastRow, Horizon, PriceRecord, PriceSeries, Symbol, TrainingFrame,
    TrainingPoint, DAYS_PER_YEAR,
};

pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};

pub use error::{ConfigError, ValidationError};

pub use fetcher::{FetchFailure, FetchOutcome, FetchResult, PriceHistoryFetcher};

pub use forecast::{
    AdditiveConfig, AdditiveEngine, AdditiveModel, ForecastAdapter, ForecastEngine, ForecastError,
};

pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

pub use pipeline::{Dashboard, PipelineRun, Selection};

pub use presentation::{
    ChartPanel, ChartPoint, ChartSeries, DashboardReport, DashboardView, Renderer, Unavailable,
};

pub use synthetic::SyntheticHttpClient;
