//! # Domain Models
//!
//! Canonical domain types flowing through the dashboard pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker symbol |
//! | [`PriceRecord`] | One day of OHLCV data |
//! | [`PriceSeries`] | Ordered, start-date filtered history for one ticker |
//! | [`TrainingFrame`] | `{timestamp, value}` input for the forecasting engine |
//! | [`ForecastFrame`] | Daily predictions plus decomposition components |
//! | [`Horizon`] | Number of future days to forecast |
//!
//! Constructors enforce the ordering invariants, so downstream stages never
//! re-check them.

pub mod date;
mod frames;
mod horizon;
mod price;
mod symbol;

pub use frames::{ForecastFrame, ForecastRow, TrainingFrame, TrainingPoint};
pub use horizon::{Horizon, DAYS_PER_YEAR};
pub use price::{PriceRecord, PriceSeries};
pub use symbol::Symbol;
