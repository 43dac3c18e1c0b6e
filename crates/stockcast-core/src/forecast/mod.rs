//! Forecasting seam: the engine trait, its errors and the adapter that drives it.
//!
//! The pipeline only depends on [`ForecastEngine`]; [`AdditiveEngine`] is the
//! bundled implementation and tests substitute their own.

mod adapter;
mod additive;

use thiserror::Error;

use crate::{ForecastFrame, Horizon, TrainingFrame};

pub use adapter::ForecastAdapter;
pub use additive::{AdditiveConfig, AdditiveEngine, AdditiveModel};

/// Failure to fit or predict.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("cannot forecast an empty price series")]
    EmptyInput,
    #[error("need at least {min} data points to fit, got {points}")]
    InsufficientData { points: usize, min: usize },
    #[error("model fit failed: {0}")]
    Numerical(String),
    #[error("forecast output is inconsistent: {0}")]
    InvalidOutput(String),
}

/// Opaque forecasting capability: `fit(TrainingFrame) -> Model`,
/// `predict(Model, horizon) -> ForecastFrame`.
///
/// `predict` must return one row per calendar day from the first training
/// timestamp through `horizon` days past the last one.
pub trait ForecastEngine: Send + Sync {
    type Model: Send + Sync;

    fn name(&self) -> &str;

    fn fit(&self, training: &TrainingFrame) -> Result<Self::Model, ForecastError>;

    fn predict(&self, model: &Self::Model, horizon: Horizon)
        -> Result<ForecastFrame, ForecastError>;
}
