//! Decomposable trend + seasonality regression.
//!
//! `value(t) = trend(t) + yearly(t) + weekly(t)` where the trend is piecewise
//! linear with hinge changepoints and each seasonality is a Fourier series.
//! All coefficients come from one ridge-regularised least-squares solve.

use std::f64::consts::PI;

use ndarray::{Array1, Array2};
use time::{Date, Duration};
use tracing::debug;

use super::{ForecastEngine, ForecastError};
use crate::{ForecastFrame, ForecastRow, Horizon, TrainingFrame};

pub const TREND: &str = "trend";
pub const SEASON_YEARLY: &str = "season_yearly";
pub const SEASON_WEEKLY: &str = "season_weekly";

const YEAR_DAYS: f64 = 365.25;
const WEEK_DAYS: f64 = 7.0;

/// Tunables for [`AdditiveEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveConfig {
    pub changepoints: usize,
    /// Fraction of the history, from the start, in which changepoints are placed.
    pub changepoint_range: f64,
    pub yearly_order: usize,
    pub weekly_order: usize,
    /// Ridge penalty per training point, on scaled data. Intercept is unpenalised.
    pub regularization: f64,
    pub min_points: usize,
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        Self {
            changepoints: 10,
            changepoint_range: 0.8,
            yearly_order: 6,
            weekly_order: 3,
            regularization: 1e-4,
            min_points: 2,
        }
    }
}

/// Coefficients and the normalisation needed to rebuild the design matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveModel {
    first: Date,
    last: Date,
    span_days: f64,
    scale: f64,
    changepoints: Vec<f64>,
    coefficients: Array1<f64>,
}

impl AdditiveModel {
    pub fn first(&self) -> Date {
        self.first
    }

    pub fn last(&self) -> Date {
        self.last
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdditiveEngine {
    config: AdditiveConfig,
}

impl AdditiveEngine {
    pub fn new(config: AdditiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdditiveConfig {
        &self.config
    }

    fn trend_width(&self, changepoints: usize) -> usize {
        2 + changepoints
    }

    fn width(&self, changepoints: usize) -> usize {
        self.trend_width(changepoints) + 2 * self.config.yearly_order + 2 * self.config.weekly_order
    }

    /// Design row for `day`: `[1, s, hinges.., yearly sin/cos.., weekly sin/cos..]`.
    fn features(&self, day: Date, first: Date, span_days: f64, changepoints: &[f64]) -> Vec<f64> {
        let offset = (day - first).whole_days() as f64;
        let s = offset / span_days;
        let absolute = f64::from(day.to_julian_day());

        let mut row = Vec::with_capacity(self.width(changepoints.len()));
        row.push(1.0);
        row.push(s);
        row.extend(changepoints.iter().map(|c| (s - c).max(0.0)));
        push_fourier(&mut row, absolute, YEAR_DAYS, self.config.yearly_order);
        push_fourier(&mut row, absolute, WEEK_DAYS, self.config.weekly_order);
        row
    }

    fn component_names(&self) -> Vec<String> {
        let mut names = vec![String::from(TREND)];
        if self.config.yearly_order > 0 {
            names.push(String::from(SEASON_YEARLY));
        }
        if self.config.weekly_order > 0 {
            names.push(String::from(SEASON_WEEKLY));
        }
        names
    }
}

impl ForecastEngine for AdditiveEngine {
    type Model = AdditiveModel;

    fn name(&self) -> &str {
        "additive"
    }

    fn fit(&self, training: &TrainingFrame) -> Result<AdditiveModel, ForecastError> {
        let points = training.points();
        let min = self.config.min_points.max(1);
        if points.len() < min {
            return Err(ForecastError::InsufficientData {
                points: points.len(),
                min,
            });
        }

        let (Some(first), Some(last)) = (training.first_timestamp(), training.last_timestamp())
        else {
            return Err(ForecastError::EmptyInput);
        };

        if points.iter().any(|point| !point.value.is_finite()) {
            return Err(ForecastError::Numerical(String::from(
                "training values must be finite",
            )));
        }

        let span_days = ((last - first).whole_days() as f64).max(1.0);
        let max_abs = points
            .iter()
            .map(|point| point.value.abs())
            .fold(0.0_f64, f64::max);
        let scale = if max_abs > 0.0 { max_abs } else { 1.0 };

        let count = self.config.changepoints;
        let range = self.config.changepoint_range.clamp(0.0, 1.0);
        let changepoints: Vec<f64> = (1..=count)
            .map(|k| range * k as f64 / (count + 1) as f64)
            .collect();

        let width = self.width(changepoints.len());
        let mut design = Array2::<f64>::zeros((points.len(), width));
        let mut target = Array1::<f64>::zeros(points.len());
        for (i, point) in points.iter().enumerate() {
            let row = self.features(point.timestamp, first, span_days, &changepoints);
            for (j, value) in row.into_iter().enumerate() {
                design[[i, j]] = value;
            }
            target[i] = point.value / scale;
        }

        let mut gram = design.t().dot(&design);
        let rhs = design.t().dot(&target);
        let penalty = self.config.regularization.max(0.0) * points.len() as f64;
        for j in 1..width {
            gram[[j, j]] += penalty;
        }

        let coefficients = solve_spd(gram, rhs)?;
        debug!(
            engine = self.name(),
            points = points.len(),
            features = width,
            scale,
            "additive model fitted"
        );

        Ok(AdditiveModel {
            first,
            last,
            span_days,
            scale,
            changepoints,
            coefficients,
        })
    }

    fn predict(
        &self,
        model: &AdditiveModel,
        horizon: Horizon,
    ) -> Result<ForecastFrame, ForecastError> {
        let end = model
            .last
            .checked_add(Duration::days(i64::from(horizon.get())))
            .ok_or_else(|| ForecastError::InvalidOutput(String::from("horizon overflows the calendar")))?;

        let trend_end = self.trend_width(model.changepoints.len());
        let yearly_end = trend_end + 2 * self.config.yearly_order;
        let beta = &model.coefficients;
        if beta.len() != self.width(model.changepoints.len()) {
            return Err(ForecastError::InvalidOutput(String::from(
                "model was fitted with a different configuration",
            )));
        }

        let dot = |row: &[f64], from: usize, to: usize| -> f64 {
            (from..to).map(|j| row[j] * beta[j]).sum::<f64>() * model.scale
        };

        let mut rows = Vec::new();
        let mut day = model.first;
        loop {
            let features = self.features(day, model.first, model.span_days, &model.changepoints);
            let trend = dot(&features, 0, trend_end);
            let yearly = dot(&features, trend_end, yearly_end);
            let weekly = dot(&features, yearly_end, features.len());

            let mut row = ForecastRow::new(day, trend + yearly + weekly).with_component(TREND, trend);
            if self.config.yearly_order > 0 {
                row = row.with_component(SEASON_YEARLY, yearly);
            }
            if self.config.weekly_order > 0 {
                row = row.with_component(SEASON_WEEKLY, weekly);
            }
            rows.push(row);

            if day >= end {
                break;
            }
            day = day
                .next_day()
                .ok_or_else(|| ForecastError::InvalidOutput(String::from("date overflow")))?;
        }

        Ok(ForecastFrame::new(self.component_names(), rows))
    }
}

fn push_fourier(row: &mut Vec<f64>, day: f64, period: f64, order: usize) {
    for n in 1..=order {
        let angle = 2.0 * PI * n as f64 * day / period;
        row.push(angle.sin());
        row.push(angle.cos());
    }
}

/// Solve `a x = b` for symmetric positive-definite `a` via Cholesky.
fn solve_spd(a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>, ForecastError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !sum.is_finite() || sum <= 0.0 {
                    return Err(ForecastError::Numerical(format!(
                        "normal equations are not positive definite at column {i}"
                    )));
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // Forward: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }

    // Backward: L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    if x.iter().any(|value| !value.is_finite()) {
        return Err(ForecastError::Numerical(String::from(
            "solution contains non-finite coefficients",
        )));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PriceRecord, PriceSeries, Symbol};
    use time::macros::date;

    fn training(values: &[f64]) -> TrainingFrame {
        let start = date!(2015 - 01 - 01);
        let records = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                PriceRecord::new(start + Duration::days(i as i64), *value, *value, *value, *value, 1)
                    .expect("valid record")
            })
            .collect();
        let series = PriceSeries::from_unordered(Symbol::parse("AAPL").expect("symbol"), start, records);
        TrainingFrame::from_series(&series)
    }

    #[test]
    fn solves_small_spd_system() {
        let a = Array2::from_shape_vec((2, 2), vec![4.0, 2.0, 2.0, 3.0]).expect("shape");
        let b = Array1::from(vec![2.0, 1.0]);
        let x = solve_spd(a, b).expect("spd");
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn rejects_singular_system() {
        let a = Array2::<f64>::zeros((2, 2));
        let err = solve_spd(a, Array1::zeros(2)).expect_err("singular");
        assert!(matches!(err, ForecastError::Numerical(_)));
    }

    #[test]
    fn recovers_linear_trend() {
        let values: Vec<f64> = (0..400).map(|i| 100.0 + 0.5 * i as f64).collect();
        let engine = AdditiveEngine::default();
        let model = engine.fit(&training(&values)).expect("fit");
        let frame = engine.predict(&model, Horizon::days(30).expect("horizon")).expect("predict");

        assert_eq!(frame.len(), 430);
        let in_sample = &frame.rows()[200];
        assert!((in_sample.predicted - 200.0).abs() < 2.0, "got {}", in_sample.predicted);
        let last = frame.rows().last().expect("rows");
        assert!(last.predicted > in_sample.predicted);
    }

    #[test]
    fn constant_series_gives_flat_forecast() {
        let engine = AdditiveEngine::default();
        let model = engine.fit(&training(&[42.0; 60])).expect("fit");
        let frame = engine.predict(&model, Horizon::days(10).expect("horizon")).expect("predict");

        for row in frame.rows() {
            assert!((row.predicted - 42.0).abs() < 0.5, "got {}", row.predicted);
        }
    }

    #[test]
    fn too_few_points_is_an_error() {
        let engine = AdditiveEngine::default();
        let err = engine.fit(&training(&[1.0])).expect_err("one point");
        assert_eq!(err, ForecastError::InsufficientData { points: 1, min: 2 });
    }

    #[test]
    fn components_sum_to_prediction() {
        let values: Vec<f64> = (0..120)
            .map(|i| 50.0 + (i as f64 * 2.0 * PI / 7.0).sin())
            .collect();
        let engine = AdditiveEngine::default();
        let model = engine.fit(&training(&values)).expect("fit");
        let frame = engine.predict(&model, Horizon::days(7).expect("horizon")).expect("predict");

        assert_eq!(frame.components(), [TREND, SEASON_YEARLY, SEASON_WEEKLY]);
        for row in frame.rows() {
            let sum: f64 = row.components.values().sum();
            assert!((sum - row.predicted).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_orders_drop_seasonal_components() {
        let engine = AdditiveEngine::new(AdditiveConfig {
            yearly_order: 0,
            weekly_order: 0,
            ..AdditiveConfig::default()
        });
        let model = engine.fit(&training(&[1.0, 2.0, 3.0])).expect("fit");
        let frame = engine.predict(&model, Horizon::days(1).expect("horizon")).expect("predict");
        assert_eq!(frame.components(), [TREND]);
        assert_eq!(frame.rows()[0].components.len(), 1);
    }
}
