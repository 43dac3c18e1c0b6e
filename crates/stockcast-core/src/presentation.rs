//! Projection of pipeline tables into renderable views.
//!
//! Nothing here computes new numbers: every value in a [`DashboardView`] is
//! copied from a [`PriceSeries`] or a [`ForecastFrame`].

use serde::Serialize;
use time::Date;

use crate::domain::date::iso_date;
use crate::fetcher::FetchFailure;
use crate::forecast::ForecastError;
use crate::{ForecastFrame, ForecastRow, Horizon, PriceRecord, PriceSeries, Symbol};

pub const RAW_CHART_TITLE: &str = "Time Series Data";
pub const FORECAST_CHART_TITLE: &str = "Forecast vs Actual";
pub const COMPONENTS_CHART_TITLE: &str = "Forecast Components";
pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load data. Please check the API key or ticker symbol.";
pub const FORECAST_FAILED_MESSAGE: &str = "Failed to fit the forecast model for this ticker.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    fn named(name: &str, points: impl Iterator<Item = ChartPoint>) -> Self {
        Self {
            name: name.to_owned(),
            points: points.collect(),
        }
    }

    /// `(min, max)` of the values, or `None` for an empty series.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |bounds, point| match bounds {
            None => Some((point.value, point.value)),
            Some((lo, hi)) => Some((lo.min(point.value), hi.max(point.value))),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub title: String,
    pub series: Vec<ChartSeries>,
}

impl ChartPanel {
    pub fn date_bounds(&self) -> Option<(Date, Date)> {
        let mut dates = self
            .series
            .iter()
            .flat_map(|series| series.points.iter().map(|point| point.date));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), date| (lo.min(date), hi.max(date))))
    }

    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .filter_map(ChartSeries::value_bounds)
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }
}

/// Everything shown in the "data available" state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub symbol: Symbol,
    pub horizon_days: u32,
    pub raw_rows: usize,
    pub forecast_rows: usize,
    pub raw_tail: Vec<PriceRecord>,
    pub forecast_tail: Vec<ForecastRow>,
    pub components: Vec<String>,
    pub charts: Vec<ChartPanel>,
}

impl DashboardReport {
    pub fn project(
        series: &PriceSeries,
        forecast: &ForecastFrame,
        horizon: Horizon,
        tail_rows: usize,
    ) -> Self {
        Self {
            symbol: series.symbol().clone(),
            horizon_days: horizon.get(),
            raw_rows: series.len(),
            forecast_rows: forecast.len(),
            raw_tail: series.tail(tail_rows).to_vec(),
            forecast_tail: forecast.tail(tail_rows).to_vec(),
            components: forecast.components().to_vec(),
            charts: vec![
                raw_chart(series),
                forecast_chart(forecast),
                components_chart(forecast),
            ],
        }
    }

    pub fn raw_chart(&self) -> &ChartPanel {
        &self.charts[0]
    }

    pub fn forecast_chart(&self) -> &ChartPanel {
        &self.charts[1]
    }

    pub fn components_chart(&self) -> &ChartPanel {
        &self.charts[2]
    }
}

fn raw_chart(series: &PriceSeries) -> ChartPanel {
    let records = series.records();
    let point = |date: Date, value: f64| ChartPoint { date, value };
    ChartPanel {
        title: String::from(RAW_CHART_TITLE),
        series: vec![
            ChartSeries::named("Stock Open", records.iter().map(|r| point(r.date, r.open))),
            ChartSeries::named("Stock Close", records.iter().map(|r| point(r.date, r.close))),
        ],
    }
}

fn forecast_chart(forecast: &ForecastFrame) -> ChartPanel {
    let rows = forecast.rows();
    ChartPanel {
        title: String::from(FORECAST_CHART_TITLE),
        series: vec![
            ChartSeries::named(
                "Prediction",
                rows.iter().map(|row| ChartPoint {
                    date: row.timestamp,
                    value: row.predicted,
                }),
            ),
            ChartSeries::named(
                "Actual",
                rows.iter().filter_map(|row| {
                    row.actual.map(|value| ChartPoint {
                        date: row.timestamp,
                        value,
                    })
                }),
            ),
        ],
    }
}

fn components_chart(forecast: &ForecastFrame) -> ChartPanel {
    let series = forecast
        .components()
        .iter()
        .map(|name| {
            ChartSeries::named(
                name,
                forecast.rows().iter().filter_map(|row| {
                    row.component(name).map(|value| ChartPoint {
                        date: row.timestamp,
                        value,
                    })
                }),
            )
        })
        .collect();

    ChartPanel {
        title: String::from(COMPONENTS_CHART_TITLE),
        series,
    }
}

/// Why the dashboard is in the error state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unavailable {
    pub symbol: Symbol,
    pub message: String,
    pub code: String,
    pub detail: String,
}

impl Unavailable {
    pub fn from_fetch(symbol: Symbol, failure: &FetchFailure) -> Self {
        Self {
            symbol,
            message: String::from(LOAD_FAILED_MESSAGE),
            code: failure.code().to_owned(),
            detail: failure.to_string(),
        }
    }

    pub fn from_forecast(symbol: Symbol, error: &ForecastError) -> Self {
        Self {
            symbol,
            message: String::from(FORECAST_FAILED_MESSAGE),
            code: String::from("forecast"),
            detail: error.to_string(),
        }
    }
}

/// The two pipeline states.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    Available(Box<DashboardReport>),
    Unavailable(Unavailable),
}

impl DashboardView {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn report(&self) -> Option<&DashboardReport> {
        match self {
            Self::Available(report) => Some(report),
            Self::Unavailable(_) => None,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Available(report) => &report.symbol,
            Self::Unavailable(unavailable) => &unavailable.symbol,
        }
    }
}

/// Output surface for a [`DashboardView`].
pub trait Renderer {
    type Error;

    fn render(&mut self, view: &DashboardView) -> Result<(), Self::Error>;
}
