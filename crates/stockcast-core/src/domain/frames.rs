use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use super::date::iso_date;
use crate::{Horizon, PriceSeries};

/// One observation fed to the forecasting engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingPoint {
    #[serde(with = "iso_date")]
    pub timestamp: Date,
    pub value: f64,
}

/// Two-column `{timestamp, value}` projection of a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrainingFrame {
    points: Vec<TrainingPoint>,
}

impl TrainingFrame {
    /// Project `Date -> timestamp` and `Close -> value`, one point per record.
    pub fn from_series(series: &PriceSeries) -> Self {
        let points = series
            .records()
            .iter()
            .map(|record| TrainingPoint {
                timestamp: record.date,
                value: record.close,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[TrainingPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<Date> {
        self.points.first().map(|point| point.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<Date> {
        self.points.last().map(|point| point.timestamp)
    }
}

/// One forecast row: prediction, optional observed value and the additive
/// components that make up the prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    #[serde(with = "iso_date")]
    pub timestamp: Date,
    #[serde(rename = "predicted_value")]
    pub predicted: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    #[serde(flatten)]
    pub components: BTreeMap<String, f64>,
}

impl ForecastRow {
    pub fn new(timestamp: Date, predicted: f64) -> Self {
        Self {
            timestamp,
            predicted,
            actual: None,
            components: BTreeMap::new(),
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, value: f64) -> Self {
        self.components.insert(name.into(), value);
        self
    }

    pub fn component(&self, name: &str) -> Option<f64> {
        self.components.get(name).copied()
    }
}

/// Predictions over the historical span plus the horizon, one row per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastFrame {
    components: Vec<String>,
    rows: Vec<ForecastRow>,
}

impl ForecastFrame {
    pub fn new(components: Vec<String>, rows: Vec<ForecastRow>) -> Self {
        Self { components, rows }
    }

    /// Names of the decomposition fields, in display order.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<Date> {
        self.rows.first().map(|row| row.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<Date> {
        self.rows.last().map(|row| row.timestamp)
    }

    /// Last `n` rows, oldest first.
    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        let skip = self.rows.len().saturating_sub(n);
        &self.rows[skip..]
    }

    /// The trailing rows that lie strictly in the future horizon.
    pub fn future(&self, horizon: Horizon) -> &[ForecastRow] {
        self.tail(horizon.get() as usize)
    }

    /// Copy observed values onto the rows whose timestamp appears in `training`.
    pub fn attach_actuals(&mut self, training: &TrainingFrame) {
        let observed: BTreeMap<Date, f64> = training
            .points()
            .iter()
            .map(|point| (point.timestamp, point.value))
            .collect();
        for row in &mut self.rows {
            row.actual = observed.get(&row.timestamp).copied();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PriceRecord, Symbol};
    use time::macros::date;

    fn series() -> PriceSeries {
        let records = vec![
            PriceRecord::new(date!(2015 - 01 - 02), 1.0, 2.0, 0.5, 1.5, 10).expect("valid"),
            PriceRecord::new(date!(2015 - 01 - 05), 1.5, 2.5, 1.0, 2.0, 20).expect("valid"),
        ];
        PriceSeries::from_unordered(
            Symbol::parse("MSFT").expect("symbol"),
            date!(2015 - 01 - 01),
            records,
        )
    }

    #[test]
    fn training_frame_projects_close() {
        let frame = TrainingFrame::from_series(&series());
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.points()[0].value, 1.5);
        assert_eq!(frame.last_timestamp(), Some(date!(2015 - 01 - 05)));
    }

    #[test]
    fn attach_actuals_leaves_gaps_empty() {
        let training = TrainingFrame::from_series(&series());
        let rows = [
            date!(2015 - 01 - 02),
            date!(2015 - 01 - 03),
            date!(2015 - 01 - 04),
            date!(2015 - 01 - 05),
        ]
        .into_iter()
        .map(|day| ForecastRow::new(day, 1.0))
        .collect();
        let mut frame = ForecastFrame::new(Vec::new(), rows);
        frame.attach_actuals(&training);

        let actuals: Vec<Option<f64>> = frame.rows().iter().map(|row| row.actual).collect();
        assert_eq!(actuals, vec![Some(1.5), None, None, Some(2.0)]);
    }

    #[test]
    fn row_serializes_components_inline() {
        let row = ForecastRow::new(date!(2016 - 01 - 01), 3.0).with_component("trend", 2.5);
        let value = serde_json::to_value(&row).expect("json");
        assert_eq!(value["timestamp"], "2016-01-01");
        assert_eq!(value["predicted_value"], 3.0);
        assert_eq!(value["trend"], 2.5);
        assert!(value.get("actual").is_none());
    }
}
