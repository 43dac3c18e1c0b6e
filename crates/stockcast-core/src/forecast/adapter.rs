use time::Duration;
use tracing::debug;

use super::{ForecastEngine, ForecastError};
use crate::{ForecastFrame, Horizon, PriceSeries, TrainingFrame};

/// Drives a [`ForecastEngine`] from a [`PriceSeries`] and checks what comes back.
#[derive(Debug, Clone, Default)]
pub struct ForecastAdapter<E> {
    engine: E,
}

impl<E: ForecastEngine> ForecastAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Reshape, fit, predict, and attach observed values to the output.
    pub fn forecast(
        &self,
        series: &PriceSeries,
        horizon: Horizon,
    ) -> Result<ForecastFrame, ForecastError> {
        if series.is_empty() {
            return Err(ForecastError::EmptyInput);
        }

        let training = TrainingFrame::from_series(series);
        let model = self.engine.fit(&training)?;
        let mut frame = self.engine.predict(&model, horizon)?;
        check_coverage(&frame, &training, horizon)?;
        frame.attach_actuals(&training);

        debug!(
            engine = self.engine.name(),
            symbol = %series.symbol(),
            training_rows = training.len(),
            forecast_rows = frame.len(),
            "forecast produced"
        );
        Ok(frame)
    }
}

/// Rows must run day by day from the first training timestamp through
/// `horizon` days past the last one, with finite values throughout.
fn check_coverage(
    frame: &ForecastFrame,
    training: &TrainingFrame,
    horizon: Horizon,
) -> Result<(), ForecastError> {
    let (Some(first), Some(last)) = (training.first_timestamp(), training.last_timestamp()) else {
        return Err(ForecastError::EmptyInput);
    };

    if frame.first_timestamp() != Some(first) {
        return Err(ForecastError::InvalidOutput(String::from(
            "first row does not match the first training timestamp",
        )));
    }

    let expected_end = last
        .checked_add(Duration::days(i64::from(horizon.get())))
        .ok_or_else(|| ForecastError::InvalidOutput(String::from("horizon overflows the calendar")))?;
    if frame.last_timestamp() != Some(expected_end) {
        return Err(ForecastError::InvalidOutput(format!(
            "last row should be {horizon} past the last training timestamp"
        )));
    }

    for pair in frame.rows().windows(2) {
        if pair[0].timestamp.next_day() != Some(pair[1].timestamp) {
            return Err(ForecastError::InvalidOutput(String::from(
                "rows are not contiguous daily steps",
            )));
        }
    }

    let non_finite = frame.rows().iter().any(|row| {
        !row.predicted.is_finite() || row.components.values().any(|value| !value.is_finite())
    });
    if non_finite {
        return Err(ForecastError::InvalidOutput(String::from(
            "prediction contains non-finite values",
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::AdditiveEngine;
    use crate::{ForecastRow, PriceRecord, Symbol};
    use time::macros::date;
    use time::Date;

    /// Engine that returns whatever rows it was built with.
    struct CannedEngine {
        rows: Vec<ForecastRow>,
    }

    impl ForecastEngine for CannedEngine {
        type Model = ();

        fn name(&self) -> &str {
            "canned"
        }

        fn fit(&self, _training: &TrainingFrame) -> Result<(), ForecastError> {
            Ok(())
        }

        fn predict(&self, _model: &(), _horizon: Horizon) -> Result<ForecastFrame, ForecastError> {
            Ok(ForecastFrame::new(Vec::new(), self.rows.clone()))
        }
    }

    fn series(days: i64) -> PriceSeries {
        let start = date!(2015 - 01 - 01);
        let records = (0..days)
            .map(|i| {
                let close = 10.0 + i as f64;
                PriceRecord::new(start + Duration::days(i), close, close, close, close, 5)
                    .expect("valid")
            })
            .collect();
        PriceSeries::from_unordered(Symbol::parse("GOOG").expect("symbol"), start, records)
    }

    fn days(from: Date, count: i64) -> Vec<ForecastRow> {
        (0..count)
            .map(|i| ForecastRow::new(from + Duration::days(i), 1.0))
            .collect()
    }

    #[test]
    fn forecast_covers_history_plus_horizon() {
        let adapter = ForecastAdapter::new(AdditiveEngine::default());
        let horizon = Horizon::days(5).expect("horizon");
        let frame = adapter.forecast(&series(20), horizon).expect("forecast");

        assert_eq!(frame.len(), 25);
        assert_eq!(frame.rows()[0].actual, Some(10.0));
        assert!(frame.future(horizon).iter().all(|row| row.actual.is_none()));
    }

    #[test]
    fn empty_series_is_rejected() {
        let adapter = ForecastAdapter::new(AdditiveEngine::default());
        let empty = PriceSeries::from_unordered(
            Symbol::parse("GME").expect("symbol"),
            date!(2015 - 01 - 01),
            Vec::new(),
        );
        let err = adapter
            .forecast(&empty, Horizon::days(1).expect("horizon"))
            .expect_err("empty");
        assert_eq!(err, ForecastError::EmptyInput);
    }

    #[test]
    fn short_engine_output_is_rejected() {
        let adapter = ForecastAdapter::new(CannedEngine {
            rows: days(date!(2015 - 01 - 01), 3),
        });
        let err = adapter
            .forecast(&series(3), Horizon::days(2).expect("horizon"))
            .expect_err("too short");
        assert!(matches!(err, ForecastError::InvalidOutput(_)));
    }

    #[test]
    fn gaps_in_engine_output_are_rejected() {
        let mut rows = days(date!(2015 - 01 - 01), 6);
        rows.remove(2);
        rows.push(ForecastRow::new(date!(2015 - 01 - 07), 1.0));
        let adapter = ForecastAdapter::new(CannedEngine { rows });
        let err = adapter
            .forecast(&series(3), Horizon::days(4).expect("horizon"))
            .expect_err("gap");
        assert_eq!(
            err,
            ForecastError::InvalidOutput(String::from("rows are not contiguous daily steps"))
        );
    }
}
