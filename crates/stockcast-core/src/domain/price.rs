use serde::{Deserialize, Serialize};
use time::Date;

use super::date::iso_date;
use crate::{Symbol, ValidationError};

/// One trading day of OHLCV data, in the canonical column naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "Date", with = "iso_date")]
    pub date: Date,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl PriceRecord {
    pub fn new(
        date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_finite("open", open)?;
        validate_finite("high", high)?;
        validate_finite("low", low)?;
        validate_finite("close", close)?;

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Daily price history for one ticker.
///
/// Records are strictly ascending by date and never precede `start`. The
/// constructor enforces both, so a `PriceSeries` in hand always satisfies them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: Symbol,
    #[serde(with = "iso_date")]
    start: Date,
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    /// Build a series from records in any order.
    ///
    /// Records before `start` are dropped, the rest are sorted by date and
    /// only the first record seen for each date is kept.
    pub fn from_unordered(symbol: Symbol, start: Date, records: Vec<PriceRecord>) -> Self {
        let mut records: Vec<PriceRecord> = records
            .into_iter()
            .filter(|record| record.date >= start)
            .collect();
        // Stable sort keeps upstream order among equal dates.
        records.sort_by_key(|record| record.date);
        records.dedup_by_key(|record| record.date);

        Self {
            symbol,
            start,
            records,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<Date> {
        self.records.first().map(|record| record.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.records.last().map(|record| record.date)
    }

    /// Last `n` records, oldest first.
    pub fn tail(&self, n: usize) -> &[PriceRecord] {
        let skip = self.records.len().saturating_sub(n);
        &self.records[skip..]
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}
