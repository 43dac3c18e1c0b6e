use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::ValidationError;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a calendar date in `YYYY-MM-DD` form.
///
/// A trailing time component (`2024-01-05 00:00:00`, `2024-01-05T00:00:00Z`)
/// is accepted and dropped; upstream payloads are daily.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    let trimmed = input.trim();
    let day_part = trimmed.get(..10).unwrap_or(trimmed);
    if trimmed.len() > 10 {
        let separator = trimmed.as_bytes()[10];
        if separator != b' ' && separator != b'T' {
            return Err(ValidationError::InvalidDate {
                value: input.to_owned(),
            });
        }
    }

    Date::parse(day_part, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| String::from("<unformattable>"))
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Serde adapter storing a [`Date`] as a `YYYY-MM-DD` string.
pub mod iso_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_date(&value).map_err(D::Error::custom)
    }
}
