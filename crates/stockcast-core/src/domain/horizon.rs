use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub const DAYS_PER_YEAR: u32 = 365;

/// Number of future days to forecast past the last observed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Horizon(u32);

impl Horizon {
    pub fn days(days: u32) -> Result<Self, ValidationError> {
        if days == 0 {
            return Err(ValidationError::EmptyHorizon);
        }
        Ok(Self(days))
    }

    /// Convert a year count into days, checking it against `[min, max]`.
    pub fn from_years(years: u32, min: u32, max: u32) -> Result<Self, ValidationError> {
        if years < min || years > max {
            return Err(ValidationError::HorizonOutOfRange {
                value: years,
                min,
                max,
            });
        }
        Self::days(years * DAYS_PER_YEAR)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for Horizon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} days", self.0)
    }
}
