use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GeeError;

/// Date format used for Earth Engine date arguments: "YYYY-MM-DD"
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A one-month window identified by calendar year and 1-based month.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

/// A half-open date interval `[start, end)`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, GeeError> {
        if !(1..=12).contains(&month) {
            return Err(GeeError::InvalidMonth(month));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(GeeError::InvalidRequest(format!("year {year} out of range")));
        }
        Ok(Period { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The same month in another year.
    pub fn with_year(&self, year: i32) -> Result<Self, GeeError> {
        Period::new(year, self.month)
    }

    /// First day of the month.
    pub fn start(&self) -> NaiveDate {
        // validated in `new`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month.
    pub fn end(&self) -> NaiveDate {
        let start = self.start();
        start
            .checked_add_months(chrono::Months::new(1))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn interval(&self) -> DateInterval {
        DateInterval {
            start: self.start(),
            end: self.end(),
        }
    }
}

impl DateInterval {
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start <= *date && *date < self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl From<NaiveDate> for Period {
    fn from(value: NaiveDate) -> Self {
        Period {
            year: value.year(),
            month: value.month(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}
