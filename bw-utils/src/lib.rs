//! Shared utility functions for BloomWatch crates.

/// Month name helpers
pub mod months {
    /// English month names, January first.
    pub const MONTH_NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    /// Name of a 1-based month, or "?" outside 1..=12.
    pub fn month_name(month: u32) -> &'static str {
        month
            .checked_sub(1)
            .and_then(|i| MONTH_NAMES.get(i as usize))
            .copied()
            .unwrap_or("?")
    }

    /// Parse a month given as a number ("5"), a full name ("May") or a
    /// three-letter abbreviation ("may"), case-insensitively.
    pub fn parse_month(s: &str) -> anyhow::Result<u32> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u32>() {
            if (1..=12).contains(&n) {
                return Ok(n);
            }
            anyhow::bail!("month {} out of range 1..=12", n);
        }
        let lowered = s.to_lowercase();
        MONTH_NAMES
            .iter()
            .position(|name| {
                let name = name.to_lowercase();
                name == lowered || (lowered.len() == 3 && name.starts_with(&lowered))
            })
            .map(|i| i as u32 + 1)
            .ok_or_else(|| anyhow::anyhow!("unknown month '{}'", s))
    }

}

/// Year helpers
pub mod years {
    use chrono::{Datelike, Local};
    use std::ops::RangeInclusive;

    /// First year of the MODIS vegetation record offered for charts.
    pub const FIRST_CHART_YEAR: i32 = 2000;

    /// The current calendar year.
    pub fn current_year() -> i32 {
        Local::now().naive_local().date().year()
    }

    /// Years a chart may span: the start of the record through this year.
    pub fn chart_years() -> RangeInclusive<i32> {
        FIRST_CHART_YEAR..=current_year()
    }

    /// Parse "2018-2024" or "2018..2024" (inclusive), or a single "2020".
    pub fn parse_year_range(s: &str) -> anyhow::Result<(i32, i32)> {
        let s = s.trim();
        let (from, to) = match s.split_once("..").or_else(|| s.split_once('-')) {
            Some((from, to)) => (from.trim().parse::<i32>()?, to.trim().parse::<i32>()?),
            None => {
                let year = s.parse::<i32>()?;
                (year, year)
            }
        };
        if from > to {
            anyhow::bail!("year range {} runs backwards", s);
        }
        Ok((from, to))
    }

}
