use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::{AppError, Result};

/// File name of a collected day inside its `YYYY/MM/DD` directory.
pub const DAY_FILE_NAME: &str = "slack.json";

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Parse `YYYY-MM` into the first through last day of that month.
    pub fn month(s: &str) -> Result<Self> {
        let start = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map_err(|_| {
                AppError::InvalidDate(format!("{} (expected YYYY-MM)", s))
            })?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.checked_sub_days(Days::new(1)))
            .ok_or_else(|| AppError::InvalidDate(s.to_string()))?;

        Ok(Self { start, end })
    }

    pub fn custom(from: &str, to: &str) -> Result<Self> {
        let start = parse_day(from)?;
        let end = parse_day(to)?;

        if end < start {
            return Err(AppError::InvalidDateRange(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }

        Ok(Self { start, end })
    }

    /// Every day from `start` through `end`.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(format!("{} (expected YYYY-MM-DD)", s)))
}

/// `<base>/YYYY/MM/DD/slack.json`
pub fn output_path(base: &Path, day: NaiveDate) -> PathBuf {
    base.join(format!("{:04}", day.year()))
        .join(format!("{:02}", day.month()))
        .join(format!("{:02}", day.day()))
        .join(DAY_FILE_NAME)
}
