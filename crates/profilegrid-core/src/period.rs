//! `last-N` period selectors.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::PeriodError;

/// Selectors offered as quick links, with their labels.
pub const PRESETS: [(u32, &str); 6] = [
    (0, "today"),
    (1, "yesterday"),
    (2, "2 days"),
    (7, "7 days"),
    (30, "30 days"),
    (100, "100 days"),
];

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A trailing window of `days` days ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub days: u32,
}

impl Period {
    /// Fails when the window reaches past the earliest representable date.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, PeriodError> {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.days)))
            .ok_or_else(|| PeriodError(self.to_string()))?;
        Ok(DateRange { start, end: today })
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let days = raw
            .strip_prefix("last-")
            .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| PeriodError(raw.to_string()))?;
        Ok(Self { days })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "last-{}", self.days)
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn resolve_period(selector: &str, today: NaiveDate) -> Result<DateRange, PeriodError> {
    selector.parse::<Period>()?.resolve(today)
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodLink {
    pub period: Period,
    pub label: &'static str,
}

pub fn preset_links() -> Vec<PeriodLink> {
    PRESETS
        .iter()
        .map(|&(days, label)| PeriodLink {
            period: Period { days },
            label,
        })
        .collect()
}
