use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Canonical identity of a calendar day, rendered as `YYYY-MM-DD`.
///
/// Built on `NaiveDate` so no timezone ever enters the comparison: two keys are
/// equal iff their canonical strings are equal, and ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date `{0}`, expected YYYY-MM-DD")]
pub struct ParseDateKeyError(pub String);

impl DateKey {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// `None` when the result falls outside the calendar chrono can represent.
    pub fn checked_offset_days(self, days: i64) -> Option<Self> {
        Duration::try_days(days)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
    }

    /// Like [`checked_offset_days`](Self::checked_offset_days), but clamps to the
    /// first or last representable day instead of failing.
    pub fn offset_days(self, days: i64) -> Self {
        self.checked_offset_days(days).unwrap_or(if days < 0 {
            Self(NaiveDate::MIN)
        } else {
            Self(NaiveDate::MAX)
        })
    }

    /// Every key from `self` to `end`, both inclusive. Empty when `end < self`.
    pub fn days_through(self, end: DateKey) -> impl Iterator<Item = DateKey> {
        self.0
            .iter_days()
            .take_while(move |date| *date <= end.0)
            .map(DateKey)
    }

    /// Number of days from `self` to `other` (negative when `other` is earlier).
    pub fn days_between(self, other: DateKey) -> i64 {
        (other.0 - self.0).num_days()
    }

    pub fn week_start(self) -> Self {
        self.offset_days(-i64::from(self.0.weekday().num_days_from_monday()))
    }

    pub fn week_end(self) -> Self {
        self.week_start().offset_days(6)
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Short display label such as `Nov 20`.
    pub fn label(self) -> String {
        self.0.format("%b %-d").to_string()
    }

    pub fn label_with_year(self) -> String {
        self.0.format("%b %-d %Y").to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = ParseDateKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        // upstream rows may carry a midnight timestamp; only the calendar part matters
        let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ParseDateKeyError(value.to_string()))
    }
}

impl TryFrom<String> for DateKey {
    type Error = ParseDateKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}
