//! Calendar-month arithmetic.
//!
//! Every month bucket in the engine goes through `Month` so truncation and
//! month differences are plain integer arithmetic instead of SQL date
//! functions.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month, stored as `year * 12 + (month - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(i32);

impl Month {
    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Month(date.year() * 12 + date.month0() as i32)
    }

    pub fn year(self) -> i32 {
        self.0.div_euclid(12)
    }

    /// 1-based month number.
    pub fn month(self) -> u32 {
        self.0.rem_euclid(12) as u32 + 1
    }

    /// `None` when the month lies outside chrono's date range.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1)
    }

    pub fn last_day(self) -> Option<NaiveDate> {
        self.succ().first_day()?.pred_opt()
    }

    pub fn succ(self) -> Self {
        Month(self.0 + 1)
    }

    pub fn pred(self) -> Self {
        Month(self.0 - 1)
    }

    pub fn add_months(self, n: i32) -> Self {
        Month(self.0 + n)
    }

    /// `self - earlier` in whole months (negative when `earlier` is later).
    pub fn months_since(self, earlier: Month) -> i32 {
        self.0 - earlier.0
    }

    pub fn checked_add_months(self, n: i32) -> Option<Self> {
        self.0.checked_add(n).map(Month)
    }

    /// The month `n` months before `self`, or `None` on overflow.
    pub fn checked_sub_months(self, n: u32) -> Option<Self> {
        let n = i32::try_from(n).ok()?;
        self.0.checked_sub(n).map(Month)
    }

    /// Every month from `self` through `end` inclusive, oldest first.
    pub fn through(self, end: Month) -> Vec<Month> {
        (self.0..=end.0).map(Month).collect()
    }
}

/// `n` contiguous calendar months ending at `end`, plus the date bounds
/// that cover them.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSpan {
    /// Oldest first.
    pub months: Vec<Month>,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl MonthSpan {
    /// `None` when `n` is zero or the span leaves chrono's date range.
    pub fn ending_at(end: Month, n: u32) -> Option<Self> {
        let oldest = end.checked_sub_months(n.checked_sub(1)?)?;
        Some(Self {
            from: oldest.first_day()?,
            to: end.last_day()?,
            months: oldest.through(end),
        })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Serialize for Month {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map(Month::of)
            .map_err(serde::de::Error::custom)
    }
}

/// First day of a trailing window of `days` days ending at `anchor`.
/// Dates on or after the returned day are inside the window.
pub fn window_start(anchor: NaiveDate, days: i64) -> NaiveDate {
    anchor
        .checked_sub_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MIN)
}

/// The later of the anchor month and the month of `latest`.
pub fn latest_month(anchor: NaiveDate, latest: Option<NaiveDate>) -> Month {
    Month::of(latest.map_or(anchor, |date| date.max(anchor)))
}

/// The most recent month that has fully elapsed as of `anchor`.
/// The anchor's own month counts only when the anchor is its last day.
pub fn last_complete_month(anchor: NaiveDate) -> Month {
    let month = Month::of(anchor);
    if month.last_day() == Some(anchor) {
        month
    } else {
        month.pred()
    }
}
