//! Time-window normalization.
//!
//! The canonical time unit is the wiki week: whole 7-day periods elapsed
//! since 2001-01-01 (the start of recorded history). Every caller shares
//! the same origin — a second origin anywhere would silently corrupt all
//! downstream week comparisons.

use chrono::{Datelike, Duration, NaiveDate};

/// The fixed origin instant. Week 0 starts here.
pub const ORIGIN: NaiveDate = match NaiveDate::from_ymd_opt(2001, 1, 1) {
    Some(d) => d,
    None => panic!("invalid origin date"),
};

/// Number of weeks to reach back when a window's start is unusable.
const REPAIR_SPAN: i64 = 55;

/// Convert a calendar date to its wiki week, flooring into the week
/// bucket. Dates before the origin produce negative weeks.
pub fn date_to_week(date: NaiveDate) -> i64 {
    date.signed_duration_since(ORIGIN).num_days().div_euclid(7)
}

/// Convert a wiki week back to the first calendar date of its bucket.
pub fn week_to_date(week: i64) -> NaiveDate {
    ORIGIN + Duration::weeks(week)
}

/// Parse an 8-digit `YYYYMMDD` date. Anything else is `None`; malformed
/// dates are treated as absent by the resolution ladder, not raised.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

/// Same calendar day one year earlier. Feb 29 maps to Feb 28.
fn one_year_before(date: NaiveDate) -> NaiveDate {
    date.with_year(date.year() - 1)
        .or_else(|| NaiveDate::from_ymd_opt(date.year() - 1, 2, 28))
        .unwrap_or(date)
}

/// A validated `[start_week, end_week]` request window. Immutable once
/// produced; one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_week: i64,
    pub end_week: i64,
}

impl TimeWindow {
    /// Resolve a window from optional calendar dates and optional
    /// explicit week indices.
    ///
    /// Resolution priority per bound: explicit week wins over a derived
    /// date; with neither, the default range is one year ending `today`.
    pub fn resolve(
        start_date: Option<&str>,
        end_date: Option<&str>,
        start_week: Option<i64>,
        end_week: Option<i64>,
        today: NaiveDate,
    ) -> Self {
        let start_week = start_week
            .or_else(|| start_date.and_then(parse_date).map(date_to_week))
            .unwrap_or_else(|| date_to_week(one_year_before(today)));
        let end_week = end_week
            .or_else(|| end_date.and_then(parse_date).map(date_to_week))
            .unwrap_or_else(|| date_to_week(today));
        Self { start_week, end_week }
    }

    /// The silent repair rule: an unusable start (non-positive, or past
    /// the end) is replaced with a trailing ~56-week window ending at
    /// `end_week`. Never an error; the window stays usable for messy
    /// historical requests.
    pub fn repair(self) -> Self {
        if self.start_week <= 0 || self.start_week > self.end_week {
            Self {
                start_week: self.end_week - REPAIR_SPAN,
                end_week: self.end_week,
            }
        } else {
            self
        }
    }

    /// Whether a week falls inside the window (inclusive).
    pub fn contains(&self, week: i64) -> bool {
        week >= self.start_week && week <= self.end_week
    }
}
