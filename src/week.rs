// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monday-anchored week boundaries.

use chrono::{Datelike, Duration, NaiveDate, Utc};

/// Date format used for `week_start_date` columns and API parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Monday of the calendar week containing `date`.
///
/// With Sunday = 0 … Saturday = 6, the days to step back are
/// `(weekday + 6) % 7`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().num_days_from_sunday() as i64;
    let days_to_subtract = (weekday + 6) % 7;
    date - Duration::days(days_to_subtract)
}

/// Monday of the week after the one containing `today`.
pub fn next_week_start(today: NaiveDate) -> NaiveDate {
    week_start(today) + Duration::days(7)
}

/// Current UTC date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` string that must fall on a Monday.
pub fn parse_week_start(raw: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()?;
    (week_start(date) == date).then_some(date)
}
