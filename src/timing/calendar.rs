//! Calendar-month arithmetic shared by the scheduler and escalation

use chrono::{Datelike, Months, NaiveDate};

/// First day of the date's month
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Calendar months from `from` to `to`, ignoring the day of month
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// Full years elapsed from `from` to `to`; negative when `to` is earlier
pub fn whole_years_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut years = to.year() - from.year();
    if years > 0 && (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    } else if years < 0 && (to.month(), to.day()) > (from.month(), from.day()) {
        years += 1;
    }
    years
}

/// Shift a date by a signed number of months (day clamped to month end)
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Grid label for a month, e.g. "Jan 2025"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Label of the given 1-based period on a project axis
pub fn period_label(project_start: NaiveDate, period_number: i32) -> String {
    month_label(add_months(first_of_month(project_start), period_number - 1))
}
