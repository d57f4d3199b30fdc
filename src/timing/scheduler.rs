//! Placement of an item's amount onto the project's monthly period axis
//!
//! Period numbers are anchored to the project start, not the item start, so
//! items on different timelines line up on one shared axis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar;
use super::curve::{self, DistributionParams, DEFAULT_STEEPNESS};
use crate::budget::{BudgetLineItem, CurveProfile};

/// One month of an item's spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPeriod {
    /// Month label, e.g. "Mar 2025"
    pub label: String,

    /// 1-based period on the project axis (period 1 = project start month)
    pub period_number: i32,

    pub amount: f64,

    /// Share of the item total, 0-100
    pub percent: f64,
}

/// Inclusive calendar-month count from `start` to `end`; zero or negative when `end` precedes `start`
pub fn duration_months(start: NaiveDate, end: NaiveDate) -> i32 {
    calendar::months_between(start, end) + 1
}

/// Distribution parameters carried on a line item
pub fn distribution_params(item: &BudgetLineItem) -> DistributionParams {
    DistributionParams {
        method: item.timing_method,
        profile: item.curve_profile.unwrap_or(CurveProfile::Standard),
        steepness: item.curve_steepness.unwrap_or(DEFAULT_STEEPNESS),
    }
}

/// Spread `amount` over the months from `start` to `end`.
///
/// Returns an empty vector when the duration is not positive.
pub fn schedule(
    amount: f64,
    start: NaiveDate,
    end: NaiveDate,
    params: &DistributionParams,
    project_start: NaiveDate,
) -> Vec<DistributionPeriod> {
    let months = duration_months(start, end);
    let offset = calendar::months_between(project_start, start);
    let item_month = calendar::first_of_month(start);

    curve::weights(months, params)
        .into_iter()
        .enumerate()
        .map(|(index, weight)| DistributionPeriod {
            label: calendar::month_label(calendar::add_months(item_month, index as i32)),
            period_number: offset + index as i32 + 1,
            amount: weight * amount,
            percent: weight * 100.0,
        })
        .collect()
}

/// Place the whole amount in the start month
pub fn single_period(amount: f64, start: NaiveDate, project_start: NaiveDate) -> Vec<DistributionPeriod> {
    vec![DistributionPeriod {
        label: calendar::month_label(start),
        period_number: calendar::months_between(project_start, start) + 1,
        amount,
        percent: 100.0,
    }]
}
