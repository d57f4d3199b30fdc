//! Escalation of nominal amounts for cost or price growth
//!
//! `ToStart` compounds over whole years from the reference date to the start
//! of work. `ThroughDuration` compounds to the midpoint of the work, so its
//! exposure is whole years to start plus a fractional half-duration.

use chrono::NaiveDate;

use super::calendar;
use crate::budget::{BudgetLineItem, EscalationMethod};

/// Annual escalation rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escalation {
    /// Annual rate in percent
    pub rate_pct: f64,
    pub method: EscalationMethod,
}

impl Escalation {
    /// The item's escalation rule, or None when it passes through unchanged
    pub fn for_item(item: &BudgetLineItem) -> Option<Self> {
        let rate_pct = item.escalation_rate?;
        if rate_pct == 0.0 {
            return None;
        }

        let method = match item.escalation_method {
            Some(method) => method,
            None => {
                log::warn!(
                    "line item {} has escalation rate {}% but no method; compounding to start",
                    item.id,
                    rate_pct
                );
                EscalationMethod::ToStart
            }
        };

        Some(Self { rate_pct, method })
    }

    /// Years of compounding exposure for work between `start` and `end`
    pub fn exposure_years(&self, start: NaiveDate, end: NaiveDate, reference: NaiveDate) -> f64 {
        let years_to_start = calendar::whole_years_between(reference, start) as f64;
        match self.method {
            EscalationMethod::ToStart => years_to_start,
            EscalationMethod::ThroughDuration => {
                let duration_years = (calendar::months_between(start, end) + 1) as f64 / 12.0;
                years_to_start + duration_years / 2.0
            }
        }
    }

    /// Compound `base` forward over the exposure period
    pub fn apply(&self, base: f64, start: NaiveDate, end: NaiveDate, reference: NaiveDate) -> f64 {
        let growth = 1.0 + self.rate_pct / 100.0;
        let exposure = self.exposure_years(start, end, reference);

        if exposure.fract() == 0.0 {
            base * growth.powi(exposure as i32)
        } else {
            base * growth.powf(exposure)
        }
    }
}

/// Escalate `base` for work between `start` and `end`, measured from `reference`
/// (the project start). A missing or zero rate returns `base` unchanged.
pub fn escalate(
    base: f64,
    rate_pct: Option<f64>,
    method: Option<EscalationMethod>,
    start: NaiveDate,
    end: NaiveDate,
    reference: NaiveDate,
) -> f64 {
    match rate_pct {
        None => base,
        Some(rate) if rate == 0.0 => base,
        Some(rate_pct) => Escalation {
            rate_pct,
            method: method.unwrap_or_default(),
        }
        .apply(base, start, end, reference),
    }
}

/// Escalated total for a line item, resolving its timing against the project start
pub fn escalated_amount(item: &BudgetLineItem, project_start: NaiveDate) -> f64 {
    match Escalation::for_item(item) {
        None => item.amount,
        Some(rule) => {
            let (start, end) = item.date_range(project_start);
            rule.apply(item.amount, start, end, project_start)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{Activity, CategoryPath, ItemTiming};
    use approx::assert_relative_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zero_rate_is_exact_passthrough() {
        let base = 123_456.789;
        let start = ymd(2030, 5, 1);
        let end = ymd(2031, 5, 1);
        let reference = ymd(2024, 1, 1);

        assert_eq!(escalate(base, Some(0.0), Some(EscalationMethod::ThroughDuration), start, end, reference), base);
        assert_eq!(escalate(base, None, None, start, end, reference), base);
    }

    #[test]
    fn test_to_start_whole_years() {
        let base = 1_000_000.0;
        let escalated = escalate(
            base,
            Some(10.0),
            Some(EscalationMethod::ToStart),
            ymd(2026, 1, 1),
            ymd(2026, 12, 31),
            ymd(2024, 1, 1),
        );
        assert_relative_eq!(escalated, base * 1.1 * 1.1, max_relative = 1e-12);
    }

    #[test]
    fn test_to_start_ignores_partial_year() {
        // 1 year 11 months to start: still one whole year
        let escalated = escalate(
            100.0,
            Some(10.0),
            Some(EscalationMethod::ToStart),
            ymd(2025, 12, 1),
            ymd(2026, 6, 1),
            ymd(2024, 1, 1),
        );
        assert_relative_eq!(escalated, 110.0, max_relative = 1e-12);
    }

    #[test]
    fn test_through_duration_uses_fractional_midpoint() {
        // 2 whole years to start, 12-month duration => 2.5 years exposure
        let rule = Escalation { rate_pct: 4.0, method: EscalationMethod::ThroughDuration };
        let start = ymd(2026, 1, 1);
        let end = ymd(2026, 12, 1);
        let reference = ymd(2024, 1, 1);

        assert_relative_eq!(rule.exposure_years(start, end, reference), 2.5);
        assert_relative_eq!(
            rule.apply(1000.0, start, end, reference),
            1000.0 * 1.04_f64.powf(2.5),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_negative_rate_deflates() {
        let escalated = escalate(
            1000.0,
            Some(-50.0),
            Some(EscalationMethod::ToStart),
            ymd(2026, 1, 1),
            ymd(2026, 2, 1),
            ymd(2025, 1, 1),
        );
        assert_relative_eq!(escalated, 500.0);
    }

    #[test]
    fn test_missing_method_defaults_to_start() {
        let item = BudgetLineItem {
            escalation_rate: Some(10.0),
            ..BudgetLineItem::new(
                "E-1",
                "Vertical",
                100.0,
                ItemTiming::Dates { start: ymd(2027, 1, 1), end: ymd(2027, 12, 1) },
                CategoryPath::cost(Activity::Development),
            )
        };
        let escalated = escalated_amount(&item, ymd(2025, 1, 1));
        assert_relative_eq!(escalated, 121.0, max_relative = 1e-12);
    }
}
