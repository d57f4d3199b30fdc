//! Budget line item data structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::category::{CategoryPath, SectionId};
use crate::timing::calendar;

/// How an item's amount is spread across its duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMethod {
    /// Even spread across all months
    #[default]
    #[serde(alias = "even")]
    Distributed,
    /// S-curve spread
    Curve,
    /// Milestone payments (spread evenly at this layer)
    Milestone,
    /// Manually entered periods (spread evenly at this layer)
    Manual,
}

impl FromStr for TimingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distributed" | "even" => Ok(TimingMethod::Distributed),
            "curve" | "s_curve" | "s-curve" => Ok(TimingMethod::Curve),
            "milestone" => Ok(TimingMethod::Milestone),
            "manual" => Ok(TimingMethod::Manual),
            other => Err(format!("unknown timing method '{}'", other)),
        }
    }
}

/// Shape of an S-curve spread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveProfile {
    #[default]
    Standard,
    FrontLoaded,
    BackLoaded,
}

impl FromStr for CurveProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(CurveProfile::Standard),
            "front_loaded" => Ok(CurveProfile::FrontLoaded),
            "back_loaded" => Ok(CurveProfile::BackLoaded),
            other => Err(format!("unknown curve profile '{}'", other)),
        }
    }
}

/// How escalation exposure is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMethod {
    /// Whole years from the reference date to the start of work
    #[default]
    ToStart,
    /// Years to start plus half the work duration
    ThroughDuration,
}

impl FromStr for EscalationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "to_start" => Ok(EscalationMethod::ToStart),
            "through_duration" => Ok(EscalationMethod::ThroughDuration),
            other => Err(format!("unknown escalation method '{}'", other)),
        }
    }
}

/// When an item happens: explicit dates, or a project-relative period window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemTiming {
    Dates { start: NaiveDate, end: NaiveDate },
    /// 1-based start period on the project axis and a duration in months
    Periods { start_period: i32, duration: i32 },
}

/// Container (phase, building, etc.) an item is budgeted under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
}

/// Scheduling-dependency fields carried for the UI; the engine never reads them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpmFields {
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default)]
    pub successors: Vec<String>,
    #[serde(default)]
    pub is_critical: bool,
}

/// A single budget line item as maintained by the budgeting UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLineItem {
    /// Unique line item identifier
    pub id: String,

    /// Description shown in the grid
    #[serde(default)]
    pub description: String,

    /// Nominal (un-escalated) amount
    pub amount: f64,

    pub timing: ItemTiming,

    #[serde(default)]
    pub timing_method: TimingMethod,

    /// Required when `timing_method` is `Curve`
    #[serde(default)]
    pub curve_profile: Option<CurveProfile>,

    /// 0-100, clamped by the curve generator
    #[serde(default)]
    pub curve_steepness: Option<f64>,

    /// Annual escalation in percent (e.g. 3.5 for 3.5%)
    #[serde(default)]
    pub escalation_rate: Option<f64>,

    /// Required when `escalation_rate` is non-zero
    #[serde(default)]
    pub escalation_method: Option<EscalationMethod>,

    pub category: CategoryPath,

    #[serde(default)]
    pub container: Option<Container>,

    #[serde(default)]
    pub cpm: CpmFields,
}

impl BudgetLineItem {
    /// Create an evenly-distributed, unescalated item
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        timing: ItemTiming,
        category: CategoryPath,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            timing,
            timing_method: TimingMethod::Distributed,
            curve_profile: None,
            curve_steepness: None,
            escalation_rate: None,
            escalation_method: None,
            category,
            container: None,
            cpm: CpmFields::default(),
        }
    }

    /// Spread along an S-curve
    pub fn with_curve(mut self, profile: CurveProfile, steepness: f64) -> Self {
        self.timing_method = TimingMethod::Curve;
        self.curve_profile = Some(profile);
        self.curve_steepness = Some(steepness);
        self
    }

    pub fn with_timing_method(mut self, method: TimingMethod) -> Self {
        self.timing_method = method;
        self
    }

    /// Apply annual escalation (rate in percent)
    pub fn with_escalation(mut self, rate_pct: f64, method: EscalationMethod) -> Self {
        self.escalation_rate = Some(rate_pct);
        self.escalation_method = Some(method);
        self
    }

    pub fn in_container(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.container = Some(Container {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    /// Section of the cash flow this item is reported under
    pub fn section(&self) -> SectionId {
        self.category.section()
    }

    /// Resolve the item's timing to a (start, end) month pair.
    ///
    /// Period-based timing is anchored on the project start; a non-positive
    /// duration yields an end before the start.
    pub fn date_range(&self, project_start: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self.timing {
            ItemTiming::Dates { start, end } => (start, end),
            ItemTiming::Periods { start_period, duration } => {
                let anchor = calendar::first_of_month(project_start);
                let start = calendar::add_months(anchor, start_period - 1);
                let end = calendar::add_months(start, duration - 1);
                (start, end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::category::Activity;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_timing_resolves_against_project_start() {
        let item = BudgetLineItem::new(
            "P-1",
            "Site work",
            1000.0,
            ItemTiming::Periods { start_period: 4, duration: 6 },
            CategoryPath::cost(Activity::Development),
        );

        let (start, end) = item.date_range(ymd(2025, 1, 15));
        assert_eq!(start, ymd(2025, 4, 1));
        assert_eq!(end, ymd(2025, 9, 1));
    }

    #[test]
    fn test_date_timing_passthrough() {
        let item = BudgetLineItem::new(
            "D-1",
            "Land",
            1000.0,
            ItemTiming::Dates { start: ymd(2025, 3, 1), end: ymd(2025, 5, 31) },
            CategoryPath::cost(Activity::Acquisition),
        );
        assert_eq!(item.date_range(ymd(2025, 1, 1)), (ymd(2025, 3, 1), ymd(2025, 5, 31)));
        assert_eq!(item.section(), SectionId::CostAcquisition);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "id": "R-1",
            "amount": 500000,
            "timing": { "kind": "dates", "start": "2026-01-01", "end": "2026-06-30" },
            "timing_method": "curve",
            "curve_profile": "back_loaded",
            "curve_steepness": 70,
            "category": { "activity": "disposition", "kind": "revenue", "l1": "Lot Sales" }
        }"#;

        let item: BudgetLineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.timing_method, TimingMethod::Curve);
        assert_eq!(item.curve_profile, Some(CurveProfile::BackLoaded));
        assert_eq!(item.section(), SectionId::RevenueGross);
        assert!(item.container.is_none());
        assert!(!item.cpm.is_critical);
    }

    #[test]
    fn test_enum_labels_parse() {
        assert_eq!("even".parse::<TimingMethod>().unwrap(), TimingMethod::Distributed);
        assert_eq!("front-loaded".parse::<CurveProfile>().unwrap(), CurveProfile::FrontLoaded);
        assert_eq!("through_duration".parse::<EscalationMethod>().unwrap(), EscalationMethod::ThroughDuration);
        assert!("weekly".parse::<TimingMethod>().is_err());
    }
}
