//! Cash flow schedule output structures
//!
//! The same shapes serve the fine-grained monthly schedule and every
//! aggregated view, so grid renderers and exporters consume one type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::budget::{Activity, Container, SectionId};

/// Output period granularity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    #[default]
    Monthly,
    Quarterly,
    Annual,
    Overall,
}

impl TimeScale {
    /// Months per output period; None for a single all-project period
    pub fn months_per_period(&self) -> Option<i32> {
        match self {
            TimeScale::Monthly => Some(1),
            TimeScale::Quarterly => Some(3),
            TimeScale::Annual => Some(12),
            TimeScale::Overall => None,
        }
    }
}

impl FromStr for TimeScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "month" => Ok(TimeScale::Monthly),
            "quarterly" | "quarter" => Ok(TimeScale::Quarterly),
            "annual" | "annually" | "yearly" => Ok(TimeScale::Annual),
            "overall" | "total" => Ok(TimeScale::Overall),
            other => Err(format!("unknown time scale '{}'", other)),
        }
    }
}

/// Output line item grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostGranularity {
    /// One row per section
    #[default]
    Summary,
    /// Grouped by lifecycle activity
    ByStage,
    /// Grouped by top-level category
    ByCategory,
    /// Grouped by container, with the item rows nested underneath
    ByPhase,
}

impl FromStr for CostGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "summary" => Ok(CostGranularity::Summary),
            "by_stage" | "stage" => Ok(CostGranularity::ByStage),
            "by_category" | "category" => Ok(CostGranularity::ByCategory),
            "by_phase" | "phase" => Ok(CostGranularity::ByPhase),
            other => Err(format!("unknown cost granularity '{}'", other)),
        }
    }
}

/// One column of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodColumn {
    /// Project-axis month for monthly columns, 1-based bucket index otherwise
    pub period_number: i32,

    pub label: String,

    /// First and last project-axis months covered (equal for monthly columns)
    pub first_month: i32,
    pub last_month: i32,

    /// Calendar labels of the first and last month covered
    pub first_label: String,
    pub last_label: String,
}

impl PeriodColumn {
    /// A single-month column
    pub fn month(period_number: i32, label: String) -> Self {
        Self {
            period_number,
            first_month: period_number,
            last_month: period_number,
            first_label: label.clone(),
            last_label: label.clone(),
            label,
        }
    }

    pub fn month_count(&self) -> i32 {
        self.last_month - self.first_month + 1
    }
}

/// A row of the grid: either one budget item or a group of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowLineItem {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub activity: Option<Activity>,

    /// Top-level category label
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub container: Option<Container>,

    /// Amount per schedule column
    pub values: Vec<f64>,

    pub total: f64,

    /// Nested rows (by-phase view only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_items: Vec<CashFlowLineItem>,
}

impl CashFlowLineItem {
    /// Recompute `total` from `values`
    pub fn refresh_total(&mut self) {
        self.total = self.values.iter().sum();
    }

    pub fn is_leaf(&self) -> bool {
        self.child_items.is_empty()
    }

    /// Append this row's leaf rows (itself if it has no children) to `out`
    pub fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a CashFlowLineItem>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.child_items {
                child.collect_leaves(out);
            }
        }
    }
}

/// One fixed section of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSection {
    pub id: SectionId,
    pub name: String,
    pub line_items: Vec<CashFlowLineItem>,

    /// Per-column sums of `line_items`
    pub subtotals: Vec<f64>,

    /// Sum of `subtotals`
    pub section_total: f64,
}

impl CashFlowSection {
    /// Build a section whose subtotals are the column sums of its rows
    pub fn from_rows(id: SectionId, line_items: Vec<CashFlowLineItem>, columns: usize) -> Self {
        let mut subtotals = vec![0.0; columns];
        for row in &line_items {
            for (subtotal, value) in subtotals.iter_mut().zip(&row.values) {
                *subtotal += value;
            }
        }
        Self::with_subtotals(id, line_items, subtotals)
    }

    /// Build a section from precomputed subtotals
    pub fn with_subtotals(id: SectionId, line_items: Vec<CashFlowLineItem>, subtotals: Vec<f64>) -> Self {
        let section_total = subtotals.iter().sum();
        Self {
            id,
            name: id.name().to_string(),
            line_items,
            subtotals,
            section_total,
        }
    }

    /// All leaf rows, in row order
    pub fn leaves(&self) -> Vec<&CashFlowLineItem> {
        let mut out = Vec::new();
        for row in &self.line_items {
            row.collect_leaves(&mut out);
        }
        out
    }
}

/// Total for one cost section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub section: SectionId,
    pub name: String,
    pub total: f64,
}

/// Project-level totals and investment metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub gross_revenue: f64,
    pub revenue_deductions: f64,
    pub net_revenue: f64,
    pub total_costs: f64,

    /// Cost totals in section order
    pub costs_by_category: Vec<CategoryTotal>,

    pub gross_profit: f64,
    pub gross_margin: Option<f64>,

    /// Annualized internal rate of return
    pub irr: Option<f64>,
    pub npv: f64,
    pub equity_multiple: Option<f64>,
    pub peak_equity: f64,

    /// 0-based column index at which cumulative cash flow recovers
    pub payback_period: Option<usize>,

    /// Net cash flow per schedule column
    pub net_cash_flow: Vec<f64>,

    /// Items counted in the totals but absent from the period columns
    #[serde(default)]
    pub unscheduled_items: Vec<String>,
}

/// A complete cash flow schedule (monthly source or aggregated view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSchedule {
    pub project_start: NaiveDate,
    pub time_scale: TimeScale,

    /// None for the item-level source schedule
    pub cost_granularity: Option<CostGranularity>,

    pub periods: Vec<PeriodColumn>,
    pub sections: Vec<CashFlowSection>,
    pub summary: CashFlowSummary,
}

impl CashFlowSchedule {
    pub fn section(&self, id: SectionId) -> Option<&CashFlowSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_total(&self, id: SectionId) -> f64 {
        self.section(id).map(|s| s.section_total).unwrap_or(0.0)
    }

    /// Net revenue minus all cost sections, per column
    pub fn net_cash_flow(&self) -> Vec<f64> {
        let mut net = vec![0.0; self.periods.len()];
        for section in &self.sections {
            let sign = if section.id.is_derived() {
                1.0
            } else if section.id.is_cost() {
                -1.0
            } else {
                continue;
            };
            for (n, value) in net.iter_mut().zip(&section.subtotals) {
                *n += sign * value;
            }
        }
        net
    }

    /// Sum of the net cash flow over every column
    pub fn net_total(&self) -> f64 {
        self.net_cash_flow().iter().sum()
    }

    /// Sum of all cost section totals as placed on the period axis
    pub fn scheduled_costs(&self) -> f64 {
        self.sections
            .iter()
            .filter(|s| s.id.is_cost())
            .map(|s| s.section_total)
            .sum()
    }
}
