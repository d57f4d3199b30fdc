//! Category classification for budget line items
//!
//! One canonical table maps structured category tags onto cash flow sections.
//! Free-text labels from upstream records are parsed into these tags once, at
//! the loading boundary, and never re-inspected downstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle activity (stage) a line item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Acquisition,
    PlanningEngineering,
    Development,
    Operations,
    Disposition,
    Financing,
}

/// Keyword sets for parsing free-text stage labels, checked in order.
/// "Civil Engineering" resolves to planning because the first matching row wins.
const ACTIVITY_KEYWORDS: &[(Activity, &[&str])] = &[
    (Activity::Acquisition, &["acquisition"]),
    (Activity::PlanningEngineering, &["planning", "engineering"]),
    (Activity::Development, &["development"]),
    (Activity::Operations, &["soft", "operation"]),
    (Activity::Financing, &["financing"]),
    (Activity::Disposition, &["disposition", "sale"]),
];

impl Activity {
    pub const ALL: [Activity; 6] = [
        Activity::Acquisition,
        Activity::PlanningEngineering,
        Activity::Development,
        Activity::Operations,
        Activity::Disposition,
        Activity::Financing,
    ];

    /// Human-readable stage name
    pub fn display_name(&self) -> &'static str {
        match self {
            Activity::Acquisition => "Acquisition",
            Activity::PlanningEngineering => "Planning & Engineering",
            Activity::Development => "Development",
            Activity::Operations => "Operations",
            Activity::Disposition => "Disposition",
            Activity::Financing => "Financing",
        }
    }

    /// Stable identifier used for grouped row ids
    pub fn key(&self) -> &'static str {
        match self {
            Activity::Acquisition => "acquisition",
            Activity::PlanningEngineering => "planning_engineering",
            Activity::Development => "development",
            Activity::Operations => "operations",
            Activity::Disposition => "disposition",
            Activity::Financing => "financing",
        }
    }

    /// Parse a free-text stage label (case-insensitive, first keyword match)
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.to_lowercase();
        ACTIVITY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(activity, _)| *activity)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Whether a line item is spend, income, or a reduction of income
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    #[default]
    Cost,
    Revenue,
    RevenueDeduction,
}

impl LineKind {
    /// Parse a free-text category label. Anything that is not revenue is a cost.
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if lowered.contains("deduction") {
            LineKind::RevenueDeduction
        } else if lowered.contains("revenue") {
            LineKind::Revenue
        } else {
            LineKind::Cost
        }
    }
}

/// Fixed cash flow sections, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    RevenueGross,
    RevenueDeductions,
    RevenueNet,
    CostAcquisition,
    CostPlanning,
    CostDevelopment,
    CostOperations,
    CostFinancing,
}

impl SectionId {
    pub const ALL: [SectionId; 8] = [
        SectionId::RevenueGross,
        SectionId::RevenueDeductions,
        SectionId::RevenueNet,
        SectionId::CostAcquisition,
        SectionId::CostPlanning,
        SectionId::CostDevelopment,
        SectionId::CostOperations,
        SectionId::CostFinancing,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SectionId::RevenueGross => "revenue-gross",
            SectionId::RevenueDeductions => "revenue-deductions",
            SectionId::RevenueNet => "revenue-net",
            SectionId::CostAcquisition => "cost-acquisition",
            SectionId::CostPlanning => "cost-planning",
            SectionId::CostDevelopment => "cost-development",
            SectionId::CostOperations => "cost-operations",
            SectionId::CostFinancing => "cost-financing",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SectionId::RevenueGross => "Gross Revenue",
            SectionId::RevenueDeductions => "Revenue Deductions",
            SectionId::RevenueNet => "Net Revenue",
            SectionId::CostAcquisition => "Acquisition Costs",
            SectionId::CostPlanning => "Planning & Engineering Costs",
            SectionId::CostDevelopment => "Development Costs",
            SectionId::CostOperations => "Operating Costs",
            SectionId::CostFinancing => "Financing Costs",
        }
    }

    pub fn is_cost(&self) -> bool {
        matches!(
            self,
            SectionId::CostAcquisition
                | SectionId::CostPlanning
                | SectionId::CostDevelopment
                | SectionId::CostOperations
                | SectionId::CostFinancing
        )
    }

    /// Net revenue is computed from the gross and deduction sections, never summed from items
    pub fn is_derived(&self) -> bool {
        matches!(self, SectionId::RevenueNet)
    }
}

/// Map a classified line item onto its section. Every (kind, activity) pair
/// lands in exactly one section.
pub fn section_for(kind: LineKind, activity: Activity) -> SectionId {
    match (kind, activity) {
        (LineKind::Revenue, _) => SectionId::RevenueGross,
        (LineKind::RevenueDeduction, _) => SectionId::RevenueDeductions,
        (LineKind::Cost, Activity::Acquisition) => SectionId::CostAcquisition,
        (LineKind::Cost, Activity::PlanningEngineering) => SectionId::CostPlanning,
        (LineKind::Cost, Activity::Development) => SectionId::CostDevelopment,
        (LineKind::Cost, Activity::Operations) => SectionId::CostOperations,
        (LineKind::Cost, Activity::Financing) => SectionId::CostFinancing,
        // Selling costs at disposition reduce sale proceeds
        (LineKind::Cost, Activity::Disposition) => SectionId::RevenueDeductions,
    }
}

impl FromStr for SectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .iter()
            .find(|section| section.id() == s)
            .copied()
            .ok_or_else(|| format!("unknown section id '{}'", s))
    }
}

/// Category hierarchy of a line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPath {
    /// Lifecycle stage
    pub activity: Activity,

    /// Cost, revenue or revenue deduction
    #[serde(default)]
    pub kind: LineKind,

    /// Category levels below the stage (L1 is the top-level category)
    #[serde(default)]
    pub l1: Option<String>,
    #[serde(default)]
    pub l2: Option<String>,
    #[serde(default)]
    pub l3: Option<String>,
    #[serde(default)]
    pub l4: Option<String>,
}

impl CategoryPath {
    /// A cost category in the given stage
    pub fn cost(activity: Activity) -> Self {
        Self {
            activity,
            kind: LineKind::Cost,
            l1: None,
            l2: None,
            l3: None,
            l4: None,
        }
    }

    /// A gross revenue category
    pub fn revenue(activity: Activity) -> Self {
        Self {
            kind: LineKind::Revenue,
            ..Self::cost(activity)
        }
    }

    /// Set the top-level category label
    pub fn with_l1(mut self, l1: impl Into<String>) -> Self {
        self.l1 = Some(l1.into());
        self
    }

    pub fn section(&self) -> SectionId {
        section_for(self.kind, self.activity)
    }

    /// Label used when grouping by top-level category
    pub fn top_level_label(&self) -> &str {
        self.l1
            .as_deref()
            .unwrap_or_else(|| self.activity.display_name())
    }
}
