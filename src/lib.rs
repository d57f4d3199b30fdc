//! Budget Projection - time-phased cash flow engine for real-estate development budgets
//!
//! This library provides:
//! - Budget line item model with structured category classification
//! - S-curve and even distribution of amounts across months
//! - Escalation of nominal amounts for cost and price growth
//! - Sectioned cash flow schedules with quarterly, annual and grouped views
//! - Investment metrics (IRR, NPV, equity multiple, payback, peak equity)

pub mod budget;
pub mod error;
pub mod projection;
pub mod scenario;
pub mod timing;

// Re-export commonly used types
pub use budget::{Activity, BudgetLineItem, CategoryPath, LineKind, SectionId};
pub use error::{BudgetError, BudgetResult};
pub use projection::{
    transform_cash_flow, CashFlowSchedule, CashFlowSummary, CostGranularity, ProjectionConfig, ProjectionEngine,
    TimeScale,
};
pub use scenario::ProjectRunner;
