//! Projection of budget line items into cash flow schedules, views and metrics

pub mod aggregate;
pub mod builder;
mod cashflows;
mod engine;
pub mod metrics;

pub use aggregate::transform_cash_flow;
pub use builder::{PeriodAxis, ScheduledItem};
pub use cashflows::{
    CashFlowLineItem, CashFlowSchedule, CashFlowSection, CashFlowSummary, CategoryTotal, CostGranularity, PeriodColumn,
    TimeScale,
};
pub use engine::{ProjectionConfig, ProjectionEngine, ZeroDurationPolicy, DEFAULT_DISCOUNT_RATE};
pub use metrics::{EquityFlows, InvestmentMetrics, MetricsCalculator};
