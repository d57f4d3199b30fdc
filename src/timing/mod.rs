//! Timing of line items: distribution curves, escalation, and period placement

pub mod calendar;
pub mod curve;
pub mod escalation;
pub mod scheduler;

pub use curve::DistributionParams;
pub use escalation::{escalate, escalated_amount, Escalation};
pub use scheduler::{distribution_params, schedule, DistributionPeriod};
