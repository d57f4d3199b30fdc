//! Core projection engine: line items to a monthly cash flow schedule and its views

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use super::aggregate::transform_cash_flow;
use super::builder::{self, PeriodAxis, ScheduledItem};
use super::cashflows::{CashFlowSchedule, CostGranularity, TimeScale};
use super::metrics::MetricsCalculator;
use crate::budget::BudgetLineItem;
use crate::timing::{distribution_params, escalated_amount, scheduler};

/// Annual discount rate used for NPV when none is configured
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.10;

/// Treatment of items whose end month falls before their start month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDurationPolicy {
    /// No periods; the item counts in the summary totals and is listed as unscheduled
    #[default]
    Drop,
    /// The whole amount lands in the start month
    SinglePeriod,
}

impl FromStr for ZeroDurationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "drop" => Ok(ZeroDurationPolicy::Drop),
            "single_period" | "single" => Ok(ZeroDurationPolicy::SinglePeriod),
            other => Err(format!("unknown zero-duration policy '{}'", other)),
        }
    }
}

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Annual discount rate for NPV (decimal)
    pub discount_rate: f64,

    pub zero_duration: ZeroDurationPolicy,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            zero_duration: ZeroDurationPolicy::Drop,
        }
    }
}

impl ProjectionConfig {
    /// Read `DISCOUNT_RATE` and `ZERO_DURATION_POLICY`, falling back to defaults
    pub fn from_env() -> Self {
        let discount_rate = env::var("DISCOUNT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DISCOUNT_RATE);

        let zero_duration = match env::var("ZERO_DURATION_POLICY") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                log::warn!("{}; using drop", e);
                ZeroDurationPolicy::Drop
            }),
            Err(_) => ZeroDurationPolicy::Drop,
        };

        Self {
            discount_rate,
            zero_duration,
        }
    }
}

/// Main projection engine
#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Escalate one item and place it on the project axis
    pub fn schedule_item<'a>(&self, item: &'a BudgetLineItem, project_start: NaiveDate) -> ScheduledItem<'a> {
        let escalated_total = escalated_amount(item, project_start);
        let (start, end) = item.date_range(project_start);
        let months = scheduler::duration_months(start, end);

        let periods = if months > 0 {
            scheduler::schedule(escalated_total, start, end, &distribution_params(item), project_start)
        } else {
            log::warn!(
                "line item {} has no duration ({} to {}); zero-duration policy {:?}",
                item.id,
                start,
                end,
                self.config.zero_duration
            );
            match self.config.zero_duration {
                ZeroDurationPolicy::Drop => Vec::new(),
                ZeroDurationPolicy::SinglePeriod => scheduler::single_period(escalated_total, start, project_start),
            }
        };

        log::debug!(
            "scheduled {} over {} periods: {:.2} escalated from {:.2}",
            item.id,
            periods.len(),
            escalated_total,
            item.amount
        );

        ScheduledItem {
            item,
            escalated_total,
            periods,
        }
    }

    pub fn schedule_items<'a>(&self, items: &'a [BudgetLineItem], project_start: NaiveDate) -> Vec<ScheduledItem<'a>> {
        items.iter().map(|item| self.schedule_item(item, project_start)).collect()
    }

    /// Item-level monthly schedule with investment metrics filled in
    pub fn build_schedule(&self, items: &[BudgetLineItem], project_start: NaiveDate) -> CashFlowSchedule {
        let scheduled = self.schedule_items(items, project_start);
        let axis = PeriodAxis::spanning(project_start, &scheduled);
        let mut schedule = builder::build(&scheduled, &axis);

        let metrics = MetricsCalculator::new(self.config.discount_rate).calculate(&schedule.summary.net_cash_flow, None);
        let summary = &mut schedule.summary;
        summary.irr = metrics.irr;
        summary.npv = metrics.npv;
        summary.equity_multiple = metrics.equity_multiple;
        summary.peak_equity = metrics.peak_equity;
        summary.payback_period = metrics.payback_period;

        schedule
    }

    /// Schedule `items` and aggregate into the requested view
    pub fn project(
        &self,
        items: &[BudgetLineItem],
        project_start: NaiveDate,
        time_scale: TimeScale,
        granularity: CostGranularity,
    ) -> CashFlowSchedule {
        let base = self.build_schedule(items, project_start);
        transform_cash_flow(&base, time_scale, granularity)
    }
}
