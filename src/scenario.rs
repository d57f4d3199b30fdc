//! Project runner for repeated views of one budget
//!
//! Schedules the line items once, then serves any (time scale, grouping) view
//! from a cache without rescheduling.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::budget::BudgetLineItem;
use crate::projection::{
    transform_cash_flow, CashFlowSchedule, CashFlowSummary, CostGranularity, ProjectionConfig, ProjectionEngine,
    TimeScale,
};

/// Pre-built project schedule with memoized views
///
/// # Example
/// ```ignore
/// let mut runner = ProjectRunner::new(items, project_start, ProjectionConfig::default());
///
/// for scale in [TimeScale::Quarterly, TimeScale::Annual] {
///     let view = runner.view(scale, CostGranularity::ByPhase);
///     println!("{} columns", view.periods.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProjectRunner {
    engine: ProjectionEngine,
    project_start: NaiveDate,
    items: Vec<BudgetLineItem>,

    /// Item-level monthly schedule
    base: CashFlowSchedule,

    views: HashMap<(TimeScale, CostGranularity), CashFlowSchedule>,
}

impl ProjectRunner {
    pub fn new(items: Vec<BudgetLineItem>, project_start: NaiveDate, config: ProjectionConfig) -> Self {
        let engine = ProjectionEngine::new(config);
        let base = engine.build_schedule(&items, project_start);
        Self {
            engine,
            project_start,
            items,
            base,
            views: HashMap::new(),
        }
    }

    /// Item-level monthly schedule
    pub fn base(&self) -> &CashFlowSchedule {
        &self.base
    }

    pub fn summary(&self) -> &CashFlowSummary {
        &self.base.summary
    }

    pub fn items(&self) -> &[BudgetLineItem] {
        &self.items
    }

    /// Aggregated view, built on first request
    pub fn view(&mut self, time_scale: TimeScale, granularity: CostGranularity) -> &CashFlowSchedule {
        let base = &self.base;
        self.views.entry((time_scale, granularity)).or_insert_with(|| {
            log::debug!("building {:?}/{:?} view", time_scale, granularity);
            transform_cash_flow(base, time_scale, granularity)
        })
    }

    /// Number of views currently cached
    pub fn cached_views(&self) -> usize {
        self.views.len()
    }

    /// Replace the line items, rescheduling and discarding cached views
    pub fn update(&mut self, items: Vec<BudgetLineItem>) {
        self.base = self.engine.build_schedule(&items, self.project_start);
        self.items = items;
        self.views.clear();
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

    fn items(amount: f64) -> Vec<BudgetLineItem> {
        vec![
            BudgetLineItem::new(
                "build",
                "Build",
                amount,
                ItemTiming::Periods { start_period: 1, duration: 12 },
                CategoryPath::cost(Activity::Development),
            ),
            BudgetLineItem::new(
                "sales",
                "Sales",
                amount * 1.4,
                ItemTiming::Periods { start_period: 10, duration: 9 },
                CategoryPath::revenue(Activity::Disposition),
            ),
        ]
    }

    #[test]
    fn test_views_are_cached() {
        let mut runner = ProjectRunner::new(items(1200.0), ymd(2025, 1, 1), ProjectionConfig::default());

        let first = runner.view(TimeScale::Quarterly, CostGranularity::ByStage).clone();
        let second = runner.view(TimeScale::Quarterly, CostGranularity::ByStage).clone();
        assert_eq!(first, second);
        assert_eq!(runner.cached_views(), 1);

        runner.view(TimeScale::Annual, CostGranularity::Summary);
        assert_eq!(runner.cached_views(), 2);
    }

    #[test]
    fn test_update_reschedules() {
        let mut runner = ProjectRunner::new(items(1200.0), ymd(2025, 1, 1), ProjectionConfig::default());
        runner.view(TimeScale::Overall, CostGranularity::Summary);

        runner.update(items(2400.0));
        assert_eq!(runner.cached_views(), 0);
        assert_relative_eq!(runner.summary().total_costs, 2400.0);

        let overall = runner.view(TimeScale::Overall, CostGranularity::Summary);
        assert_relative_eq!(overall.summary.net_cash_flow[0], 2400.0 * 0.4, max_relative = 1e-9);
    }

    #[test]
    fn test_views_agree_with_base_total() {
        let mut runner = ProjectRunner::new(items(1200.0), ymd(2025, 1, 1), ProjectionConfig::default());
        let base_total = runner.base().net_total();

        for scale in [TimeScale::Monthly, TimeScale::Quarterly, TimeScale::Annual, TimeScale::Overall] {
            let view = runner.view(scale, CostGranularity::ByCategory);
            assert_relative_eq!(view.net_total(), base_total, max_relative = 1e-9);
        }
    }
}
