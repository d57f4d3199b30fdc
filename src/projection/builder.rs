//! Assembly of scheduled line items into the fixed cash flow sections

use chrono::NaiveDate;

use super::cashflows::{
    CashFlowLineItem, CashFlowSchedule, CashFlowSection, CashFlowSummary, CategoryTotal, PeriodColumn, TimeScale,
};
use super::metrics;
use crate::budget::{BudgetLineItem, SectionId};
use crate::timing::{calendar, DistributionPeriod};

/// A line item after escalation and period placement
#[derive(Debug, Clone)]
pub struct ScheduledItem<'a> {
    pub item: &'a BudgetLineItem,

    /// Escalated amount the periods sum to
    pub escalated_total: f64,

    pub periods: Vec<DistributionPeriod>,
}

impl ScheduledItem<'_> {
    /// Whether the item has no place on the period axis
    pub fn is_unscheduled(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn section(&self) -> SectionId {
        self.item.section()
    }
}

/// Contiguous range of project months a schedule covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodAxis {
    pub project_start: NaiveDate,
    pub first_period: i32,
    pub last_period: i32,
}

impl PeriodAxis {
    /// Axis from `first_period` to `last_period` inclusive
    pub fn new(project_start: NaiveDate, first_period: i32, last_period: i32) -> Self {
        Self {
            project_start,
            first_period,
            last_period: last_period.max(first_period),
        }
    }

    /// Smallest axis that starts no later than period 1 and covers every scheduled period
    pub fn spanning(project_start: NaiveDate, items: &[ScheduledItem<'_>]) -> Self {
        let numbers = items.iter().flat_map(|s| s.periods.iter().map(|p| p.period_number));
        let (first, last) = numbers.fold((1, 1), |(lo, hi), n| (lo.min(n), hi.max(n)));
        Self::new(project_start, first, last)
    }

    pub fn len(&self) -> usize {
        (self.last_period - self.first_period + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column index of a project period, if it is on the axis
    pub fn index_of(&self, period_number: i32) -> Option<usize> {
        if period_number < self.first_period || period_number > self.last_period {
            None
        } else {
            Some((period_number - self.first_period) as usize)
        }
    }

    pub fn columns(&self) -> Vec<PeriodColumn> {
        (self.first_period..=self.last_period)
            .map(|n| PeriodColumn::month(n, calendar::period_label(self.project_start, n)))
            .collect()
    }
}

/// Grid row for one scheduled item
fn line_item_row(scheduled: &ScheduledItem<'_>, axis: &PeriodAxis) -> CashFlowLineItem {
    let item = scheduled.item;
    let mut values = vec![0.0; axis.len()];

    for period in &scheduled.periods {
        match axis.index_of(period.period_number) {
            Some(index) => values[index] += period.amount,
            None => log::warn!(
                "period {} of line item {} is outside the schedule axis",
                period.period_number,
                item.id
            ),
        }
    }

    let name = if item.description.is_empty() {
        item.id.clone()
    } else {
        item.description.clone()
    };

    let mut row = CashFlowLineItem {
        id: item.id.clone(),
        name,
        activity: Some(item.category.activity),
        category: Some(item.category.top_level_label().to_string()),
        container: item.container.clone(),
        values,
        total: 0.0,
        child_items: Vec::new(),
    };
    row.refresh_total();
    row
}

/// Build the fixed sections. Items keep their input order within a section.
pub fn build_sections(items: &[ScheduledItem<'_>], axis: &PeriodAxis) -> Vec<CashFlowSection> {
    let columns = axis.len();

    let mut sections: Vec<CashFlowSection> = SectionId::ALL
        .iter()
        .filter(|id| !id.is_derived())
        .map(|&id| {
            let rows = items
                .iter()
                .filter(|s| s.section() == id)
                .map(|s| line_item_row(s, axis))
                .collect();
            CashFlowSection::from_rows(id, rows, columns)
        })
        .collect();

    let net_revenue = derive_net_revenue(&sections, columns);
    let position = SectionId::ALL
        .iter()
        .position(|id| id.is_derived())
        .unwrap_or(sections.len());
    sections.insert(position, net_revenue);

    sections
}

/// Net revenue section: gross revenue minus deductions, with no rows of its own
pub fn derive_net_revenue(sections: &[CashFlowSection], columns: usize) -> CashFlowSection {
    let empty = vec![0.0; columns];
    let subtotals_of = |id: SectionId| {
        sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.subtotals.as_slice())
            .unwrap_or(empty.as_slice())
    };

    let gross = subtotals_of(SectionId::RevenueGross);
    let deductions = subtotals_of(SectionId::RevenueDeductions);
    let subtotals = gross.iter().zip(deductions).map(|(g, d)| g - d).collect();

    CashFlowSection::with_subtotals(SectionId::RevenueNet, Vec::new(), subtotals)
}

/// Whole-schedule totals from the items' escalated amounts.
///
/// These include unscheduled items, so they reconcile with the section
/// totals only when every item was placed on the axis.
pub fn summary_totals(items: &[ScheduledItem<'_>]) -> CashFlowSummary {
    let total_in = |id: SectionId| -> f64 {
        items
            .iter()
            .filter(|s| s.section() == id)
            .map(|s| s.escalated_total)
            .sum()
    };

    let gross_revenue = total_in(SectionId::RevenueGross);
    let revenue_deductions = total_in(SectionId::RevenueDeductions);
    let net_revenue = gross_revenue - revenue_deductions;

    let costs_by_category: Vec<CategoryTotal> = SectionId::ALL
        .iter()
        .filter(|id| id.is_cost())
        .map(|&section| CategoryTotal {
            section,
            name: section.name().to_string(),
            total: total_in(section),
        })
        .collect();
    let total_costs: f64 = costs_by_category.iter().map(|c| c.total).sum();
    let gross_profit = net_revenue - total_costs;

    CashFlowSummary {
        gross_revenue,
        revenue_deductions,
        net_revenue,
        total_costs,
        costs_by_category,
        gross_profit,
        gross_margin: metrics::gross_margin(gross_profit, gross_revenue),
        unscheduled_items: items
            .iter()
            .filter(|s| s.is_unscheduled())
            .map(|s| s.item.id.clone())
            .collect(),
        ..Default::default()
    }
}

/// Build the item-level monthly schedule. Investment metrics are left unset.
pub fn build(items: &[ScheduledItem<'_>], axis: &PeriodAxis) -> CashFlowSchedule {
    let mut schedule = CashFlowSchedule {
        project_start: axis.project_start,
        time_scale: TimeScale::Monthly,
        cost_granularity: None,
        periods: axis.columns(),
        sections: build_sections(items, axis),
        summary: summary_totals(items),
    };
    schedule.summary.net_cash_flow = schedule.net_cash_flow();
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{Activity, CategoryPath, ItemTiming, LineKind};
    use approx::assert_relative_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(id: &str, amount: f64, category: CategoryPath) -> BudgetLineItem {
        BudgetLineItem::new(
            id,
            id,
            amount,
            ItemTiming::Periods { start_period: 1, duration: 1 },
            category,
        )
    }

    fn period(number: i32, amount: f64) -> DistributionPeriod {
        DistributionPeriod {
            label: String::new(),
            period_number: number,
            amount,
            percent: 0.0,
        }
    }

    #[test]
    fn test_axis_spans_items() {
        let land = item("land", 100.0, CategoryPath::cost(Activity::Acquisition));
        let scheduled = vec![ScheduledItem {
            item: &land,
            escalated_total: 100.0,
            periods: vec![period(0, 50.0), period(5, 50.0)],
        }];

        let axis = PeriodAxis::spanning(ymd(2025, 1, 1), &scheduled);
        assert_eq!(axis.first_period, 0);
        assert_eq!(axis.last_period, 5);
        assert_eq!(axis.len(), 6);
        assert_eq!(axis.index_of(3), Some(3));
        assert_eq!(axis.index_of(6), None);
        assert_eq!(axis.columns()[0].label, "Dec 2024");
    }

    #[test]
    fn test_sections_sum_items_and_derive_net() {
        let land = item("land", 300.0, CategoryPath::cost(Activity::Acquisition));
        let sales = item("sales", 1000.0, CategoryPath::revenue(Activity::Disposition));
        let commission = BudgetLineItem {
            category: CategoryPath {
                kind: LineKind::RevenueDeduction,
                ..CategoryPath::cost(Activity::Disposition)
            },
            ..item("commission", 60.0, CategoryPath::cost(Activity::Disposition))
        };
        let build_costs = item("vertical", 400.0, CategoryPath::cost(Activity::Development));

        let scheduled = vec![
            ScheduledItem { item: &land, escalated_total: 300.0, periods: vec![period(1, 300.0)] },
            ScheduledItem { item: &build_costs, escalated_total: 400.0, periods: vec![period(2, 200.0), period(3, 200.0)] },
            ScheduledItem { item: &sales, escalated_total: 1000.0, periods: vec![period(3, 500.0), period(4, 500.0)] },
            ScheduledItem { item: &commission, escalated_total: 60.0, periods: vec![period(3, 30.0), period(4, 30.0)] },
        ];
        let axis = PeriodAxis::spanning(ymd(2025, 1, 1), &scheduled);
        let schedule = build(&scheduled, &axis);

        let ids: Vec<SectionId> = schedule.sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, SectionId::ALL.to_vec());

        let net_revenue = schedule.section(SectionId::RevenueNet).unwrap();
        assert!(net_revenue.line_items.is_empty());
        assert_eq!(net_revenue.subtotals, vec![0.0, 0.0, 470.0, 470.0]);

        assert_eq!(schedule.summary.net_cash_flow, vec![-300.0, -200.0, 270.0, 470.0]);
        assert_relative_eq!(schedule.summary.gross_profit, 1000.0 - 60.0 - 700.0);
        assert_relative_eq!(schedule.summary.gross_margin.unwrap(), 240.0 / 1000.0);
        assert_relative_eq!(schedule.summary.total_costs, 700.0);
        assert!(schedule.summary.unscheduled_items.is_empty());
    }

    #[test]
    fn test_every_item_lands_in_exactly_one_section() {
        let items: Vec<BudgetLineItem> = Activity::ALL
            .iter()
            .enumerate()
            .map(|(i, &activity)| item(&format!("c{}", i), 10.0, CategoryPath::cost(activity)))
            .chain(std::iter::once(item("rev", 10.0, CategoryPath::revenue(Activity::Operations))))
            .collect();
        let scheduled: Vec<ScheduledItem> = items
            .iter()
            .map(|it| ScheduledItem { item: it, escalated_total: 10.0, periods: vec![period(1, 10.0)] })
            .collect();

        let axis = PeriodAxis::spanning(ymd(2025, 1, 1), &scheduled);
        let sections = build_sections(&scheduled, &axis);

        for it in &items {
            let hits = sections
                .iter()
                .filter(|s| s.line_items.iter().any(|row| row.id == it.id))
                .count();
            assert_eq!(hits, 1, "item {} should appear in exactly one section", it.id);
        }
    }

    #[test]
    fn test_unscheduled_item_counts_in_summary_only() {
        let land = item("land", 300.0, CategoryPath::cost(Activity::Acquisition));
        let fees = item("fees", 50.0, CategoryPath::cost(Activity::Acquisition));
        let scheduled = vec![
            ScheduledItem { item: &land, escalated_total: 300.0, periods: vec![period(1, 300.0)] },
            ScheduledItem { item: &fees, escalated_total: 50.0, periods: Vec::new() },
        ];
        let axis = PeriodAxis::spanning(ymd(2025, 1, 1), &scheduled);
        let schedule = build(&scheduled, &axis);

        assert_relative_eq!(schedule.section_total(SectionId::CostAcquisition), 300.0);
        assert_relative_eq!(schedule.summary.total_costs, 350.0);
        assert_eq!(schedule.summary.unscheduled_items, vec!["fees".to_string()]);
    }
}
