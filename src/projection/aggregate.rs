//! Re-aggregation of a cash flow schedule into coarser periods and row groupings
//!
//! Time buckets are counted from the first month on the source axis, so the
//! last bucket may be partial. Row groups are always formed from leaf rows in
//! first-appearance order, which lets any view be regrouped into any other.

use std::collections::HashMap;

use super::cashflows::{CashFlowLineItem, CashFlowSchedule, CashFlowSection, CostGranularity, PeriodColumn, TimeScale};

/// Source column indices that make up one output column
type Bucket = Vec<usize>;

/// Group source columns into output buckets, in chronological order
fn bucket_columns(periods: &[PeriodColumn], time_scale: TimeScale) -> Vec<Bucket> {
    let anchor = match periods.first() {
        Some(first) => first.first_month,
        None => return Vec::new(),
    };

    let mut buckets: Vec<(i32, Bucket)> = Vec::new();
    for (index, column) in periods.iter().enumerate() {
        let key = match time_scale.months_per_period() {
            Some(size) => (column.first_month - anchor).div_euclid(size),
            None => 0,
        };
        match buckets.last_mut() {
            Some((last_key, members)) if *last_key == key => members.push(index),
            _ => buckets.push((key, vec![index])),
        }
    }

    buckets.into_iter().map(|(_, members)| members).collect()
}

/// Output column for a bucket
fn bucket_column(periods: &[PeriodColumn], members: &[usize], position: usize, time_scale: TimeScale) -> PeriodColumn {
    let first = &periods[members[0]];
    let last = &periods[members[members.len() - 1]];

    // A source column already at least as coarse as the target is kept as is
    if let (&[_], Some(size)) = (members, time_scale.months_per_period()) {
        if first.month_count() >= size {
            return first.clone();
        }
    }

    let number = position as i32 + 1;
    let label = match time_scale {
        TimeScale::Quarterly => format!("Q{}", number),
        TimeScale::Annual => format!("Year {}", number),
        TimeScale::Overall => "Overall".to_string(),
        TimeScale::Monthly => first.label.clone(),
    };

    PeriodColumn {
        period_number: number,
        label,
        first_month: first.first_month,
        last_month: last.last_month,
        first_label: first.first_label.clone(),
        last_label: last.last_label.clone(),
    }
}

/// Sum `values` per bucket
fn rebucket(values: &[f64], buckets: &[Bucket]) -> Vec<f64> {
    buckets
        .iter()
        .map(|members| members.iter().filter_map(|&i| values.get(i)).sum())
        .collect()
}

/// Keep a shared attribute only while every member agrees on it
fn keep_if_shared<T: PartialEq>(current: &mut Option<T>, other: &Option<T>) {
    if current.as_ref() != other.as_ref() {
        *current = None;
    }
}

/// Fold leaf rows into groups keyed by `key_of` (returning id and display name)
fn group_rows<F>(leaves: Vec<CashFlowLineItem>, nest: bool, key_of: F) -> Vec<CashFlowLineItem>
where
    F: Fn(&CashFlowLineItem) -> (String, String),
{
    let mut groups: Vec<CashFlowLineItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for leaf in leaves {
        let (id, name) = key_of(&leaf);
        match index.get(&id).copied() {
            Some(position) => {
                let group = &mut groups[position];
                for (value, add) in group.values.iter_mut().zip(&leaf.values) {
                    *value += add;
                }
                keep_if_shared(&mut group.activity, &leaf.activity);
                keep_if_shared(&mut group.category, &leaf.category);
                keep_if_shared(&mut group.container, &leaf.container);
                if nest {
                    group.child_items.push(leaf);
                }
            }
            None => {
                index.insert(id.clone(), groups.len());
                groups.push(CashFlowLineItem {
                    id,
                    name,
                    activity: leaf.activity,
                    category: leaf.category.clone(),
                    container: leaf.container.clone(),
                    values: leaf.values.clone(),
                    total: 0.0,
                    child_items: if nest { vec![leaf] } else { Vec::new() },
                });
            }
        }
    }

    for group in &mut groups {
        group.refresh_total();
    }
    groups
}

/// Rows of one section under the requested grouping
fn regroup(section: &CashFlowSection, subtotals: &[f64], buckets: &[Bucket], granularity: CostGranularity) -> Vec<CashFlowLineItem> {
    let leaves: Vec<CashFlowLineItem> = section
        .leaves()
        .into_iter()
        .map(|leaf| {
            let mut row = CashFlowLineItem {
                values: rebucket(&leaf.values, buckets),
                child_items: Vec::new(),
                ..leaf.clone()
            };
            row.refresh_total();
            row
        })
        .collect();

    if leaves.is_empty() {
        return Vec::new();
    }

    match granularity {
        CostGranularity::Summary => {
            let mut row = CashFlowLineItem {
                id: section.id.id().to_string(),
                name: section.name.clone(),
                activity: None,
                category: None,
                container: None,
                values: subtotals.to_vec(),
                total: 0.0,
                child_items: Vec::new(),
            };
            row.refresh_total();
            vec![row]
        }
        CostGranularity::ByStage => group_rows(leaves, false, |leaf| match leaf.activity {
            Some(activity) => (activity.key().to_string(), activity.display_name().to_string()),
            None => (leaf.id.clone(), leaf.name.clone()),
        }),
        CostGranularity::ByCategory => group_rows(leaves, false, |leaf| match &leaf.category {
            Some(category) => (category.clone(), category.clone()),
            None => (leaf.id.clone(), leaf.name.clone()),
        }),
        CostGranularity::ByPhase => group_rows(leaves, true, |leaf| match &leaf.container {
            Some(container) => (container.id.clone(), container.name.clone()),
            None => ("unassigned".to_string(), "Unassigned".to_string()),
        }),
    }
}

/// Re-aggregate `source` into `time_scale` columns and `granularity` rows.
///
/// Section subtotals and the net cash flow are summed from the source
/// subtotals, so every section total and the net total equal the source's.
pub fn transform_cash_flow(source: &CashFlowSchedule, time_scale: TimeScale, granularity: CostGranularity) -> CashFlowSchedule {
    let buckets = bucket_columns(&source.periods, time_scale);
    let periods: Vec<PeriodColumn> = buckets
        .iter()
        .enumerate()
        .map(|(position, members)| bucket_column(&source.periods, members, position, time_scale))
        .collect();

    let sections = source
        .sections
        .iter()
        .map(|section| {
            let subtotals = rebucket(&section.subtotals, &buckets);
            let rows = regroup(section, &subtotals, &buckets, granularity);
            CashFlowSection::with_subtotals(section.id, rows, subtotals)
        })
        .collect();

    let mut summary = source.summary.clone();
    summary.net_cash_flow = rebucket(&source.net_cash_flow(), &buckets);

    log::debug!(
        "aggregated {} columns into {} {:?} columns grouped {:?}",
        source.periods.len(),
        periods.len(),
        time_scale,
        granularity
    );

    CashFlowSchedule {
        project_start: source.project_start,
        time_scale,
        cost_granularity: Some(granularity),
        periods,
        sections,
        summary,
    }
}
