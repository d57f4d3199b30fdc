//! Load budget line items from CSV or JSON exports

use super::category::{Activity, CategoryPath, LineKind};
use super::item::{BudgetLineItem, Container, CpmFields, CurveProfile, EscalationMethod, ItemTiming, TimingMethod};
use crate::error::{BudgetError, BudgetResult};
use chrono::NaiveDate;
use csv::Reader;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw CSV row for one line item. Columns are matched by header name.
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    project_start: Option<String>,
    id: String,
    #[serde(default)]
    description: Option<String>,
    amount: f64,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    start_period: Option<i32>,
    #[serde(default)]
    duration: Option<i32>,
    #[serde(default)]
    timing_method: Option<String>,
    #[serde(default)]
    curve_profile: Option<String>,
    #[serde(default)]
    curve_steepness: Option<f64>,
    #[serde(default)]
    escalation_rate: Option<f64>,
    #[serde(default)]
    escalation_method: Option<String>,
    #[serde(default)]
    line_kind: Option<String>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    category_l1: Option<String>,
    #[serde(default)]
    category_l2: Option<String>,
    #[serde(default)]
    category_l3: Option<String>,
    #[serde(default)]
    category_l4: Option<String>,
    #[serde(default)]
    container_id: Option<String>,
    #[serde(default)]
    container_name: Option<String>,
    /// Semicolon-separated line item ids
    #[serde(default)]
    predecessors: Option<String>,
    #[serde(default)]
    successors: Option<String>,
    #[serde(default)]
    is_critical: Option<bool>,
}

/// Treat blank cells as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Split a semicolon-separated id list, skipping blanks
fn id_list(value: Option<String>) -> Vec<String> {
    non_blank(value)
        .map(|list| {
            list.split(';')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_date(value: &str, field: &'static str, item_id: &str) -> BudgetResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| BudgetError::InvalidDate {
        field,
        value: value.to_string(),
        item_id: item_id.to_string(),
    })
}

fn parse_label<T: std::str::FromStr>(
    value: Option<String>,
    field: &'static str,
    item_id: &str,
) -> BudgetResult<Option<T>> {
    match non_blank(value) {
        None => Ok(None),
        Some(label) => label
            .parse::<T>()
            .map(Some)
            .map_err(|_| BudgetError::UnknownLabel {
                field,
                value: label,
                item_id: item_id.to_string(),
            }),
    }
}

impl CsvRow {
    fn timing(&self) -> BudgetResult<ItemTiming> {
        let start = non_blank(self.start_date.clone());
        let end = non_blank(self.end_date.clone());

        match (start, end, self.start_period, self.duration) {
            (Some(start), Some(end), _, _) => Ok(ItemTiming::Dates {
                start: parse_date(&start, "start_date", &self.id)?,
                end: parse_date(&end, "end_date", &self.id)?,
            }),
            (_, _, Some(start_period), Some(duration)) => {
                Ok(ItemTiming::Periods { start_period, duration })
            }
            _ => Err(BudgetError::MissingTiming(self.id.clone())),
        }
    }

    fn category(&self) -> BudgetResult<CategoryPath> {
        let stage = non_blank(self.stage.clone());
        let l1 = non_blank(self.category_l1.clone());

        // Line kind may be explicit, or implied by the stage / L1 text
        let kind = match non_blank(self.line_kind.clone()) {
            Some(label) => LineKind::from_label(&label),
            None => [stage.as_deref(), l1.as_deref()]
                .into_iter()
                .flatten()
                .map(LineKind::from_label)
                .find(|kind| *kind != LineKind::Cost)
                .unwrap_or(LineKind::Cost),
        };

        let activity = [stage.as_deref(), l1.as_deref()]
            .into_iter()
            .flatten()
            .find_map(Activity::from_label);

        let activity = match (activity, kind) {
            (Some(activity), _) => activity,
            // Revenue with no stage text is sale proceeds
            (None, LineKind::Revenue) | (None, LineKind::RevenueDeduction) => Activity::Disposition,
            (None, LineKind::Cost) => {
                return Err(BudgetError::UnknownLabel {
                    field: "stage",
                    value: stage.or(l1).unwrap_or_default(),
                    item_id: self.id.clone(),
                })
            }
        };

        Ok(CategoryPath {
            activity,
            kind,
            l1,
            l2: non_blank(self.category_l2.clone()),
            l3: non_blank(self.category_l3.clone()),
            l4: non_blank(self.category_l4.clone()),
        })
    }

    fn into_item(self) -> BudgetResult<BudgetLineItem> {
        let timing = self.timing()?;
        let category = self.category()?;
        let timing_method: TimingMethod =
            parse_label(self.timing_method.clone(), "timing_method", &self.id)?.unwrap_or_default();
        let curve_profile: Option<CurveProfile> =
            parse_label(self.curve_profile.clone(), "curve_profile", &self.id)?;
        let escalation_method: Option<EscalationMethod> =
            parse_label(self.escalation_method.clone(), "escalation_method", &self.id)?;

        let container = match (non_blank(self.container_id), non_blank(self.container_name)) {
            (Some(id), Some(name)) => Some(Container { id, name }),
            (Some(id), None) => Some(Container { name: id.clone(), id }),
            (None, Some(name)) => Some(Container { id: name.clone(), name }),
            (None, None) => None,
        };

        Ok(BudgetLineItem {
            id: self.id,
            description: non_blank(self.description).unwrap_or_default(),
            amount: self.amount,
            timing,
            timing_method,
            curve_profile,
            curve_steepness: self.curve_steepness,
            escalation_rate: self.escalation_rate,
            escalation_method,
            category,
            container,
            cpm: CpmFields {
                predecessors: id_list(self.predecessors),
                successors: id_list(self.successors),
                is_critical: self.is_critical.unwrap_or(false),
            },
        })
    }
}

/// Load all line items from a CSV file
pub fn load_items<P: AsRef<Path>>(path: P) -> BudgetResult<Vec<BudgetLineItem>> {
    let reader = Reader::from_path(path)?;
    read_items(reader)
}

/// Load line items from any reader (e.g., string buffer, network stream)
pub fn load_items_from_reader<R: std::io::Read>(reader: R) -> BudgetResult<Vec<BudgetLineItem>> {
    read_items(Reader::from_reader(reader))
}

fn read_items<R: std::io::Read>(mut reader: Reader<R>) -> BudgetResult<Vec<BudgetLineItem>> {
    let mut items = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        items.push(row.into_item()?);
    }

    log::debug!("loaded {} line items", items.len());
    Ok(items)
}

/// Load line items from a JSON array in the engine's native shape
pub fn load_items_json<R: std::io::Read>(reader: R) -> BudgetResult<Vec<BudgetLineItem>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load line items from a `.json` or `.csv` file, chosen by extension
pub fn load_items_auto<P: AsRef<Path>>(path: P) -> BudgetResult<Vec<BudgetLineItem>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        load_items_json(std::fs::File::open(path)?)
    } else {
        load_items(path)
    }
}

/// One project's items from a multi-project export
#[derive(Debug, Clone)]
pub struct ProjectBudget {
    pub project_id: String,
    pub project_start: NaiveDate,
    pub items: Vec<BudgetLineItem>,
}

/// Load a multi-project CSV. Every row must carry `project_id` and
/// `project_start`; projects keep the order in which they first appear.
pub fn load_portfolio_from_reader<R: std::io::Read>(reader: R) -> BudgetResult<Vec<ProjectBudget>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut projects: Vec<ProjectBudget> = Vec::new();

    for result in csv_reader.deserialize() {
        let mut row: CsvRow = result?;
        let project_id = non_blank(row.project_id.take()).ok_or_else(|| BudgetError::UnknownLabel {
            field: "project_id",
            value: String::new(),
            item_id: row.id.clone(),
        })?;
        let start_text = non_blank(row.project_start.take()).unwrap_or_default();
        let project_start = parse_date(&start_text, "project_start", &row.id)?;
        let item = row.into_item()?;

        match projects.iter_mut().find(|p| p.project_id == project_id) {
            Some(project) => project.items.push(item),
            None => projects.push(ProjectBudget {
                project_id,
                project_start,
                items: vec![item],
            }),
        }
    }

    Ok(projects)
}

/// Load a multi-project CSV file
pub fn load_portfolio<P: AsRef<Path>>(path: P) -> BudgetResult<Vec<ProjectBudget>> {
    load_portfolio_from_reader(std::fs::File::open(path)?)
}
