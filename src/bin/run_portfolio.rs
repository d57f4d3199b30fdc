//! Run projections for every project in a portfolio export
//!
//! Reads a multi-project CSV (PORTFOLIO_PATH, default portfolio_items.csv),
//! projects each project in parallel and writes portfolio_summary.csv

use anyhow::{Context, Result};
use budget_projection::budget::{load_portfolio, ProjectBudget};
use budget_projection::projection::{CashFlowSummary, ProjectionConfig, ProjectionEngine};
use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::time::Instant;

/// One output row per project
#[derive(Debug, Clone, Serialize)]
struct PortfolioRow {
    project_id: String,
    project_start: String,
    line_items: usize,
    periods: usize,
    gross_revenue: f64,
    net_revenue: f64,
    total_costs: f64,
    gross_profit: f64,
    gross_margin: Option<f64>,
    irr: Option<f64>,
    npv: f64,
    equity_multiple: Option<f64>,
    peak_equity: f64,
    payback_period: Option<usize>,
    unscheduled_items: usize,
}

impl PortfolioRow {
    fn new(project: &ProjectBudget, periods: usize, summary: &CashFlowSummary) -> Self {
        Self {
            project_id: project.project_id.clone(),
            project_start: project.project_start.to_string(),
            line_items: project.items.len(),
            periods,
            gross_revenue: summary.gross_revenue,
            net_revenue: summary.net_revenue,
            total_costs: summary.total_costs,
            gross_profit: summary.gross_profit,
            gross_margin: summary.gross_margin,
            irr: summary.irr,
            npv: summary.npv,
            equity_multiple: summary.equity_multiple,
            peak_equity: summary.peak_equity,
            payback_period: summary.payback_period,
            unscheduled_items: summary.unscheduled_items.len(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let input_path = env::var("PORTFOLIO_PATH").unwrap_or_else(|_| "portfolio_items.csv".to_string());
    let output_path = env::var("OUTPUT_PATH").unwrap_or_else(|_| "portfolio_summary.csv".to_string());
    let config = ProjectionConfig::from_env();

    let start = Instant::now();
    let projects = load_portfolio(&input_path).with_context(|| format!("failed to load portfolio from {}", input_path))?;
    log::info!("loaded {} projects from {} in {:?}", projects.len(), input_path, start.elapsed());

    let proj_start = Instant::now();
    let engine = ProjectionEngine::new(config);

    // Projects are independent; run them in parallel
    let rows: Vec<PortfolioRow> = projects
        .par_iter()
        .map(|project| {
            let schedule = engine.build_schedule(&project.items, project.project_start);
            PortfolioRow::new(project, schedule.periods.len(), &schedule.summary)
        })
        .collect();

    log::info!("projections complete in {:?}", proj_start.elapsed());

    let mut writer = csv::Writer::from_path(&output_path).with_context(|| format!("failed to create {}", output_path))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let total_npv: f64 = rows.iter().map(|r| r.npv).sum();
    let total_profit: f64 = rows.iter().map(|r| r.gross_profit).sum();
    let unscheduled: usize = rows.iter().map(|r| r.unscheduled_items).sum();

    println!("Portfolio Summary:");
    println!("  Projects:        {}", rows.len());
    println!("  Gross Profit:    ${:.0}", total_profit);
    println!("  NPV:             ${:.0}", total_npv);
    if unscheduled > 0 {
        println!("  Unscheduled:     {} line items", unscheduled);
    }
    println!("Output written to {}", output_path);

    log::info!("total time: {:?}", start.elapsed());
    Ok(())
}
