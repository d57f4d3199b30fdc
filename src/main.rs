//! Budget Projection CLI
//!
//! Loads budget line items from CSV or JSON and prints a cash flow view

use anyhow::{Context, Result};
use budget_projection::budget::load_items_auto;
use budget_projection::projection::{CashFlowSchedule, CostGranularity, ProjectionConfig, TimeScale};
use budget_projection::ProjectRunner;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Time-phased cash flow projection for a development budget
#[derive(Parser, Debug)]
#[command(name = "budget-projection")]
#[command(version, about, long_about = None)]
struct Args {
    /// Line items file (.csv or .json)
    #[arg(long, value_name = "FILE")]
    items: PathBuf,

    /// Project start date (YYYY-MM-DD); period 1 is this month
    #[arg(long)]
    project_start: NaiveDate,

    /// monthly, quarterly, annual or overall
    #[arg(long, default_value = "monthly")]
    time_scale: TimeScale,

    /// summary, by-stage, by-category or by-phase
    #[arg(long, default_value = "summary")]
    granularity: CostGranularity,

    /// Annual discount rate for NPV (overrides DISCOUNT_RATE)
    #[arg(long)]
    discount_rate: Option<f64>,

    /// Emit the schedule as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn print_schedule(schedule: &CashFlowSchedule) {
    let labels: Vec<&str> = schedule.periods.iter().map(|p| p.label.as_str()).collect();

    print!("{:<36}", "");
    for label in &labels {
        print!(" {:>14}", label);
    }
    println!(" {:>16}", "Total");
    println!("{}", "-".repeat(36 + 15 * labels.len() + 17));

    for section in &schedule.sections {
        println!("{}", section.name);
        for row in &section.line_items {
            print!("  {:<34}", row.name);
            for value in &row.values {
                print!(" {:>14.2}", value);
            }
            println!(" {:>16.2}", row.total);
        }
        print!("  {:<34}", "Subtotal");
        for value in &section.subtotals {
            print!(" {:>14.2}", value);
        }
        println!(" {:>16.2}", section.section_total);
    }

    let net = schedule.net_cash_flow();
    print!("{:<36}", "Net Cash Flow");
    for value in &net {
        print!(" {:>14.2}", value);
    }
    println!(" {:>16.2}", net.iter().sum::<f64>());
}

fn print_summary(schedule: &CashFlowSchedule) {
    let summary = &schedule.summary;
    let percent = |value: Option<f64>| match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    };

    println!("\nSummary:");
    println!("  Gross Revenue:      ${:.2}", summary.gross_revenue);
    println!("  Revenue Deductions: ${:.2}", summary.revenue_deductions);
    println!("  Net Revenue:        ${:.2}", summary.net_revenue);
    for category in &summary.costs_by_category {
        println!("    {:<30} ${:.2}", category.name, category.total);
    }
    println!("  Total Costs:        ${:.2}", summary.total_costs);
    println!("  Gross Profit:       ${:.2}", summary.gross_profit);
    println!("  Gross Margin:       {}", percent(summary.gross_margin));
    println!("  IRR:                {}", percent(summary.irr));
    println!("  NPV:                ${:.2}", summary.npv);
    match summary.equity_multiple {
        Some(multiple) => println!("  Equity Multiple:    {:.2}x", multiple),
        None => println!("  Equity Multiple:    n/a"),
    }
    println!("  Peak Equity:        ${:.2}", summary.peak_equity);
    match summary.payback_period {
        Some(index) => println!("  Payback:            month {}", index + 1),
        None => println!("  Payback:            never"),
    }
    if !summary.unscheduled_items.is_empty() {
        println!("  Unscheduled items:  {}", summary.unscheduled_items.join(", "));
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let items = load_items_auto(&args.items)
        .with_context(|| format!("failed to load line items from {}", args.items.display()))?;
    log::info!("loaded {} line items from {}", items.len(), args.items.display());

    let mut config = ProjectionConfig::from_env();
    if let Some(rate) = args.discount_rate {
        config.discount_rate = rate;
    }

    let mut runner = ProjectRunner::new(items, args.project_start, config);
    let view = runner.view(args.time_scale, args.granularity);

    if args.json {
        let json = serde_json::to_string_pretty(view).context("failed to serialize schedule")?;
        println!("{}", json);
    } else {
        print_schedule(view);
        print_summary(view);
    }

    Ok(())
}
