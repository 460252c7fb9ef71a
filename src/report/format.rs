//! Formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns and output changes are localized.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::app::pipeline::{BranchStatus, PipelineOutput};
use crate::domain::{CpiComponent, IndicatorSet, InflationTable, MoneyAggregates, MoneyKind};

/// Full run summary: indicators, latest money and inflation rows, branch status.
pub fn format_run_summary(output: &PipelineOutput, rows: usize) -> String {
    let mut out = String::new();

    out.push_str("=== pulse - Argentina macro monitor ===\n");
    out.push_str(&format!("As-of: {}\n\n", output.as_of));

    out.push_str("Indicators:\n");
    out.push_str(&format_indicators(&output.indicators));
    out.push('\n');

    out.push_str(&format!("Money aggregates (monthly variation, last {rows} months):\n"));
    match &output.money {
        Ok(money) => out.push_str(&format_money(money, rows)),
        Err(e) => out.push_str(&format!("  unavailable: {e}\n")),
    }
    out.push('\n');

    out.push_str(&format!("Inflation (monthly variation, last {rows} months):\n"));
    match &output.inflation {
        Ok(table) => out.push_str(&format_inflation(table, rows)),
        Err(e) => out.push_str(&format!("  unavailable: {e}\n")),
    }
    out.push('\n');

    out.push_str("Branches:\n");
    out.push_str(&format_branch_status(&output.branch_status()));

    out
}

pub fn format_indicators(indicators: &IndicatorSet) -> String {
    let mut out = String::new();
    for ind in indicators.all() {
        out.push_str(&format!("  {:<28} {:>10}\n", ind.kind.display_name(), ind.display()));
    }
    out
}

/// Money table pivoted to one line per month, most recent `rows` months.
pub fn format_money(money: &MoneyAggregates, rows: usize) -> String {
    let mut by_month: BTreeMap<NaiveDate, [Option<f64>; 3]> = BTreeMap::new();
    for row in &money.rows {
        let slot = MoneyKind::ALL.iter().position(|k| *k == row.kind).unwrap_or(0);
        by_month.entry(row.month).or_default()[slot] = Some(row.variation);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:>12} {:>14} {:>10}\n",
        "month",
        MoneyKind::BaseMoney.label(),
        MoneyKind::BankDeposits.label(),
        MoneyKind::M2.label()
    ));
    out.push_str(&format!("{:-<12} {:-<12} {:-<14} {:-<10}\n", "", "", "", ""));

    let skip = by_month.len().saturating_sub(rows);
    for (month, values) in by_month.iter().skip(skip) {
        out.push_str(&format!(
            "{:<12} {:>12} {:>14} {:>10}\n",
            month.to_string(),
            fmt_fraction(values[0]),
            fmt_fraction(values[1]),
            fmt_fraction(values[2]),
        ));
    }
    out
}

pub fn format_inflation(table: &InflationTable, rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12}", "month"));
    for c in CpiComponent::ALL {
        out.push_str(&format!(" {:>10}", c.display_name()));
    }
    out.push('\n');
    out.push_str(&format!("{:-<12}", ""));
    for _ in CpiComponent::ALL {
        out.push_str(&format!(" {:-<10}", ""));
    }
    out.push('\n');

    let skip = table.rows.len().saturating_sub(rows);
    for row in table.rows.iter().skip(skip) {
        out.push_str(&format!("{:<12}", row.month.to_string()));
        for c in CpiComponent::ALL {
            out.push_str(&format!(" {:>10}", fmt_fraction(Some(row.get(c)))));
        }
        out.push('\n');
    }
    out
}

pub fn format_branch_status(status: &[BranchStatus]) -> String {
    let mut out = String::new();
    for s in status {
        match &s.error {
            None => out.push_str(&format!("  [ok]     {}\n", s.branch.display_name())),
            Some(e) => out.push_str(&format!("  [failed] {}: {e}\n", s.branch.display_name())),
        }
    }
    out
}

/// Fraction as a percentage with two decimals (`0.0371` -> `3.71%`).
fn fmt_fraction(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "-".to_string(),
    }
}
