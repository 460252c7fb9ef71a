//! Cross-series joins and the long-form money table.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{
    Aggregation, CompositeRow, MoneyAggregates, MoneyKind, MonthlySeries, Observation, Series,
};
use crate::error::PipelineError;
use crate::transform::resample_monthly;

/// Inner join on exact date, summing values.
///
/// Only dates present in both series survive. An empty intersection is an
/// alignment error rather than an empty series.
pub fn inner_join_sum(a: &Series, b: &Series, name: &str) -> Result<Series, PipelineError> {
    let rhs: HashMap<NaiveDate, f64> = b
        .observations()
        .iter()
        .map(|o| (o.date, o.value))
        .collect();

    let joined: Vec<Observation> = a
        .observations()
        .iter()
        .filter_map(|o| rhs.get(&o.date).map(|v| Observation::new(o.date, o.value + v)))
        .collect();

    if joined.is_empty() {
        return Err(PipelineError::DataAlignment(format!(
            "no overlapping dates between '{}' ({} obs) and '{}' ({} obs)",
            a.name,
            a.len(),
            b.name,
            b.len()
        )));
    }
    Ok(Series::new(name, joined))
}

/// Build the money-aggregate table from raw base money and bank deposits.
///
/// M2 is summed on the raw daily observations and only then resampled, so it
/// goes through exactly one monthly aggregation like its components. The same
/// `aggregation` is applied to all three series.
pub fn combine(
    base_money: &Series,
    deposits: &Series,
    aggregation: Aggregation,
) -> Result<MoneyAggregates, PipelineError> {
    let m2_raw = inner_join_sum(base_money, deposits, MoneyKind::M2.label())?;

    let monthly_base = resample_monthly(base_money, aggregation);
    let monthly_deposits = resample_monthly(deposits, aggregation);
    let monthly_m2 = resample_monthly(&m2_raw, aggregation);

    let mut rows = Vec::with_capacity(
        monthly_base.points.len() + monthly_deposits.points.len() + monthly_m2.points.len(),
    );
    rows.extend(tag(&monthly_base, MoneyKind::BaseMoney));
    rows.extend(tag(&monthly_deposits, MoneyKind::BankDeposits));
    rows.extend(tag(&monthly_m2, MoneyKind::M2));

    Ok(MoneyAggregates {
        rows,
        m2: monthly_m2,
    })
}

fn tag(series: &MonthlySeries, kind: MoneyKind) -> impl Iterator<Item = CompositeRow> + '_ {
    series.points.iter().map(move |p| CompositeRow {
        month: p.month,
        variation: p.variation,
        kind,
    })
}
