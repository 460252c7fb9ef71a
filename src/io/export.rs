//! Export the run's data products.
//!
//! - JSON document with every product plus per-branch status
//! - long-form money table CSV (`month,variation,type`)
//! - wide inflation table CSV (`month,general,core,seasonal,regulated`)
//!
//! Failed branches export as empty tables; their error is in `branches`.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::app::pipeline::PipelineOutput;
use crate::domain::{CompositeRow, InflationRow, ScalarIndicator};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub tool: &'static str,
    pub as_of: NaiveDate,
    pub money: &'a [CompositeRow],
    pub inflation: &'a [InflationRow],
    pub indicators: Vec<ExportIndicator>,
    pub branches: Vec<ExportBranch>,
}

#[derive(Debug, Serialize)]
pub struct ExportIndicator {
    pub name: &'static str,
    pub value: Option<f64>,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&ScalarIndicator> for ExportIndicator {
    fn from(ind: &ScalarIndicator) -> Self {
        Self {
            name: ind.kind.key(),
            value: ind.numeric(),
            display: ind.display(),
            reason: ind.reason().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportBranch {
    pub name: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn export_document(output: &PipelineOutput) -> ExportDocument<'_> {
    ExportDocument {
        tool: "pulse",
        as_of: output.as_of,
        money: output.money.as_ref().map(|m| m.rows.as_slice()).unwrap_or(&[]),
        inflation: output.inflation.as_ref().map(|t| t.rows.as_slice()).unwrap_or(&[]),
        indicators: output.indicators.all().into_iter().map(ExportIndicator::from).collect(),
        branches: output
            .branch_status()
            .into_iter()
            .map(|s| ExportBranch {
                name: s.branch.display_name(),
                ok: s.is_ok(),
                error: s.error,
            })
            .collect(),
    }
}

pub fn write_json(path: &Path, output: &PipelineOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON export '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &export_document(output))
        .map_err(|e| AppError::new(2, format!("Failed to write JSON export: {e}")))?;
    Ok(())
}

pub fn write_money_csv(path: &Path, output: &PipelineOutput) -> Result<(), AppError> {
    let rows = output.money.as_ref().map(|m| m.rows.as_slice()).unwrap_or(&[]);
    write_csv(path, &["month", "variation", "type"], rows)
}

pub fn write_inflation_csv(path: &Path, output: &PipelineOutput) -> Result<(), AppError> {
    let rows = output.inflation.as_ref().map(|t| t.rows.as_slice()).unwrap_or(&[]);
    write_csv(path, &["month", "general", "core", "seasonal", "regulated"], rows)
}

fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    // Written explicitly so an empty table still has its header.
    writer
        .write_record(header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
