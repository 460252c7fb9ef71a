//! Command-line parsing for the `pulse` binary.
//!
//! Argument parsing and command dispatch are kept apart from the pipeline; the
//! pipeline only ever sees a `PipelineConfig` and a date.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::Aggregation;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pulse", version, about = "Argentina macro monitor (BCRA, ROFEX, INDEC)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pull every source and print indicators, money and inflation tables.
    Report(ReportArgs),
    /// Pull every source and write the data products to files.
    Export(ExportArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Run as of this date (YYYY-MM-DD) instead of today.
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Monthly aggregation for base money, deposits and M2.
    #[arg(long, value_enum)]
    pub aggregation: Option<Aggregation>,

    /// PEM certificate pinned for the BCRA API.
    #[arg(long, value_name = "PEM")]
    pub cert: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Months of history to print per table.
    #[arg(long, default_value_t = 6)]
    pub rows: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// JSON document with every data product and branch status.
    #[arg(long, value_name = "JSON")]
    pub json: PathBuf,

    /// Long-form money table (month, variation, type).
    #[arg(long = "money-csv", value_name = "CSV")]
    pub money_csv: Option<PathBuf>,

    /// Wide inflation table (month, general, core, seasonal, regulated).
    #[arg(long = "inflation-csv", value_name = "CSV")]
    pub inflation_csv: Option<PathBuf>,
}
