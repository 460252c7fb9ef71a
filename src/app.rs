//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves configuration (env + flags)
//! - runs the pipeline
//! - prints the report or writes exports

use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::cli::{Command, ExportArgs, ReportArgs, RunArgs};
use crate::config::PipelineConfig;
use crate::error::AppError;

pub mod pipeline;

use pipeline::{PipelineOutput, Sources};

/// Entry point for the `pulse` binary.
pub fn run() -> Result<(), AppError> {
    // `pulse` and `pulse --as-of ...` behave like `pulse report ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let output = execute(&args.run)?;
    print!("{}", crate::report::format_run_summary(&output, args.rows));
    check_any_branch_succeeded(&output)
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let output = execute(&args.run)?;

    crate::io::write_json(&args.json, &output)?;
    if let Some(path) = &args.money_csv {
        crate::io::write_money_csv(path, &output)?;
    }
    if let Some(path) = &args.inflation_csv {
        crate::io::write_inflation_csv(path, &output)?;
    }

    print!("{}", crate::report::format_branch_status(&output.branch_status()));
    check_any_branch_succeeded(&output)
}

fn execute(args: &RunArgs) -> Result<PipelineOutput, AppError> {
    let config = config_from_args(PipelineConfig::from_env()?, args);
    let sources = Sources::from_config(&config)?;
    let today = args.as_of.unwrap_or_else(today);
    Ok(pipeline::run(&sources, &config, today))
}

/// Overlay CLI flags on an environment-derived config.
pub fn config_from_args(mut config: PipelineConfig, args: &RunArgs) -> PipelineConfig {
    if let Some(aggregation) = args.aggregation {
        config.money_aggregation = aggregation;
    }
    if let Some(cert) = &args.cert {
        config.bcra_certificate = cert.clone();
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Partial results are fine; a run where nothing came back is a data failure.
fn check_any_branch_succeeded(output: &PipelineOutput) -> Result<(), AppError> {
    if output.all_failed() {
        return Err(AppError::new(4, "Every pipeline branch failed; see the report above."));
    }
    Ok(())
}

/// Rewrite argv so `pulse` defaults to `pulse report`.
///
/// Rules:
/// - `pulse`                        -> `pulse report`
/// - `pulse --as-of 2025-03-14 ...` -> `pulse report --as-of 2025-03-14 ...`
/// - `pulse --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "export");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    argv
}
