//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw time series (`Observation`, `Series`) and the BCRA variables we pull
//! - monthly derivations (`MonthlySeries`, `CompositeRow`, `InflationTable`)
//! - scalar outputs (`ScalarIndicator`, `IndicatorSet`)

pub mod types;

pub use types::*;
