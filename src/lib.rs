//! `macro-pulse` library crate.
//!
//! The binary (`pulse`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or touching the network
//! - a presentation layer (charts, dashboards) can consume the data products directly

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod io;
pub mod report;
pub mod transform;
pub mod window;
