//! Input/output helpers.
//!
//! - data-product exports for the presentation layer (`export`)

pub mod export;

pub use export::*;
