//! Series transformations.
//!
//! - calendar-month resampling (`resample`)
//! - month-over-month variation
//! - display alignment of monthly timestamps

pub mod resample;

pub use resample::*;
