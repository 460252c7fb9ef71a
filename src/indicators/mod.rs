//! Scalar indicators derived from the latest policy rate, survey, spot and
//! futures values.
//!
//! Every indicator keeps its numeric form; formatting happens at the edge
//! (`ScalarIndicator::display`) so arithmetic never goes through strings.

use crate::domain::{IndicatorKind, IndicatorSet, ScalarIndicator};
use crate::error::PipelineError;

/// Round to two decimals, ties to even (`0.125` -> `0.12`, `0.375` -> `0.38`).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Shortest round-trip representation, always with a fractional part, plus `%`.
///
/// `15.0` -> `"15.0%"`, `-50.91` -> `"-50.91%"`.
pub fn format_percent(v: f64) -> String {
    format!("{v:?}%")
}

/// Annual policy rate expressed per month.
pub fn monthly_policy_rate(annual_policy_rate: f64) -> f64 {
    round2(annual_policy_rate / 12.0)
}

/// Policy rate net of expected 12-month inflation.
pub fn real_policy_rate(annual_policy_rate: f64, expected_inflation: f64) -> f64 {
    round2(annual_policy_rate - expected_inflation)
}

/// Spot over futures close, as a percentage.
pub fn expected_devaluation(spot: f64, futures_close: f64) -> Result<f64, PipelineError> {
    if !(futures_close.is_finite() && futures_close > 0.0) {
        return Err(PipelineError::IndicatorUnavailable(format!(
            "invalid futures close {futures_close}"
        )));
    }
    Ok(spot / futures_close * 100.0)
}

/// Policy rate net of the devaluation implied by spot vs futures pricing.
pub fn devaluation_adjusted_rate(
    annual_policy_rate: f64,
    spot: f64,
    futures_close: f64,
) -> Result<f64, PipelineError> {
    let devaluation = expected_devaluation(spot, futures_close)?;
    Ok(round2(annual_policy_rate - devaluation))
}

/// Latest raw inputs of the rates branches, each possibly failed.
#[derive(Debug, Clone)]
pub struct RateInputs {
    pub policy_rate: Result<f64, PipelineError>,
    pub expected_inflation: Result<f64, PipelineError>,
    pub spot: Result<f64, PipelineError>,
    pub futures_close: Result<f64, PipelineError>,
}

/// Compute all four indicators, degrading each one independently.
pub fn compute(inputs: &RateInputs) -> IndicatorSet {
    use IndicatorKind::*;

    let unavailable = |kind, err: &PipelineError| ScalarIndicator::unavailable(kind, err.to_string());

    let monthly = match &inputs.policy_rate {
        Ok(p) => ScalarIndicator::available(MonthlyPolicyRate, monthly_policy_rate(*p)),
        Err(e) => unavailable(MonthlyPolicyRate, e),
    };

    let expected = match &inputs.expected_inflation {
        Ok(v) => ScalarIndicator::available(ExpectedInflation, *v),
        Err(e) => unavailable(ExpectedInflation, e),
    };

    let real = match (&inputs.policy_rate, &inputs.expected_inflation) {
        (Ok(p), Ok(e)) => ScalarIndicator::available(RealPolicyRate, real_policy_rate(*p, *e)),
        (Err(e), _) | (_, Err(e)) => unavailable(RealPolicyRate, e),
    };

    let devaluation = match (&inputs.policy_rate, &inputs.spot, &inputs.futures_close) {
        (Ok(p), Ok(s), Ok(f)) => match devaluation_adjusted_rate(*p, *s, *f) {
            Ok(v) => ScalarIndicator::available(DevaluationAdjustedRate, v),
            Err(e) => unavailable(DevaluationAdjustedRate, &e),
        },
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => unavailable(DevaluationAdjustedRate, e),
    };

    IndicatorSet {
        monthly_policy_rate: monthly,
        expected_inflation: expected,
        real_policy_rate: real,
        devaluation_adjusted_rate: devaluation,
    }
}
