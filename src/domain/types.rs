//! Shared domain types.
//!
//! Everything here is owned transiently by a single pipeline run; nothing is
//! persisted between runs.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::window::Publication;

/// A single dated value of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An ordered sequence of observations.
///
/// Dates are strictly increasing: construction sorts the input and keeps the
/// last value seen for a repeated date.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    observations: Vec<Observation>,
}

impl Series {
    pub fn new(name: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        // Stable sort keeps provider order among equal dates, so "last wins" below
        // means "last delivered wins".
        observations.sort_by_key(|o| o.date);
        let mut deduped: Vec<Observation> = Vec::with_capacity(observations.len());
        for obs in observations {
            match deduped.last_mut() {
                Some(prev) if prev.date == obs.date => *prev = obs,
                _ => deduped.push(obs),
            }
        }
        Self {
            name: name.into(),
            observations: deduped,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Most recent observation.
    pub fn latest(&self) -> Option<Observation> {
        self.observations.last().copied()
    }
}

/// BCRA statistics variables consumed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BcraVariable {
    BaseMoney,
    BankDeposits,
    PolicyRate,
    OfficialDollar,
    InflationExpectations,
}

impl BcraVariable {
    /// Provider-side variable id.
    pub fn id(self) -> u32 {
        match self {
            BcraVariable::BaseMoney => 15,
            BcraVariable::BankDeposits => 21,
            BcraVariable::PolicyRate => 6,
            BcraVariable::OfficialDollar => 4,
            BcraVariable::InflationExpectations => 29,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BcraVariable::BaseMoney => "base money",
            BcraVariable::BankDeposits => "bank deposits",
            BcraVariable::PolicyRate => "policy rate",
            BcraVariable::OfficialDollar => "official dollar",
            BcraVariable::InflationExpectations => "12-month inflation expectations",
        }
    }

    /// How the provider publishes the variable, which decides the request window.
    pub fn publication(self) -> Publication {
        match self {
            BcraVariable::BaseMoney | BcraVariable::BankDeposits => {
                Publication::Rolling { lookback_days: 365 }
            }
            BcraVariable::PolicyRate | BcraVariable::OfficialDollar => {
                Publication::Rolling { lookback_days: 7 }
            }
            BcraVariable::InflationExpectations => Publication::Lagged { span_days: 10 },
        }
    }
}

/// How observations inside one calendar month collapse to a single value.
///
/// All series that are summed together must share the same policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Arithmetic mean of the month's observations.
    #[default]
    Mean,
    /// Last observation of the month.
    Last,
}

/// One month of a resampled series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPoint {
    /// Display date: month end shifted back by `transform::DISPLAY_SHIFT_DAYS`.
    pub month: NaiveDate,
    pub value: f64,
    /// Fractional change against the preceding month.
    pub variation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    pub name: String,
    pub aggregation: Aggregation,
    pub points: Vec<MonthlyPoint>,
}

/// Type label of a money-aggregate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MoneyKind {
    #[serde(rename = "Base Money")]
    BaseMoney,
    #[serde(rename = "Bank Deposits")]
    BankDeposits,
    #[serde(rename = "M2")]
    M2,
}

impl MoneyKind {
    pub const ALL: [MoneyKind; 3] = [MoneyKind::BaseMoney, MoneyKind::BankDeposits, MoneyKind::M2];

    pub fn label(self) -> &'static str {
        match self {
            MoneyKind::BaseMoney => "Base Money",
            MoneyKind::BankDeposits => "Bank Deposits",
            MoneyKind::M2 => "M2",
        }
    }
}

/// Long-form money table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeRow {
    pub month: NaiveDate,
    pub variation: f64,
    #[serde(rename = "type")]
    pub kind: MoneyKind,
}

/// Output of the money-aggregates branch.
#[derive(Debug, Clone)]
pub struct MoneyAggregates {
    pub rows: Vec<CompositeRow>,
    pub m2: MonthlySeries,
}

impl MoneyAggregates {
    pub fn rows_of(&self, kind: MoneyKind) -> impl Iterator<Item = &CompositeRow> {
        self.rows.iter().filter(move |r| r.kind == kind)
    }
}

/// Consumer price index components published by INDEC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpiComponent {
    General,
    Core,
    Seasonal,
    Regulated,
}

impl CpiComponent {
    pub const ALL: [CpiComponent; 4] = [
        CpiComponent::General,
        CpiComponent::Core,
        CpiComponent::Seasonal,
        CpiComponent::Regulated,
    ];

    /// Row label used in the INDEC workbook.
    pub fn source_label(self) -> &'static str {
        match self {
            CpiComponent::General => "Nivel general",
            CpiComponent::Core => "Núcleo",
            CpiComponent::Seasonal => "Estacional",
            CpiComponent::Regulated => "Regulados",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CpiComponent::General => "general",
            CpiComponent::Core => "core",
            CpiComponent::Seasonal => "seasonal",
            CpiComponent::Regulated => "regulated",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        CpiComponent::ALL
            .into_iter()
            .find(|c| c.source_label().eq_ignore_ascii_case(label) || c.display_name() == label)
    }
}

/// One reporting month of CPI variation, as fractions (0.037 = 3.7%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InflationRow {
    pub month: NaiveDate,
    pub general: f64,
    pub core: f64,
    pub seasonal: f64,
    pub regulated: f64,
}

impl InflationRow {
    pub fn get(&self, component: CpiComponent) -> f64 {
        match component {
            CpiComponent::General => self.general,
            CpiComponent::Core => self.core,
            CpiComponent::Seasonal => self.seasonal,
            CpiComponent::Regulated => self.regulated,
        }
    }
}

/// Wide-form CPI table, one row per published month, ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InflationTable {
    pub rows: Vec<InflationRow>,
}

impl InflationTable {
    pub fn latest(&self) -> Option<&InflationRow> {
        self.rows.last()
    }

    /// One component as a series of fractional monthly variations.
    pub fn component(&self, component: CpiComponent) -> Series {
        Series::new(
            component.display_name(),
            self.rows
                .iter()
                .map(|r| Observation::new(r.month, r.get(component)))
                .collect(),
        )
    }
}

/// Scalar indicators produced each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    MonthlyPolicyRate,
    ExpectedInflation,
    RealPolicyRate,
    DevaluationAdjustedRate,
}

impl IndicatorKind {
    pub fn display_name(self) -> &'static str {
        match self {
            IndicatorKind::MonthlyPolicyRate => "Monthly policy rate",
            IndicatorKind::ExpectedInflation => "Expected 12m inflation",
            IndicatorKind::RealPolicyRate => "Real policy rate",
            IndicatorKind::DevaluationAdjustedRate => "Devaluation-adjusted rate",
        }
    }

    /// Stable identifier used in exports.
    pub fn key(self) -> &'static str {
        match self {
            IndicatorKind::MonthlyPolicyRate => "monthly_policy_rate",
            IndicatorKind::ExpectedInflation => "expected_inflation",
            IndicatorKind::RealPolicyRate => "real_policy_rate",
            IndicatorKind::DevaluationAdjustedRate => "devaluation_adjusted_rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Available(f64),
    Unavailable { reason: String },
}

/// Rendered in place of a value that could not be computed.
pub const UNAVAILABLE_DISPLAY: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarIndicator {
    pub kind: IndicatorKind,
    pub value: IndicatorValue,
}

impl ScalarIndicator {
    pub fn available(kind: IndicatorKind, value: f64) -> Self {
        Self {
            kind,
            value: IndicatorValue::Available(value),
        }
    }

    pub fn unavailable(kind: IndicatorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            value: IndicatorValue::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn numeric(&self) -> Option<f64> {
        match self.value {
            IndicatorValue::Available(v) => Some(v),
            IndicatorValue::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.value {
            IndicatorValue::Available(_) => None,
            IndicatorValue::Unavailable { reason } => Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        self.numeric().is_some()
    }

    /// Percentage string for display (`15.0%`), or `N/A`.
    pub fn display(&self) -> String {
        match self.value {
            IndicatorValue::Available(v) => crate::indicators::format_percent(v),
            IndicatorValue::Unavailable { .. } => UNAVAILABLE_DISPLAY.to_string(),
        }
    }
}

/// The four scalar indicators of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub monthly_policy_rate: ScalarIndicator,
    pub expected_inflation: ScalarIndicator,
    pub real_policy_rate: ScalarIndicator,
    pub devaluation_adjusted_rate: ScalarIndicator,
}

impl IndicatorSet {
    pub fn all(&self) -> [&ScalarIndicator; 4] {
        [
            &self.monthly_policy_rate,
            &self.expected_inflation,
            &self.real_policy_rate,
            &self.devaluation_adjusted_rate,
        ]
    }
}
