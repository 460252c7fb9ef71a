//! Shared pipeline logic used by every CLI command.
//!
//! One run pulls four independent branches concurrently:
//!
//! 1) money aggregates: base money + deposits -> monthly variation + M2
//! 2) inflation: INDEC CPI workbook -> wide table
//! 3) policy rate -> REM survey (with fallback) -> real rate
//! 4) spot dollar + futures (day walk) -> devaluation-adjusted rate
//!
//! Branches 3 and 4 share the policy rate, fetched once.
//! A failing branch is recorded in the output and never stops the others.
//!
//! Every fetch is blocking I/O, so each branch and sub-fetch gets its own
//! scoped thread; a slow provider only delays the branch that needs it.

use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::aggregate;
use crate::config::PipelineConfig;
use crate::data::{
    BcraClient, HttpTransport, IndecClient, RofexClient, Transport, UnavailableTransport,
};
use crate::domain::{Aggregation, BcraVariable, IndicatorSet, InflationTable, MoneyAggregates};
use crate::error::{AppError, PipelineError};
use crate::indicators::{self, RateInputs};

/// Provider clients for one run.
pub struct Sources {
    pub bcra: BcraClient,
    pub rofex: RofexClient,
    pub indec: IndecClient,
}

impl Sources {
    /// Production clients: BCRA behind its pinned certificate, the others on
    /// public roots.
    ///
    /// A certificate that cannot be loaded only takes down the BCRA-backed
    /// branches: their requests fail with the load error while INDEC and ROFEX
    /// still run.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, AppError> {
        let pinned: Arc<dyn Transport> =
            match HttpTransport::pinned(config.timeout, &config.bcra_certificate) {
                Ok(transport) => Arc::new(transport),
                Err(e) => {
                    warn!(error = %e, "BCRA client unavailable");
                    Arc::new(UnavailableTransport::new(e.to_string()))
                }
            };
        let public: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.timeout)?);
        Ok(Self::with_transports(config, pinned, public))
    }

    pub fn with_transports(
        config: &PipelineConfig,
        bcra: Arc<dyn Transport>,
        public: Arc<dyn Transport>,
    ) -> Self {
        Self {
            bcra: BcraClient::new(bcra, config.bcra_base_url.clone()),
            rofex: RofexClient::new(public.clone(), config.rofex_base_url.clone()),
            indec: IndecClient::new(public, config.indec_index_url.clone(), config.indec_host.clone()),
        }
    }
}

/// Pipeline branches as reported to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    MoneyAggregates,
    Inflation,
    PolicyRates,
    Devaluation,
}

impl Branch {
    pub fn display_name(self) -> &'static str {
        match self {
            Branch::MoneyAggregates => "money aggregates",
            Branch::Inflation => "inflation",
            Branch::PolicyRates => "policy rates",
            Branch::Devaluation => "devaluation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchStatus {
    pub branch: Branch,
    /// `None` on success.
    pub error: Option<String>,
}

impl BranchStatus {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub as_of: NaiveDate,
    pub money: Result<MoneyAggregates, PipelineError>,
    pub inflation: Result<InflationTable, PipelineError>,
    pub indicators: IndicatorSet,
}

impl PipelineOutput {
    pub fn branch_status(&self) -> Vec<BranchStatus> {
        let err = |r: Option<&str>| r.map(str::to_string);
        vec![
            BranchStatus {
                branch: Branch::MoneyAggregates,
                error: self.money.as_ref().err().map(|e| e.to_string()),
            },
            BranchStatus {
                branch: Branch::Inflation,
                error: self.inflation.as_ref().err().map(|e| e.to_string()),
            },
            BranchStatus {
                branch: Branch::PolicyRates,
                error: err(self.indicators.real_policy_rate.reason()),
            },
            BranchStatus {
                branch: Branch::Devaluation,
                error: err(self.indicators.devaluation_adjusted_rate.reason()),
            },
        ]
    }

    pub fn all_failed(&self) -> bool {
        self.branch_status().iter().all(|s| !s.is_ok())
    }
}

/// Run every branch as of `today`.
pub fn run(sources: &Sources, config: &PipelineConfig, today: NaiveDate) -> PipelineOutput {
    info!(%today, "pipeline run");

    let (money, inflation, indicators) = thread::scope(|scope| {
        let money = scope.spawn(|| money_branch(&sources.bcra, config.money_aggregation, today));
        let inflation = scope.spawn(|| inflation_branch(&sources.indec));
        let indicators = scope.spawn(|| rates_branch(sources, today));
        (join(money), join(inflation), join(indicators))
    });

    if let Err(e) = &money {
        warn!(error = %e, "money aggregates branch failed");
    }
    if let Err(e) = &inflation {
        warn!(error = %e, "inflation branch failed");
    }
    for indicator in indicators.all() {
        if let Some(reason) = indicator.reason() {
            warn!(indicator = indicator.kind.key(), %reason, "indicator unavailable");
        }
    }

    PipelineOutput {
        as_of: today,
        money,
        inflation,
        indicators,
    }
}

pub fn money_branch(
    bcra: &BcraClient,
    aggregation: Aggregation,
    today: NaiveDate,
) -> Result<MoneyAggregates, PipelineError> {
    let (base, deposits) = thread::scope(|scope| {
        let base = scope.spawn(|| bcra.fetch_published(BcraVariable::BaseMoney, today));
        let deposits = scope.spawn(|| bcra.fetch_published(BcraVariable::BankDeposits, today));
        (join(base), join(deposits))
    });
    aggregate::combine(&base?, &deposits?, aggregation)
}

pub fn inflation_branch(indec: &IndecClient) -> Result<InflationTable, PipelineError> {
    Ok(indec.fetch_table()?)
}

/// Policy rate, survey, spot and futures fetched side by side. The policy rate
/// is fetched once and feeds both the real and the devaluation-adjusted rate.
pub fn rates_branch(sources: &Sources, today: NaiveDate) -> IndicatorSet {
    let latest = |variable| {
        sources
            .bcra
            .latest_value(variable, today)
            .map_err(PipelineError::from)
    };

    let (policy_rate, expected_inflation, spot, futures_close) = thread::scope(|scope| {
        let policy = scope.spawn(|| latest(BcraVariable::PolicyRate));
        let expected = scope.spawn(|| latest(BcraVariable::InflationExpectations));
        let spot = scope.spawn(|| latest(BcraVariable::OfficialDollar));
        let futures = scope.spawn(|| {
            sources
                .rofex
                .latest_close(today)
                .map(|q| q.close)
                .map_err(PipelineError::from)
        });
        (join(policy), join(expected), join(spot), join(futures))
    });

    indicators::compute(&RateInputs {
        policy_rate,
        expected_inflation,
        spot,
        futures_close,
    })
}

/// Join a scoped fetch, re-raising a panic from the worker.
fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}
