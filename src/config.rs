//! Run configuration.
//!
//! Sources, in increasing precedence: built-in defaults, `.env` / process
//! environment (`MACRO_PULSE_*`), then CLI flags (applied in `app`).

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::data::{bcra, indec, rofex};
use crate::domain::Aggregation;
use crate::error::AppError;

pub const ENV_BCRA_URL: &str = "MACRO_PULSE_BCRA_URL";
pub const ENV_BCRA_CERT: &str = "MACRO_PULSE_BCRA_CERT";
pub const ENV_ROFEX_URL: &str = "MACRO_PULSE_ROFEX_URL";
pub const ENV_INDEC_INDEX_URL: &str = "MACRO_PULSE_INDEC_INDEX_URL";
pub const ENV_INDEC_HOST: &str = "MACRO_PULSE_INDEC_HOST";
pub const ENV_TIMEOUT_SECS: &str = "MACRO_PULSE_TIMEOUT_SECS";
pub const ENV_AGGREGATION: &str = "MACRO_PULSE_AGGREGATION";

pub const DEFAULT_CERT_PATH: &str = "bcra-gob-ar.pem";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub bcra_base_url: String,
    /// PEM trust anchor for the BCRA endpoint.
    pub bcra_certificate: PathBuf,
    pub rofex_base_url: String,
    pub indec_index_url: String,
    pub indec_host: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Monthly aggregation for the whole money family.
    pub money_aggregation: Aggregation,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bcra_base_url: bcra::DEFAULT_BASE_URL.to_string(),
            bcra_certificate: PathBuf::from(DEFAULT_CERT_PATH),
            rofex_base_url: rofex::DEFAULT_BASE_URL.to_string(),
            indec_index_url: indec::DEFAULT_INDEX_URL.to_string(),
            indec_host: indec::DEFAULT_HOST.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            money_aggregation: Aggregation::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `.env` and the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_BCRA_URL) {
            config.bcra_base_url = v;
        }
        if let Some(v) = get(ENV_BCRA_CERT) {
            config.bcra_certificate = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_ROFEX_URL) {
            config.rofex_base_url = v;
        }
        if let Some(v) = get(ENV_INDEC_INDEX_URL) {
            config.indec_index_url = v;
        }
        if let Some(v) = get(ENV_INDEC_HOST) {
            config.indec_host = v;
        }
        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            config.timeout = parse_timeout(&v)?;
        }
        if let Some(v) = get(ENV_AGGREGATION) {
            config.money_aggregation = Aggregation::from_str(&v, true).map_err(|_| {
                AppError::new(2, format!("{ENV_AGGREGATION} must be 'mean' or 'last', got '{v}'."))
            })?;
        }

        Ok(config)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, AppError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::new(
            2,
            format!("{ENV_TIMEOUT_SECS} must be a positive number of seconds, got '{raw}'."),
        )),
    }
}
