//! ROFEX/Matba dollar futures (intraday series endpoint).
//!
//! The contract we price is the dollar future expiring in the month before the
//! current one, one year out. Sessions run 13:00-21:00 UTC; weekends and
//! holidays return an empty series, so the client walks back day by day.

use std::sync::Arc;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::data::SeriesSource;
use crate::data::transport::Transport;
use crate::domain::{Observation, Series};
use crate::error::{Provider, SourceError};
use crate::window::DateWindow;

pub const DEFAULT_BASE_URL: &str = "https://rofex.primary.ventures/api/v2/series/securities";

/// Sessions tried (today plus up to eight earlier days).
pub const MAX_SESSION_ATTEMPTS: usize = 9;

const TICKER_PREFIX: &str = "rx_DDF_DLR_";

/// Close of a futures session.
#[derive(Debug, Clone, PartialEq)]
pub struct FuturesQuote {
    pub ticker: String,
    pub session: NaiveDate,
    pub close: f64,
    /// Requests made until a non-empty session was found.
    pub attempts: usize,
}

pub struct RofexClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl RofexClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn session_url(&self, ticker: &str, day: NaiveDate) -> String {
        let day = day.format("%Y-%m-%d");
        format!(
            "{}/{ticker}?resolution=1&from={day}T13%3A00%3A00.000Z&to={day}T21%3A00%3A00.000Z",
            self.base_url
        )
    }

    /// Latest close of the contract implied by `today`, walking back over empty
    /// or failed sessions. After `MAX_SESSION_ATTEMPTS` sessions the last
    /// provider error is returned, or `Exhausted` if every session was empty.
    pub fn latest_close(&self, today: NaiveDate) -> Result<FuturesQuote, SourceError> {
        let ticker = ticker(today);
        let mut last_error = None;

        for days_back in 0..MAX_SESSION_ATTEMPTS {
            let session = today - Duration::days(days_back as i64);
            match self.fetch(&ticker, &DateWindow::day(session)) {
                Ok(series) => {
                    if let Some(last) = series.latest() {
                        return Ok(FuturesQuote {
                            ticker,
                            session,
                            close: last.value,
                            attempts: days_back + 1,
                        });
                    }
                    last_error = None;
                    info!(%ticker, %session, "empty futures session, trying previous day");
                }
                Err(e) => {
                    warn!(%ticker, %session, error = %e, "futures session failed, trying previous day");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(SourceError::Exhausted {
            provider: self.provider(),
            key: ticker,
            attempts: MAX_SESSION_ATTEMPTS,
        }))
    }
}

impl SeriesSource for RofexClient {
    fn provider(&self) -> Provider {
        Provider::Rofex
    }

    /// Session closes for `window.end`, dated on that day.
    fn fetch(&self, key: &str, window: &DateWindow) -> Result<Series, SourceError> {
        let url = self.session_url(key, window.end);
        let resp = self.transport.get(&url).map_err(|cause| SourceError::Transport {
            provider: Provider::Rofex,
            cause,
        })?;

        if !resp.is_success() {
            return Err(SourceError::Status {
                provider: Provider::Rofex,
                status: resp.status,
                body: resp.text(),
            });
        }

        let body: SeriesResponse = serde_json::from_slice(&resp.body)
            .map_err(|e| SourceError::malformed(Provider::Rofex, format!("invalid JSON: {e}")))?;

        let closes: Vec<Observation> = body
            .series
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.c.is_finite())
            .map(|c| Observation::new(window.end, c.c))
            .collect();
        debug!(ticker = key, n = closes.len(), "ROFEX candles");

        Ok(Series::new(key, closes))
    }
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    series: Option<Vec<Candle>>,
}

#[derive(Debug, Deserialize)]
struct Candle {
    c: f64,
}

/// Contract code for `today`: month before `today` as a 3-letter abbreviation,
/// followed by the two-digit year after `today`'s (March 2025 -> `FEB26`).
pub fn contract_code(today: NaiveDate) -> String {
    let prior = today.checked_sub_months(Months::new(1)).unwrap_or(today);
    let month = prior.format("%b").to_string().to_uppercase();
    format!("{month}{:02}", (today.year() + 1).rem_euclid(100))
}

pub fn ticker(today: NaiveDate) -> String {
    format!("{TICKER_PREFIX}{}", contract_code(today))
}
