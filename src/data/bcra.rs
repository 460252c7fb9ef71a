//! BCRA statistics API (`/estadisticas/v2.0/DatosVariable`).

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::data::SeriesSource;
use crate::data::transport::Transport;
use crate::domain::{BcraVariable, Observation, Series};
use crate::error::{Provider, SourceError};
use crate::window::{self, DateWindow};

pub const DEFAULT_BASE_URL: &str = "https://api.bcra.gob.ar/estadisticas/v2.0/DatosVariable";

pub struct BcraClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl BcraClient {
    /// `transport` is expected to pin the BCRA certificate.
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, variable_id: &str, window: &DateWindow) -> String {
        format!(
            "{}/{variable_id}/{}/{}",
            self.base_url,
            window.start.format("%Y-%m-%d"),
            window.end.format("%Y-%m-%d")
        )
    }

    /// Fetch a variable over the window its publication calls for as of
    /// `today`, falling back one month for lagged publications.
    pub fn fetch_published(
        &self,
        variable: BcraVariable,
        today: NaiveDate,
    ) -> Result<Series, SourceError> {
        let series =
            window::fetch_published(self, variable.publication(), &variable.id().to_string(), today)?;
        Ok(Series::new(variable.display_name(), series.observations().to_vec()))
    }

    /// Latest value of a variable as of `today`.
    pub fn latest_value(&self, variable: BcraVariable, today: NaiveDate) -> Result<f64, SourceError> {
        let series = self.fetch_published(variable, today)?;
        series
            .latest()
            .map(|o| o.value)
            .ok_or_else(|| SourceError::Exhausted {
                provider: Provider::Bcra,
                key: variable.id().to_string(),
                attempts: 1,
            })
    }
}

impl SeriesSource for BcraClient {
    fn provider(&self) -> Provider {
        Provider::Bcra
    }

    fn fetch(&self, key: &str, window: &DateWindow) -> Result<Series, SourceError> {
        let url = self.url(key, window);
        let resp = self.transport.get(&url).map_err(|cause| SourceError::Transport {
            provider: Provider::Bcra,
            cause,
        })?;

        if !resp.is_success() {
            return Err(SourceError::Status {
                provider: Provider::Bcra,
                status: resp.status,
                body: resp.text(),
            });
        }

        let body: ResultsResponse = serde_json::from_slice(&resp.body)
            .map_err(|e| SourceError::malformed(Provider::Bcra, format!("invalid JSON: {e}")))?;

        let mut out = Vec::with_capacity(body.results.len());
        for rec in body.results {
            let date = parse_date(&rec.fecha).ok_or_else(|| {
                SourceError::malformed(Provider::Bcra, format!("invalid date '{}'", rec.fecha))
            })?;
            if !rec.valor.is_finite() {
                continue;
            }
            out.push(Observation::new(date, rec.valor));
        }
        debug!(variable = key, n = out.len(), "BCRA observations");

        Ok(Series::new(key, out))
    }
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    results: Vec<VariableRecord>,
}

#[derive(Debug, Deserialize)]
struct VariableRecord {
    fecha: String,
    valor: f64,
}

/// Accepts `YYYY-MM-DD` (optionally followed by a time part) and `DD/MM/YYYY`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transport::HttpResponse;
    use crate::error::TransportError;
    use std::sync::Mutex;

    struct Canned {
        response: Result<HttpResponse, TransportError>,
        urls: Mutex<Vec<String>>,
    }

    impl Transport for Canned {
        fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.response.clone()
        }
    }

    fn client(response: Result<HttpResponse, TransportError>) -> (BcraClient, Arc<Canned>) {
        let transport = Arc::new(Canned {
            response,
            urls: Mutex::new(Vec::new()),
        });
        (BcraClient::new(transport.clone(), "https://bcra.test/DatosVariable/"), transport)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn builds_templated_url() {
        let (bcra, _) = client(Ok(HttpResponse::ok("{}")));
        let w = DateWindow::new(d(2024, 3, 3), d(2024, 3, 10));
        assert_eq!(
            bcra.url("6", &w),
            "https://bcra.test/DatosVariable/6/2024-03-03/2024-03-10"
        );
    }

    #[test]
    fn parses_results_in_date_order() {
        let body = r#"{"status":200,"results":[
            {"idVariable":6,"fecha":"2024-03-08","valor":80.0},
            {"idVariable":6,"fecha":"2024-03-07","valor":100.0}
        ]}"#;
        let (bcra, _) = client(Ok(HttpResponse::ok(body)));
        let series = bcra
            .fetch_published(BcraVariable::PolicyRate, d(2024, 3, 8))
            .unwrap();
        assert_eq!(series.name, "policy rate");
        assert_eq!(series.latest(), Some(Observation::new(d(2024, 3, 8), 80.0)));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn non_success_status_carries_body() {
        let (bcra, _) = client(Ok(HttpResponse {
            status: 400,
            body: b"Rango de fechas invalido".to_vec(),
        }));
        let err = bcra.fetch("6", &DateWindow::day(d(2024, 3, 8))).unwrap_err();
        match err {
            SourceError::Status { status, body, .. } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Rango de fechas invalido");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_payload_is_reported() {
        let (bcra, _) = client(Ok(HttpResponse::ok("<html>")));
        let err = bcra.fetch("6", &DateWindow::day(d(2024, 3, 8))).unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
    }

    #[test]
    fn timeout_is_a_transport_failure() {
        let (bcra, _) = client(Err(TransportError::Timeout));
        let err = bcra.fetch("6", &DateWindow::day(d(2024, 3, 8))).unwrap_err();
        assert!(matches!(
            err,
            SourceError::Transport {
                cause: TransportError::Timeout,
                ..
            }
        ));
    }

    #[test]
    fn survey_walks_back_one_month_when_empty() {
        let (bcra, transport) = client(Ok(HttpResponse::ok(r#"{"results":[]}"#)));
        let err = bcra
            .fetch_published(BcraVariable::InflationExpectations, d(2025, 3, 10))
            .unwrap_err();
        assert!(matches!(err, SourceError::Exhausted { attempts: 2, .. }));

        let urls = transport.urls.lock().unwrap();
        assert_eq!(
            *urls,
            vec![
                "https://bcra.test/DatosVariable/29/2025-02-18/2025-02-28".to_string(),
                "https://bcra.test/DatosVariable/29/2025-01-21/2025-01-31".to_string(),
            ]
        );
    }

    #[test]
    fn accepts_both_date_layouts() {
        assert_eq!(parse_date("2024-03-08T00:00:00"), Some(d(2024, 3, 8)));
        assert_eq!(parse_date("08/03/2024"), Some(d(2024, 3, 8)));
        assert_eq!(parse_date("March 8"), None);
    }
}
