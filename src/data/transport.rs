//! HTTP transport seam.
//!
//! Providers only see `Transport::get`, so tests can script responses and the
//! production client can carry per-provider TLS settings (the BCRA endpoint is
//! reached through a pinned certificate).

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{AppError, TransportError};

/// Status line and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossy; used for diagnostics and HTML.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// `reqwest` blocking client with a request timeout.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Client trusting the platform's public roots.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = base_builder(timeout)
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Client whose only trust anchor is the PEM certificate at `certificate`.
    pub fn pinned(timeout: Duration, certificate: &Path) -> Result<Self, AppError> {
        let pem = std::fs::read(certificate).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to read pinned certificate '{}': {e}", certificate.display()),
            )
        })?;
        let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
            AppError::new(
                2,
                format!("Invalid pinned certificate '{}': {e}", certificate.display()),
            )
        })?;

        let client = base_builder(timeout)
            .tls_built_in_root_certs(false)
            .add_root_certificate(cert)
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build pinned HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// Transport that fails every request with a fixed reason, standing in for a
/// client that could not be built (e.g. an unreadable pinned certificate).
pub struct UnavailableTransport {
    reason: String,
}

impl UnavailableTransport {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Transport for UnavailableTransport {
    fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Failed(self.reason.clone()))
    }
}

fn base_builder(timeout: Duration) -> reqwest::blocking::ClientBuilder {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("macro-pulse/", env!("CARGO_PKG_VERSION")))
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().map_err(classify)?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Failed(err.to_string())
    }
}
