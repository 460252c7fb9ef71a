//! Error types.
//!
//! - `SourceError`: a provider could not deliver data (status, transport, payload,
//!   exhausted retry budget).
//! - `PipelineError`: what a branch of the pipeline reports upward.
//! - `AppError`: what the binary reports to the user, carrying the exit code.

use std::fmt;

use thiserror::Error;

/// External data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Bcra,
    Rofex,
    Indec,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Bcra => "BCRA",
            Provider::Rofex => "ROFEX",
            Provider::Indec => "INDEC",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Failure below the HTTP status line.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Failed(String),
}

/// A source could not deliver usable data.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {cause}")]
    Transport {
        provider: Provider,
        #[source]
        cause: TransportError,
    },

    #[error("{provider} payload malformed: {message}")]
    Malformed { provider: Provider, message: String },

    #[error("{provider}: index link not found")]
    LinkNotFound { provider: Provider },

    #[error("{provider}: no data for '{key}' after {attempts} attempt(s)")]
    Exhausted {
        provider: Provider,
        key: String,
        attempts: usize,
    },
}

impl SourceError {
    pub fn malformed(provider: Provider, message: impl Into<String>) -> Self {
        SourceError::Malformed {
            provider,
            message: message.into(),
        }
    }
}

/// Branch-level failure.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("data alignment error: {0}")]
    DataAlignment(String),

    #[error("indicator unavailable: {0}")]
    IndicatorUnavailable(String),
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
