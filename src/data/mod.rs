//! External data sources.
//!
//! - `bcra`: central-bank statistics API (monetary aggregates, rates, spot FX)
//! - `rofex`: dollar futures sessions
//! - `indec`: CPI workbook behind an HTML index page
//! - `transport`: the HTTP seam shared by all three

pub mod bcra;
pub mod indec;
pub mod rofex;
pub mod transport;

pub use bcra::BcraClient;
pub use indec::IndecClient;
pub use rofex::{FuturesQuote, RofexClient};
pub use transport::{HttpResponse, HttpTransport, Transport, UnavailableTransport};

use crate::domain::Series;
use crate::error::{Provider, SourceError};
use crate::window::DateWindow;

/// Fetch raw observations of one series over a date window.
///
/// `key` is provider-specific: a BCRA variable id, a futures ticker, or a CPI
/// component label.
pub trait SeriesSource: Send + Sync {
    fn provider(&self) -> Provider;

    fn fetch(&self, key: &str, window: &DateWindow) -> Result<Series, SourceError>;
}
