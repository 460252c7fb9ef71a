//! Request windows.
//!
//! Each series is requested over a closed date interval derived from "today"
//! and the way the provider publishes it. Lagged series also get a fallback
//! window one month earlier for when the current issue is not out yet.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::info;

use crate::data::SeriesSource;
use crate::domain::Series;
use crate::error::{Provider, SourceError};

/// Closed date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window covering a single day.
    pub fn day(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Publication semantics of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// Published continuously; request the trailing `lookback_days` up to today.
    Rolling { lookback_days: i64 },
    /// Published once a month for the previous month (survey style); request the
    /// last `span_days` before the end of the previous month.
    Lagged { span_days: i64 },
}

/// Attempts made for a lagged series: the primary window plus one fallback.
pub const LAGGED_MAX_ATTEMPTS: usize = 2;

/// Primary request window for `publication` as of `today`.
pub fn resolve(publication: Publication, today: NaiveDate) -> DateWindow {
    match publication {
        Publication::Rolling { lookback_days } => {
            DateWindow::new(today - Duration::days(lookback_days), today)
        }
        Publication::Lagged { span_days } => {
            let end = last_day_of_previous_month(today);
            DateWindow::new(end - Duration::days(span_days), end)
        }
    }
}

/// Window to try after `previous` came back empty, if the publication has one.
pub fn fallback(publication: Publication, previous: &DateWindow) -> Option<DateWindow> {
    match publication {
        Publication::Rolling { .. } => None,
        Publication::Lagged { span_days } => {
            let end = last_day_of_previous_month(previous.end);
            Some(DateWindow::new(end - Duration::days(span_days), end))
        }
    }
}

/// Fetch a series, walking to the fallback window when the primary one yields
/// nothing.
///
/// A window "yields nothing" when the fetch fails or returns an empty series.
/// Rolling series get a single attempt; lagged series get at most
/// `LAGGED_MAX_ATTEMPTS`. The last provider error is surfaced if every attempt
/// failed outright; otherwise the result is `SourceError::Exhausted`.
pub fn fetch_with_fallback<F>(
    publication: Publication,
    today: NaiveDate,
    provider: Provider,
    key: &str,
    mut fetch: F,
) -> Result<Series, SourceError>
where
    F: FnMut(&DateWindow) -> Result<Series, SourceError>,
{
    let max_attempts = match publication {
        Publication::Rolling { .. } => 1,
        Publication::Lagged { .. } => LAGGED_MAX_ATTEMPTS,
    };

    let mut window = resolve(publication, today);
    let mut attempts = 0;
    let mut last_error = None;

    loop {
        attempts += 1;
        match fetch(&window) {
            Ok(series) if !series.is_empty() => return Ok(series),
            Ok(_) => last_error = None,
            Err(e) => last_error = Some(e),
        }

        let next = if attempts < max_attempts {
            fallback(publication, &window)
        } else {
            None
        };
        match next {
            Some(w) => {
                info!(
                    %provider,
                    key,
                    start = %w.start,
                    end = %w.end,
                    "no data in primary window, retrying one month earlier"
                );
                window = w;
            }
            None => {
                return Err(last_error.unwrap_or(SourceError::Exhausted {
                    provider,
                    key: key.to_string(),
                    attempts,
                }));
            }
        }
    }
}

/// Last calendar day of the month before the one containing `date`.
pub fn last_day_of_previous_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date) - Duration::days(1)
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last calendar day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .map(|next| next - Duration::days(1))
        .unwrap_or(date)
}

/// `fetch_with_fallback` over a provider's own `SeriesSource::fetch`.
pub fn fetch_published(
    source: &dyn SeriesSource,
    publication: Publication,
    key: &str,
    today: NaiveDate,
) -> Result<Series, SourceError> {
    fetch_with_fallback(publication, today, source.provider(), key, |w| source.fetch(key, w))
}
