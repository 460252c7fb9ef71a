//! INDEC consumer price index workbook.
//!
//! Two-step fetch: the CPI index page links the current month's workbook via an
//! anchor (`class="a-color2" target="_blank"`); the workbook's first sheet
//! holds the national block in a fixed range of rows, one column per month.
//!
//! Parsing is split so each step is testable without the network:
//! `find_workbook_link` (HTML) -> `parse_workbook` (bytes) -> `parse_range`
//! (sheet) -> `build_table` (cell grid).

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use calamine::{Data, DataType, Range, Reader, open_workbook_auto_from_rs};
use chrono::{Datelike, NaiveDate, TimeDelta};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::data::SeriesSource;
use crate::data::transport::Transport;
use crate::domain::{CpiComponent, InflationRow, InflationTable, Series};
use crate::error::{Provider, SourceError};
use crate::window::{DateWindow, first_day_of_month};

pub const DEFAULT_INDEX_URL: &str = "https://www.indec.gob.ar/Nivel4/Tema/3/5/31";
pub const DEFAULT_HOST: &str = "https://www.indec.gob.ar";

const LINK_SELECTOR: &str = r#"a.a-color2[href][target="_blank"]"#;

/// Zero-based sheet rows holding the national block (sheet rows 6-35, i.e. the
/// 5th through 34th row below the header row).
pub const BLOCK_ROWS: std::ops::Range<u32> = 5..35;

/// Excel serial day 0.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// Serials below this (1954) are data, not dates.
const MIN_DATE_SERIAL: f64 = 20_000.0;

pub struct IndecClient {
    transport: Arc<dyn Transport>,
    index_url: String,
    host: String,
}

impl IndecClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        index_url: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            index_url: index_url.into(),
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve the workbook URL from the index page.
    pub fn workbook_url(&self) -> Result<String, SourceError> {
        let html = self.get(&self.index_url)?;
        let href = find_workbook_link(&String::from_utf8_lossy(&html))
            .ok_or(SourceError::LinkNotFound {
                provider: Provider::Indec,
            })?;
        Ok(resolve_link(&self.host, &href))
    }

    /// Download and parse the current CPI table.
    pub fn fetch_table(&self) -> Result<InflationTable, SourceError> {
        let url = self.workbook_url()?;
        debug!(%url, "INDEC workbook");
        let bytes = self.get(&url)?;
        parse_workbook(bytes)
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let resp = self.transport.get(url).map_err(|cause| SourceError::Transport {
            provider: Provider::Indec,
            cause,
        })?;
        if !resp.is_success() {
            return Err(SourceError::Status {
                provider: Provider::Indec,
                status: resp.status,
                body: resp.text(),
            });
        }
        Ok(resp.body)
    }
}

impl SeriesSource for IndecClient {
    fn provider(&self) -> Provider {
        Provider::Indec
    }

    /// `key` is a component label (`Nivel general`, `core`, ...); months outside
    /// `window` are dropped.
    fn fetch(&self, key: &str, window: &DateWindow) -> Result<Series, SourceError> {
        let component = CpiComponent::from_label(key).ok_or_else(|| {
            SourceError::malformed(Provider::Indec, format!("unknown CPI component '{key}'"))
        })?;
        let table = self.fetch_table()?;
        let series = table.component(component);
        let in_window = series
            .observations()
            .iter()
            .copied()
            .filter(|o| window.contains(o.date))
            .collect();
        Ok(Series::new(series.name, in_window))
    }
}

/// `href` of the first anchor matching the workbook link pattern.
pub fn find_workbook_link(html: &str) -> Option<String> {
    let selector = Selector::parse(LINK_SELECTOR).ok()?;
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

/// Join a relative link to the site host; absolute links pass through.
pub fn resolve_link(host: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{host}{href}")
    } else {
        format!("{host}/{href}")
    }
}

pub fn parse_workbook(bytes: Vec<u8>) -> Result<InflationTable, SourceError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| SourceError::malformed(Provider::Indec, format!("unreadable workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::malformed(Provider::Indec, "workbook has no sheets"))?
        .map_err(|e| SourceError::malformed(Provider::Indec, format!("unreadable sheet: {e}")))?;
    parse_range(&range)
}

/// A normalized spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn label(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().replace(',', ".").parse().ok(),
            _ => None,
        }
    }

    fn period(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Number(serial) if *serial >= MIN_DATE_SERIAL => excel_serial_date(*serial),
            Cell::Text(s) => parse_period_text(s),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Float(v) => Cell::Number(*v),
            Data::Int(v) => Cell::Number(*v as f64),
            Data::String(s) if !s.trim().is_empty() => Cell::Text(s.trim().to_string()),
            Data::DateTime(_) | Data::DateTimeIso(_) => data.as_date().map_or(Cell::Empty, Cell::Date),
            _ => Cell::Empty,
        }
    }
}

/// Cut the national block out of the sheet (absolute positions) and build the table.
pub fn parse_range(range: &Range<Data>) -> Result<InflationTable, SourceError> {
    let last_col = range
        .end()
        .map(|(_, c)| c)
        .ok_or_else(|| SourceError::malformed(Provider::Indec, "empty sheet"))?;

    let block: Vec<Vec<Cell>> = BLOCK_ROWS
        .map(|row| {
            (0..=last_col)
                .map(|col| range.get_value((row, col)).map_or(Cell::Empty, Cell::from))
                .collect()
        })
        .collect();

    build_table(&block)
}

/// Build the wide CPI table from the block, one inner `Vec` per sheet row.
///
/// The block is read transposed: column 0 holds row labels, the first row with
/// dates holds the periods, and each later column is one month. Percent values
/// are converted to fractions. Months missing any component are skipped.
pub fn build_table(block: &[Vec<Cell>]) -> Result<InflationTable, SourceError> {
    let rows: Vec<&Vec<Cell>> = block
        .iter()
        .filter(|r| r.iter().skip(1).any(|c| !c.is_empty()))
        .collect();

    let header = rows
        .iter()
        .find(|r| r.iter().skip(1).any(|c| c.period().is_some()))
        .ok_or_else(|| SourceError::malformed(Provider::Indec, "no period header in CPI block"))?;

    let mut component_rows: Vec<(CpiComponent, &Vec<Cell>)> = Vec::new();
    for &row in &rows {
        let Some(component) = row.first().and_then(Cell::label).and_then(CpiComponent::from_label) else {
            continue;
        };
        // Keep the first occurrence; later blocks repeat the labels per region.
        if !component_rows.iter().any(|(c, _)| *c == component) {
            component_rows.push((component, row));
        }
    }
    if let Some(missing) = CpiComponent::ALL
        .iter()
        .find(|c| !component_rows.iter().any(|(found, _)| found == *c))
    {
        return Err(SourceError::malformed(
            Provider::Indec,
            format!("CPI component '{}' not found", missing.source_label()),
        ));
    }

    let mut by_month: BTreeMap<NaiveDate, InflationRow> = BTreeMap::new();
    for (col, cell) in header.iter().enumerate().skip(1) {
        let Some(period) = cell.period() else {
            continue;
        };
        let value_of = |component: CpiComponent| {
            component_rows
                .iter()
                .find(|(c, _)| *c == component)
                .and_then(|(_, row)| row.get(col))
                .and_then(Cell::number)
                .map(|pct| pct / 100.0)
        };
        let (Some(general), Some(core), Some(seasonal), Some(regulated)) = (
            value_of(CpiComponent::General),
            value_of(CpiComponent::Core),
            value_of(CpiComponent::Seasonal),
            value_of(CpiComponent::Regulated),
        ) else {
            debug!(%period, "skipping CPI month with missing components");
            continue;
        };
        let month = first_day_of_month(period);
        by_month.insert(
            month,
            InflationRow {
                month,
                general,
                core,
                seasonal,
                regulated,
            },
        );
    }

    if by_month.is_empty() {
        warn!("CPI block parsed but no complete month found");
        return Err(SourceError::malformed(Provider::Indec, "no published months in CPI block"));
    }

    Ok(InflationTable {
        rows: by_month.into_values().collect(),
    })
}

fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    if !serial.is_finite() {
        return None;
    }
    epoch.checked_add_signed(TimeDelta::try_days(serial.floor() as i64)?)
}

/// `2024-01-01`, `01/01/2024`, `ene-24`, `Enero 2024`.
fn parse_period_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), fmt) {
            return Some(date);
        }
    }

    let lower = raw.to_lowercase();
    let (month_part, year_part) = lower.split_once(['-', ' ', '/'])?;
    let month = spanish_month(month_part.trim_end_matches('.'))?;
    let year: i32 = year_part.trim().parse().ok()?;
    let year = if year < 100 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month, 1).filter(|d| d.year() >= 1990)
}

fn spanish_month(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
    ];
    let prefix = name.get(..3)?;
    MONTHS.iter().position(|m| *m == prefix).map(|i| i as u32 + 1)
}
