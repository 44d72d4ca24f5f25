//! CSV bar ingest — validation, sorting, deduplication.
//!
//! Rows arrive as `date,open,high,low,close,volume`. The pipeline sorts by
//! date ascending, keeps the last row per date, and drops rows that fail the
//! OHLCV sanity check before they ever reach a detector.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use breakscan_core::domain::Bar;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv parse: {0}")]
    Csv(#[from] csv::Error),

    #[error("no usable bars in input")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<CsvBar> for Bar {
    fn from(row: CsvBar) -> Self {
        Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Outcome of an ingest run.
#[derive(Debug)]
pub struct IngestReport {
    /// Validated bars, sorted by date ascending.
    pub bars: Vec<Bar>,
    pub duplicates_removed: usize,
    pub insane_dropped: usize,
}

/// Load bars from a CSV file.
pub fn load_csv(path: &Path) -> Result<IngestReport, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        bars.push(Bar::from(row?));
    }
    ingest(bars)
}

/// Parse bars from CSV text (header row required).
pub fn parse_csv(text: &str) -> Result<IngestReport, IngestError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        bars.push(Bar::from(row?));
    }
    ingest(bars)
}

/// Sort, dedupe (keep last row per date), and drop insane rows.
pub fn ingest(mut bars: Vec<Bar>) -> Result<IngestReport, IngestError> {
    bars.sort_by_key(|b| b.date);

    let len_before = bars.len();
    // Keep the LAST row per date: reverse, dedupe (which keeps the first of
    // each run), reverse back.
    bars.reverse();
    bars.dedup_by_key(|b| b.date);
    bars.reverse();
    let duplicates_removed = len_before - bars.len();

    let len_before = bars.len();
    bars.retain(|b| b.is_sane());
    let insane_dropped = len_before - bars.len();
    if insane_dropped > 0 {
        warn!(dropped = insane_dropped, "dropped bars failing OHLCV sanity");
    }

    if bars.is_empty() {
        return Err(IngestError::Empty);
    }

    Ok(IngestReport {
        bars,
        duplicates_removed,
        insane_dropped,
    })
}
