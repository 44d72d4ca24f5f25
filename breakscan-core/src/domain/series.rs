//! BarSeries — columnar bar history owned by the detector.
//!
//! Struct-of-arrays layout: one vector per OHLCV column plus dates, all
//! indexed by the 0-based bar index. The detector appends; everything else
//! reads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bar::{Bar, Measure};

/// Parallel OHLCV vectors indexed 0..N.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    opens: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    closes: Vec<f64>,
    volumes: Vec<f64>,
    dates: Vec<NaiveDate>,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bar; the caller has already validated it.
    pub fn push(&mut self, bar: &Bar) {
        self.opens.push(bar.open);
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        self.closes.push(bar.close);
        self.volumes.push(bar.volume);
        self.dates.push(bar.date);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn open(&self, idx: usize) -> f64 {
        self.opens[idx]
    }

    pub fn high(&self, idx: usize) -> f64 {
        self.highs[idx]
    }

    pub fn low(&self, idx: usize) -> f64 {
        self.lows[idx]
    }

    pub fn close(&self, idx: usize) -> f64 {
        self.closes[idx]
    }

    pub fn volume(&self, idx: usize) -> f64 {
        self.volumes[idx]
    }

    pub fn date(&self, idx: usize) -> NaiveDate {
        self.dates[idx]
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Read bar `idx` through a price measure.
    pub fn measure(&self, idx: usize, measure: Measure) -> f64 {
        match measure {
            Measure::High => self.highs[idx],
            Measure::Close => self.closes[idx],
            Measure::BodyTop => self.opens[idx].max(self.closes[idx]),
        }
    }

    /// Minimum low over `range` (caller guarantees a non-empty in-bounds range).
    pub fn min_low(&self, range: std::ops::Range<usize>) -> f64 {
        self.lows[range].iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Mean volume over `range`; `None` when the range is empty.
    pub fn mean_volume(&self, range: std::ops::Range<usize>) -> Option<f64> {
        let slice = &self.volumes[range];
        if slice.is_empty() {
            return None;
        }
        Some(slice.iter().sum::<f64>() / slice.len() as f64)
    }

    /// Reassemble the bar at `idx`.
    pub fn bar(&self, idx: usize) -> Bar {
        Bar {
            date: self.dates[idx],
            open: self.opens[idx],
            high: self.highs[idx],
            low: self.lows[idx],
            close: self.closes[idx],
            volume: self.volumes[idx],
        }
    }
}
