//! Incremental breakout detector.
//!
//! Single-writer state machine over one symbol's bar stream. Each accepted
//! bar first runs peak discovery on the window *preceding* it, then breakout
//! matching against the bar itself, so a bar can simultaneously confirm a
//! fresh peak and break older ones.

pub mod config;
mod breakout_scan;
mod peak_scan;
mod snapshot;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, BarSeries, BreakoutInfo, BreakoutRecord, Peak, PeakIdGen};

pub use config::{ConfigError, DetectorConfig};
pub use snapshot::{SnapshotError, SnapshotMeta};

/// Per-bar input rejection. The offending bar is not applied; detector state
/// is unchanged and the caller decides whether to skip or abort.
#[derive(Debug, Error)]
pub enum BarError {
    #[error("bar date {next} is not after the previous bar date {prev}")]
    NonMonotonicDate { prev: NaiveDate, next: NaiveDate },

    #[error("{field} must be a positive finite number, got {value}")]
    NonPositivePrice { field: &'static str, value: f64 },

    #[error("volume must be a non-negative finite number, got {value}")]
    BadVolume { value: f64 },
}

/// Summary of a detector's current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorStatus {
    pub symbol: String,
    pub total_bars: usize,
    pub active_peaks_count: usize,
    pub last_date: Option<NaiveDate>,
    pub cache_exists: bool,
}

/// Incremental breakout detector for a single symbol.
///
/// Owns its entire state: the bar history, the active peak set, and the
/// breakout log. Emitted events carry peak snapshots by value.
#[derive(Debug)]
pub struct Detector {
    symbol: String,
    config: DetectorConfig,
    series: BarSeries,
    active_peaks: Vec<Peak>,
    id_gen: PeakIdGen,
    breakout_history: Vec<BreakoutRecord>,
}

impl Detector {
    /// Build a detector; fails on an invalid configuration.
    ///
    /// With `use_cache` set, a matching snapshot under `cache_dir` is
    /// restored. Any persistence problem (missing, torn, or produced by a
    /// different configuration) logs a warning and starts empty.
    pub fn new(symbol: impl Into<String>, config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut detector = Self {
            symbol: symbol.into(),
            config,
            series: BarSeries::new(),
            active_peaks: Vec::new(),
            id_gen: PeakIdGen::default(),
            breakout_history: Vec::new(),
        };
        if detector.config.use_cache {
            detector.try_restore();
        }
        Ok(detector)
    }

    /// Append one bar. Returns a breakout event when the bar penetrates at
    /// least one active peak.
    pub fn add_bar(&mut self, bar: &Bar) -> Result<Option<BreakoutInfo>, BarError> {
        self.add_bar_inner(bar, true)
    }

    /// Append many bars, suppressing the per-bar cache cadence; one save at
    /// the end when caching is on. Stops at the first rejected bar.
    pub fn batch_add_bars(&mut self, bars: &[Bar]) -> Result<Vec<BreakoutInfo>, BarError> {
        let mut breakouts = Vec::new();
        for bar in bars {
            if let Some(info) = self.add_bar_inner(bar, false)? {
                breakouts.push(info);
            }
        }
        if self.config.use_cache {
            self.autosave();
        }
        Ok(breakouts)
    }

    fn add_bar_inner(&mut self, bar: &Bar, auto_save: bool) -> Result<Option<BreakoutInfo>, BarError> {
        self.validate_bar(bar)?;
        self.series.push(bar);
        let current_idx = self.series.len() - 1;

        // Peaks first: the newest confirmable peak sits at least
        // min_side_bars behind the current bar, so it can already be broken
        // by this same bar.
        if current_idx >= self.config.total_window {
            self.detect_peak_in_window(current_idx);
        }

        let info = self.match_breakouts(current_idx);

        if self.config.use_cache && auto_save && (self.series.len() % 10 == 0 || info.is_some()) {
            self.autosave();
        }

        Ok(info)
    }

    fn validate_bar(&self, bar: &Bar) -> Result<(), BarError> {
        if let Some(prev) = self.series.last_date() {
            if bar.date <= prev {
                return Err(BarError::NonMonotonicDate {
                    prev,
                    next: bar.date,
                });
            }
        }
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BarError::NonPositivePrice { field, value });
            }
        }
        if !bar.volume.is_finite() || bar.volume < 0.0 {
            return Err(BarError::BadVolume { value: bar.volume });
        }
        Ok(())
    }

    /// Breakouts recorded no later than `current_index` and within the
    /// momentum window of it. Always at least 1 (the caller's own breakout
    /// counts itself).
    pub fn recent_breakout_count(&self, current_index: usize) -> usize {
        let count = self
            .breakout_history
            .iter()
            .filter(|h| h.index <= current_index && current_index - h.index <= self.config.momentum_window)
            .count();
        count.max(1)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Full bar history, in arrival order.
    pub fn bars(&self) -> &BarSeries {
        &self.series
    }

    /// Read-only view of the active peak set. Order is not meaningful.
    pub fn active_peaks(&self) -> &[Peak] {
        &self.active_peaks
    }

    pub fn breakout_history(&self) -> &[BreakoutRecord] {
        &self.breakout_history
    }

    pub fn status(&self) -> DetectorStatus {
        DetectorStatus {
            symbol: self.symbol.clone(),
            total_bars: self.series.len(),
            active_peaks_count: self.active_peaks.len(),
            last_date: self.series.last_date(),
            cache_exists: self.config.use_cache && self.snapshot_path().exists(),
        }
    }
}
