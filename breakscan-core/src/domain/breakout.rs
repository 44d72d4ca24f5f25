//! Breakout events — raw detector output, the lightweight history record,
//! and the fully enriched breakout.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::PeakId;
use super::peak::Peak;

/// Raw breakout emitted by the detector, before feature enrichment.
///
/// One bar can break several peaks at once; `broken_peaks` always holds at
/// least one. `superseded_peaks` is the subset removed from the active set
/// because penetration exceeded the supersede threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutInfo {
    /// Bar index of the breakout bar.
    pub index: usize,
    /// Maximum price across the configured breakout modes on this bar.
    pub price: f64,
    pub date: NaiveDate,
    pub broken_peaks: Vec<Peak>,
    pub superseded_peaks: Vec<Peak>,
}

impl BreakoutInfo {
    pub fn num_peaks_broken(&self) -> usize {
        self.broken_peaks.len()
    }

    pub fn broken_peak_ids(&self) -> Vec<PeakId> {
        self.broken_peaks.iter().map(|p| p.id).collect()
    }

    pub fn superseded_peak_ids(&self) -> Vec<PeakId> {
        self.superseded_peaks.iter().map(|p| p.id).collect()
    }

    /// Highest-priced broken peak. `broken_peaks` is non-empty by contract.
    pub fn highest_peak_broken(&self) -> &Peak {
        self.broken_peaks
            .iter()
            .max_by(|a, b| a.price.total_cmp(&b.price))
            .expect("BreakoutInfo holds at least one broken peak")
    }

    pub fn lowest_peak_broken(&self) -> &Peak {
        self.broken_peaks
            .iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
            .expect("BreakoutInfo holds at least one broken peak")
    }

    /// Spread between the highest and lowest broken-peak prices.
    pub fn peak_price_range(&self) -> f64 {
        self.highest_peak_broken().price - self.lowest_peak_broken().price
    }

    pub fn avg_peak_price(&self) -> f64 {
        let sum: f64 = self.broken_peaks.iter().map(|p| p.price).sum();
        sum / self.broken_peaks.len() as f64
    }
}

/// Lightweight breakout log entry, kept for momentum scoring and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutRecord {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub num_peaks: usize,
}

/// Candle shape of the breakout bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakoutKind {
    /// Close above open by at least 1%.
    Yang,
    /// Close below open by at least 1%.
    Yin,
    /// Body under 1% of open — the penetration came from the wick.
    Shadow,
}

/// Fully enriched breakout: detector output plus behavioural features and
/// the eventual quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakout {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub index: usize,

    pub broken_peaks: Vec<Peak>,
    pub superseded_peaks: Vec<Peak>,

    pub kind: BreakoutKind,
    pub price_change_pct: f64,
    pub gap_up: bool,
    pub gap_up_pct: f64,
    pub volume_surge_ratio: f64,
    pub continuity_days: usize,
    pub stability_score: f64,

    /// Wilder ATR at the breakout bar; only set when the feature
    /// calculator runs with an ATR period.
    pub atr_value: Option<f64>,
    /// (breakout price − highest broken-peak price) / ATR.
    pub atr_normalized_height: Option<f64>,
    /// (close[i] − close[i−1]) / ATR.
    pub daily_return_atr_ratio: Option<f64>,

    /// Breakouts inside the momentum window, including this one.
    pub recent_breakout_count: usize,

    /// Forward-return labels keyed `label_{min}_{max}`; `None` when the
    /// forward bars do not exist yet.
    pub labels: BTreeMap<String, Option<f64>>,

    /// Set by the quality scorer.
    pub quality_score: Option<f64>,
}

impl Breakout {
    pub fn num_peaks_broken(&self) -> usize {
        self.broken_peaks.len()
    }

    pub fn broken_peak_ids(&self) -> Vec<PeakId> {
        self.broken_peaks.iter().map(|p| p.id).collect()
    }

    pub fn superseded_peak_ids(&self) -> Vec<PeakId> {
        self.superseded_peaks.iter().map(|p| p.id).collect()
    }

    pub fn highest_peak_broken(&self) -> &Peak {
        self.broken_peaks
            .iter()
            .max_by(|a, b| a.price.total_cmp(&b.price))
            .expect("Breakout holds at least one broken peak")
    }

    pub fn peak_price_range(&self) -> f64 {
        let lo = self
            .broken_peaks
            .iter()
            .map(|p| p.price)
            .fold(f64::INFINITY, f64::min);
        self.highest_peak_broken().price - lo
    }
}
