//! Scan-result documents — the JSON contract with visualisation consumers.
//!
//! Schema 3.0 groups the full parameter sets under `scan_metadata`; 2.0
//! documents (window-only config) are migrated on load by regrouping the
//! detector parameters and filling feature/scorer defaults. Unknown versions
//! are rejected. Saves are atomic (tmp + rename); peaks and breakouts
//! reference each other by peak id within a single stock result.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use breakscan_core::detector::DetectorConfig;
use breakscan_core::domain::{Breakout, BreakoutKind, Peak, PeakId};
use breakscan_core::features::FeatureConfig;
use breakscan_core::scoring::ScorerConfig;

pub const SCHEMA_VERSION: &str = "3.0";

/// Top-level scan result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanDocument {
    pub scan_metadata: ScanMetadata,
    pub results: Vec<StockScanResult>,
    pub summary_stats: SummaryStats,
}

/// Run-level metadata: counts, date range, and every parameter group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub schema_version: String,
    /// ISO-8601 timestamp of the scan run.
    pub scan_date: String,
    pub total_stocks: usize,
    pub stocks_scanned: usize,
    pub scan_errors: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub detector_params: DetectorConfig,
    pub feature_calculator_params: FeatureConfig,
    pub quality_scorer_params: ScorerConfig,
}

/// One symbol's scan outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockScanResult {
    pub symbol: String,
    pub scan_start_date: Option<NaiveDate>,
    pub scan_end_date: Option<NaiveDate>,
    pub data_points: usize,
    pub active_peaks: usize,
    pub total_breakouts: usize,
    pub avg_quality: f64,
    pub max_quality: f64,
    /// Breakouts that broke more than one peak at once.
    pub multi_peak_count: usize,
    pub all_peaks: Vec<PeakEntry>,
    pub breakouts: Vec<BreakoutEntry>,
}

/// Peak ledger row: the peak snapshot plus whether it is still resistance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakEntry {
    #[serde(flatten)]
    pub peak: Peak,
    pub is_active: bool,
}

/// Breakout row; peaks are referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutEntry {
    pub date: NaiveDate,
    pub price: f64,
    pub index: usize,
    pub broken_peak_ids: Vec<PeakId>,
    pub superseded_peak_ids: Vec<PeakId>,
    pub num_peaks_broken: usize,
    #[serde(rename = "type")]
    pub kind: BreakoutKind,
    pub price_change_pct: f64,
    pub gap_up_pct: f64,
    pub volume_surge_ratio: f64,
    pub continuity_days: usize,
    pub stability_score: f64,
    pub quality_score: Option<f64>,
    pub recent_breakout_count: usize,
    pub labels: BTreeMap<String, Option<f64>>,
}

impl From<&Breakout> for BreakoutEntry {
    fn from(b: &Breakout) -> Self {
        Self {
            date: b.date,
            price: b.price,
            index: b.index,
            broken_peak_ids: b.broken_peak_ids(),
            superseded_peak_ids: b.superseded_peak_ids(),
            num_peaks_broken: b.num_peaks_broken(),
            kind: b.kind,
            price_change_pct: b.price_change_pct,
            gap_up_pct: b.gap_up_pct,
            volume_surge_ratio: b.volume_surge_ratio,
            continuity_days: b.continuity_days,
            stability_score: b.stability_score,
            quality_score: b.quality_score,
            recent_breakout_count: b.recent_breakout_count,
            labels: b.labels.clone(),
        }
    }
}

/// Cross-stock aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_breakouts: usize,
    pub stocks_with_breakouts: usize,
    pub avg_breakouts_per_stock: f64,
    pub avg_quality_score: f64,
}

impl SummaryStats {
    pub fn from_results(results: &[StockScanResult]) -> Self {
        let total_breakouts: usize = results.iter().map(|r| r.total_breakouts).sum();
        let stocks_with_breakouts = results.iter().filter(|r| r.total_breakouts > 0).count();

        let quality_scores: Vec<f64> = results
            .iter()
            .flat_map(|r| r.breakouts.iter().filter_map(|b| b.quality_score))
            .collect();
        let avg_quality_score = if quality_scores.is_empty() {
            0.0
        } else {
            quality_scores.iter().sum::<f64>() / quality_scores.len() as f64
        };

        let avg_breakouts_per_stock = if results.is_empty() {
            0.0
        } else {
            total_breakouts as f64 / results.len() as f64
        };

        Self {
            total_breakouts,
            stocks_with_breakouts,
            avg_breakouts_per_stock,
            avg_quality_score,
        }
    }
}

impl ScanDocument {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize scan document")
    }

    /// Write atomically: a `.tmp` sibling is renamed into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e)
                .with_context(|| format!("failed to move scan document into {}", path.display()));
        }
        Ok(())
    }

    /// Parse a document, migrating 2.0 and rejecting unknown versions.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value =
            serde_json::from_str(json).context("scan document is not valid JSON")?;

        let version = value
            .pointer("/scan_metadata/schema_version")
            .and_then(|v| v.as_str())
            .unwrap_or("1.0")
            .to_string();

        match version.as_str() {
            SCHEMA_VERSION => {}
            "2.0" => migrate_v2(&mut value)?,
            other => bail!(
                "unsupported scan document version {other} (max supported: {SCHEMA_VERSION})"
            ),
        }

        serde_json::from_value(value).context("scan document does not match schema 3.0")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// Regroup a 2.0 metadata block into the 3.0 layout.
///
/// 2.0 stored three flat detector keys (`window`, `exceed_threshold`,
/// `peak_merge_threshold`) and nothing for the feature calculator or the
/// scorer; migration fills those with defaults.
fn migrate_v2(value: &mut serde_json::Value) -> Result<()> {
    let metadata = value
        .pointer_mut("/scan_metadata")
        .and_then(|m| m.as_object_mut())
        .context("2.0 document has no scan_metadata object")?;

    let mut detector = DetectorConfig::default();
    if let Some(w) = metadata.remove("window").and_then(|v| v.as_u64()) {
        detector.total_window = w as usize;
    }
    if let Some(t) = metadata.remove("exceed_threshold").and_then(|v| v.as_f64()) {
        detector.exceed_threshold = t;
    }
    if let Some(t) = metadata
        .remove("peak_merge_threshold")
        .and_then(|v| v.as_f64())
    {
        detector.peak_supersede_threshold = t;
    }

    metadata.insert(
        "detector_params".into(),
        serde_json::to_value(&detector).context("migrated detector params")?,
    );
    metadata.insert(
        "feature_calculator_params".into(),
        serde_json::to_value(FeatureConfig::default()).context("default feature params")?,
    );
    metadata.insert(
        "quality_scorer_params".into(),
        serde_json::to_value(ScorerConfig::default()).context("default scorer params")?,
    );
    metadata.insert("schema_version".into(), SCHEMA_VERSION.into());
    Ok(())
}
