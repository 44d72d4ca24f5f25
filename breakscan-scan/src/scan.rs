//! Per-symbol scan pipeline and the parallel universe scan.
//!
//! One symbol: feed every bar through a fresh detector, enrich and score
//! each breakout, and reconstruct the peak ledger. A universe scan maps the
//! same pipeline over disjoint detectors with rayon; per-symbol failures are
//! counted, never fatal.

use std::collections::BTreeMap;

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use breakscan_core::detector::{BarError, ConfigError, Detector, DetectorConfig};
use breakscan_core::domain::{Bar, Breakout, Peak};
use breakscan_core::features::{FeatureCalculator, FeatureConfig};
use breakscan_core::scoring::{BonusTableError, QualityScorer, ScorerConfig};

use crate::document::{
    BreakoutEntry, PeakEntry, ScanDocument, ScanMetadata, StockScanResult, SummaryStats,
    SCHEMA_VERSION,
};

/// Why a single symbol's scan failed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("detector config: {0}")]
    Config(#[from] ConfigError),

    #[error("scorer config: {0}")]
    Scorer(#[from] BonusTableError),

    #[error("bar rejected: {0}")]
    Bar(#[from] BarError),
}

/// The three parameter groups a scan run carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    pub detector: DetectorConfig,
    pub features: FeatureConfig,
    pub scorer: ScorerConfig,
}

/// Scan one symbol's bars end to end.
pub fn scan_symbol(
    symbol: &str,
    bars: &[Bar],
    params: &ScanParams,
) -> Result<StockScanResult, ScanError> {
    let mut detector = Detector::new(symbol, params.detector.clone())?;
    let calculator = FeatureCalculator::new(params.features.clone());
    let scorer = QualityScorer::new(params.scorer.clone())?;

    let infos = detector.batch_add_bars(bars)?;

    let mut breakouts: Vec<Breakout> = infos
        .iter()
        .map(|info| calculator.enrich(detector.bars(), info, symbol, Some(&detector)))
        .collect();
    scorer.score_batch(&mut breakouts);

    // Peak ledger: every peak seen in a breakout plus the final active set,
    // deduped by id keeping the latest snapshot.
    let mut ledger: BTreeMap<u64, Peak> = BTreeMap::new();
    for info in &infos {
        for peak in info.broken_peaks.iter().chain(&info.superseded_peaks) {
            ledger.insert(peak.id.0, peak.clone());
        }
    }
    for peak in detector.active_peaks() {
        ledger.insert(peak.id.0, peak.clone());
    }
    let active_ids: Vec<u64> = detector.active_peaks().iter().map(|p| p.id.0).collect();
    let all_peaks: Vec<PeakEntry> = ledger
        .into_values()
        .map(|peak| PeakEntry {
            is_active: active_ids.contains(&peak.id.0),
            peak,
        })
        .collect();

    let quality_scores: Vec<f64> = breakouts.iter().filter_map(|b| b.quality_score).collect();
    let avg_quality = if quality_scores.is_empty() {
        0.0
    } else {
        quality_scores.iter().sum::<f64>() / quality_scores.len() as f64
    };
    let max_quality = quality_scores.iter().copied().fold(0.0_f64, f64::max);
    let multi_peak_count = breakouts.iter().filter(|b| b.num_peaks_broken() > 1).count();

    Ok(StockScanResult {
        symbol: symbol.to_string(),
        scan_start_date: bars.first().map(|b| b.date),
        scan_end_date: bars.last().map(|b| b.date),
        data_points: detector.bars().len(),
        active_peaks: detector.active_peaks().len(),
        total_breakouts: breakouts.len(),
        avg_quality,
        max_quality,
        multi_peak_count,
        all_peaks,
        breakouts: breakouts.iter().map(BreakoutEntry::from).collect(),
    })
}

/// Scan a universe of symbols in parallel and assemble the result document.
///
/// Each symbol owns a disjoint detector, so the scan is data-parallel. A
/// failing symbol is logged and counted in `scan_errors`.
pub fn scan_universe(stocks: &[(String, Vec<Bar>)], params: &ScanParams) -> ScanDocument {
    let outcomes: Vec<Result<StockScanResult, ScanError>> = stocks
        .par_iter()
        .map(|(symbol, bars)| scan_symbol(symbol, bars, params))
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut scan_errors = 0;
    for (outcome, (symbol, _)) in outcomes.into_iter().zip(stocks) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "symbol scan failed");
                scan_errors += 1;
            }
        }
    }

    let start_date = results.iter().filter_map(|r| r.scan_start_date).min();
    let end_date = results.iter().filter_map(|r| r.scan_end_date).max();
    let summary_stats = SummaryStats::from_results(&results);

    ScanDocument {
        scan_metadata: ScanMetadata {
            schema_version: SCHEMA_VERSION.to_string(),
            scan_date: Utc::now().to_rfc3339(),
            total_stocks: stocks.len(),
            stocks_scanned: results.len(),
            scan_errors,
            start_date,
            end_date,
            detector_params: params.detector.clone(),
            feature_calculator_params: params.features.clone(),
            quality_scorer_params: params.scorer.clone(),
        },
        results,
        summary_stats,
    }
}
