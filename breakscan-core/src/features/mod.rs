//! Feature enrichment — turns a raw `BreakoutInfo` into a full `Breakout`.
//!
//! Stateless over its inputs: the calculator must observe the same bar
//! series the detector used to produce the event. Missing history never
//! raises; every feature has a documented neutral fallback.

pub mod atr;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::domain::{BarSeries, Breakout, BreakoutInfo, BreakoutKind};

/// Baseline window for the breakout-bar volume surge ratio.
const VOLUME_BASELINE_BARS: usize = 63;

/// Body-to-open ratio under which a bar counts as a shadow candle.
const SHADOW_BODY_RATIO: f64 = 0.01;

/// Forward-return label window: return from `min_days` to `max_days` after
/// the breakout bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub min_days: usize,
    pub max_days: usize,
}

impl LabelConfig {
    pub fn key(&self) -> String {
        format!("label_{}_{}", self.min_days, self.max_days)
    }
}

/// Feature calculator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Forward bars inspected for the stability score.
    pub stability_lookforward: usize,
    /// Backward bars inspected for the yang-candle streak.
    pub continuity_lookback: usize,
    /// Forward-return labels to compute; empty disables labelling.
    pub label_configs: Vec<LabelConfig>,
    /// Wilder ATR period; `None` leaves the ATR fields unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_period: Option<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            stability_lookforward: 10,
            continuity_lookback: 5,
            label_configs: Vec::new(),
            atr_period: None,
        }
    }
}

/// Stateless enrichment pass over detector events.
#[derive(Debug, Clone, Default)]
pub struct FeatureCalculator {
    config: FeatureConfig,
}

impl FeatureCalculator {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Enrich one breakout. `detector` supplies the recent-breakout count;
    /// without it the count is the neutral 1.
    pub fn enrich(
        &self,
        series: &BarSeries,
        info: &BreakoutInfo,
        symbol: &str,
        detector: Option<&Detector>,
    ) -> Breakout {
        let i = info.index;
        let open = series.open(i);
        let close = series.close(i);

        let kind = classify_kind(open, close);

        let price_change_pct = if open > 0.0 { (close - open) / open } else { 0.0 };

        let (gap_up, gap_up_pct) = if i > 0 {
            let prev_close = series.close(i - 1);
            let gap_up = open > prev_close;
            let pct = if gap_up && prev_close > 0.0 {
                (open - prev_close) / prev_close
            } else {
                0.0
            };
            (gap_up, pct)
        } else {
            (false, 0.0)
        };

        let volume_surge_ratio = {
            let start = i.saturating_sub(VOLUME_BASELINE_BARS);
            match series.mean_volume(start..i) {
                Some(mean) if mean > 0.0 => series.volume(i) / mean,
                _ => 1.0,
            }
        };

        let continuity_days = self.continuity_days(series, i);

        let peak_price = info.highest_peak_broken().price;
        let stability_score = self.stability_score(series, i, peak_price);

        let recent_breakout_count = detector.map_or(1, |d| d.recent_breakout_count(i));

        let labels = self.forward_labels(series, i);

        let (atr_value, atr_normalized_height, daily_return_atr_ratio) =
            self.atr_features(series, i, info.price, peak_price);

        Breakout {
            symbol: symbol.to_string(),
            date: info.date,
            price: info.price,
            index: i,
            broken_peaks: info.broken_peaks.clone(),
            superseded_peaks: info.superseded_peaks.clone(),
            kind,
            price_change_pct,
            gap_up,
            gap_up_pct,
            volume_surge_ratio,
            continuity_days,
            stability_score,
            atr_value,
            atr_normalized_height,
            daily_return_atr_ratio,
            recent_breakout_count,
            labels,
            quality_score: None,
        }
    }

    /// Consecutive yang bars ending at `i`, scanning back at most
    /// `continuity_lookback` bars and stopping at the first non-yang bar.
    fn continuity_days(&self, series: &BarSeries, i: usize) -> usize {
        let stop = i.saturating_sub(self.config.continuity_lookback);
        let mut days = 0;
        let mut j = i;
        while j > stop {
            if series.close(j) > series.open(j) {
                days += 1;
                j -= 1;
            } else {
                break;
            }
        }
        days
    }

    /// Share of the next `stability_lookforward` bars whose low holds at or
    /// above the broken peak price, as a percentage. Neutral 50.0 when no
    /// forward bars exist yet.
    fn stability_score(&self, series: &BarSeries, i: usize, peak_price: f64) -> f64 {
        let end = (i + self.config.stability_lookforward + 1).min(series.len());
        let total = end.saturating_sub(i + 1);
        if total == 0 {
            return 50.0;
        }
        let stable = (i + 1..end)
            .filter(|&j| series.low(j) >= peak_price)
            .count();
        (stable as f64 / total as f64) * 100.0
    }

    fn forward_labels(&self, series: &BarSeries, i: usize) -> BTreeMap<String, Option<f64>> {
        let mut labels = BTreeMap::new();
        for cfg in &self.config.label_configs {
            let value = if i + cfg.max_days < series.len() {
                let base = series.close(i + cfg.min_days);
                if base > 0.0 {
                    Some((series.close(i + cfg.max_days) - base) / base)
                } else {
                    None
                }
            } else {
                None
            };
            labels.insert(cfg.key(), value);
        }
        labels
    }

    fn atr_features(
        &self,
        series: &BarSeries,
        i: usize,
        breakout_price: f64,
        peak_price: f64,
    ) -> (Option<f64>, Option<f64>, Option<f64>) {
        let Some(period) = self.config.atr_period else {
            return (None, None, None);
        };
        let atr = atr::wilder_atr(series, period);
        let value = atr[i];
        if !value.is_finite() || value <= 0.0 {
            return (None, None, None);
        }
        let normalized_height = (breakout_price - peak_price) / value;
        let daily_return_ratio = if i > 0 {
            Some((series.close(i) - series.close(i - 1)) / value)
        } else {
            None
        };
        (Some(value), Some(normalized_height), daily_return_ratio)
    }
}

fn classify_kind(open: f64, close: f64) -> BreakoutKind {
    if open <= 0.0 {
        return BreakoutKind::Shadow;
    }
    let body_ratio = ((close - open) / open).abs();
    if body_ratio < SHADOW_BODY_RATIO {
        BreakoutKind::Shadow
    } else if close > open {
        BreakoutKind::Yang
    } else {
        BreakoutKind::Yin
    }
}
