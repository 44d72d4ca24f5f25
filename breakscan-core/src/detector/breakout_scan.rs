//! Breakout matching — dual-threshold confirmation against the active set.
//!
//! `exceed_threshold` is the sensitive gate that confirms a breakout;
//! `peak_supersede_threshold` is the conservative gate that actually removes
//! a peak. A peak penetrated by less than the supersede margin stays active
//! and can be re-broken (resistance consolidation).

use crate::domain::{BreakoutInfo, BreakoutRecord};

use super::Detector;

impl Detector {
    /// Check the bar at `current_idx` against every active peak. Emits an
    /// event when at least one peak is broken; the active set keeps broken
    /// peaks whose penetration stayed within the supersede margin.
    pub(super) fn match_breakouts(&mut self, current_idx: usize) -> Option<BreakoutInfo> {
        if self.active_peaks.is_empty() {
            return None;
        }

        // Highest price among the selected confirmation measures.
        let breakout_price = self
            .config
            .breakout_modes
            .iter()
            .map(|&m| self.series.measure(current_idx, m))
            .fold(f64::NEG_INFINITY, f64::max);

        let mut broken = Vec::new();
        let mut superseded = Vec::new();
        let mut remaining = Vec::new();

        for mut peak in std::mem::take(&mut self.active_peaks) {
            let confirm_price = peak.price * (1.0 + self.config.exceed_threshold);
            let is_broken = self
                .config
                .breakout_modes
                .iter()
                .any(|&m| self.series.measure(current_idx, m) > confirm_price);

            if !is_broken {
                remaining.push(peak);
                continue;
            }

            peak.right_suppression_days = current_idx - peak.index - 1;
            broken.push(peak.clone());

            if breakout_price <= peak.price * (1.0 + self.config.peak_supersede_threshold) {
                remaining.push(peak);
            } else {
                superseded.push(peak);
            }
        }

        self.active_peaks = remaining;

        if broken.is_empty() {
            return None;
        }

        let date = self.series.date(current_idx);
        self.breakout_history.push(BreakoutRecord {
            index: current_idx,
            date,
            price: breakout_price,
            num_peaks: broken.len(),
        });

        Some(BreakoutInfo {
            index: current_idx,
            price: breakout_price,
            date,
            broken_peaks: broken,
            superseded_peaks: superseded,
        })
    }
}
