//! Peak discovery inside the sliding window, plus the supersede reconcile
//! that keeps near-equal peaks coexisting as a resistance zone.

use crate::domain::Peak;

use super::Detector;

/// How far back `left_suppression_days` may scan from the peak bar.
const LEFT_SUPPRESSION_CAP: usize = 60;

/// Lookback for the peak-bar volume surge ratio.
const VOLUME_BASELINE_BARS: usize = 63;

impl Detector {
    /// Examine the `total_window` bars preceding `current_idx` and create a
    /// peak when the window's interior maximum clears the relative-height
    /// floor. Runs after the current bar has been appended, so the window is
    /// `[current_idx - total_window, current_idx)`.
    pub(super) fn detect_peak_in_window(&mut self, current_idx: usize) {
        let w = self.config.total_window;
        let window_start = current_idx - w;

        // First (left-most) maximum of the measure price wins ties.
        let mut max_local = 0usize;
        let mut max_measure = self.series.measure(window_start, self.config.peak_measure);
        for local in 1..w {
            let value = self.series.measure(window_start + local, self.config.peak_measure);
            if value > max_measure {
                max_measure = value;
                max_local = local;
            }
        }

        // The maximum must have min_side_bars of confirmation on each side.
        if max_local < self.config.min_side_bars || max_local >= w - self.config.min_side_bars {
            return;
        }

        let peak_idx = window_start + max_local;
        if self.active_peaks.iter().any(|p| p.index == peak_idx) {
            return;
        }

        let window_min_low = self.series.min_low(window_start..current_idx);
        let acceptance_height = (max_measure - window_min_low) / window_min_low;
        if acceptance_height < self.config.min_relative_height {
            return;
        }

        let peak = self.create_peak(peak_idx, max_measure, current_idx);
        self.reconcile_active_peaks(peak);
    }

    fn create_peak(&mut self, idx: usize, price: f64, current_idx: usize) -> Peak {
        let volume_surge_ratio = {
            let start = idx.saturating_sub(VOLUME_BASELINE_BARS);
            match self.series.mean_volume(start..idx) {
                Some(mean) if mean > 0.0 => self.series.volume(idx) / mean,
                _ => 1.0,
            }
        };

        let candle_change_pct =
            (self.series.close(idx) - self.series.open(idx)) / self.series.open(idx);

        let left_suppression_days = (0..idx)
            .rev()
            .take(LEFT_SUPPRESSION_CAP)
            .take_while(|&i| self.series.high(i) < price)
            .count();

        // Symmetric half-window on each side; the right edge may reach the
        // bar being processed.
        let side_bars = self.config.total_window / 2;
        let left_start = idx.saturating_sub(side_bars);
        let right_end = (idx + side_bars + 1).min(current_idx + 1);
        let window_low = self.series.min_low(left_start..right_end);
        let relative_height = (price - window_low) / window_low;

        Peak {
            id: self.id_gen.next_id(),
            index: idx,
            price,
            date: self.series.date(idx),
            volume_surge_ratio,
            candle_change_pct,
            left_suppression_days,
            right_suppression_days: 0,
            relative_height,
        }
    }

    /// Keep an old peak iff it is higher than the new one, or lower by less
    /// than the supersede threshold (the pair then forms a resistance zone).
    fn reconcile_active_peaks(&mut self, new_peak: Peak) {
        let threshold = self.config.peak_supersede_threshold;
        self.active_peaks.retain(|old| {
            old.price > new_peak.price
                || (new_peak.price - old.price) / old.price < threshold
        });
        self.active_peaks.push(new_peak);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::detector::{Detector, DetectorConfig};
    use crate::domain::Bar;

    /// Flat bars at `close`, except shaping the peak pattern by index.
    fn flat_bar(day: usize, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap() + chrono::Duration::days(day as i64),
            open: close,
            high: close + 0.2,
            low: close - 0.2,
            close,
            volume: 1000.0,
        }
    }

    fn detector() -> Detector {
        Detector::new("TEST", DetectorConfig::default()).unwrap()
    }

    /// 100-flat bars with a spike to 110 at index 5: the window around the
    /// spike confirms a peak once two bars stand to its right inside the
    /// full window.
    #[test]
    fn discovers_interior_window_maximum() {
        let mut d = detector();
        for day in 0..12 {
            let close = if day == 5 { 110.0 } else { 100.0 };
            d.add_bar(&flat_bar(day, close)).unwrap();
        }
        assert_eq!(d.active_peaks().len(), 1);
        let peak = &d.active_peaks()[0];
        assert_eq!(peak.index, 5);
        assert_eq!(peak.price, 110.0);
        assert_eq!(peak.left_suppression_days, 5);
        assert_eq!(peak.right_suppression_days, 0);
    }

    /// A maximum sitting in the window tail has no right-side confirmation
    /// yet; it is only accepted once the window has slid past it.
    #[test]
    fn rejects_edge_maximum_until_confirmed() {
        let mut d = detector();
        for day in 0..10 {
            d.add_bar(&flat_bar(day, 100.0)).unwrap();
        }
        d.add_bar(&flat_bar(10, 110.0)).unwrap();
        assert!(d.active_peaks().is_empty());
        d.add_bar(&flat_bar(11, 100.0)).unwrap();
        assert!(d.active_peaks().is_empty());
        d.add_bar(&flat_bar(12, 100.0)).unwrap();
        assert!(d.active_peaks().is_empty());
        // Two bars now stand to the right of the spike inside the window.
        d.add_bar(&flat_bar(13, 100.0)).unwrap();
        assert_eq!(d.active_peaks().len(), 1);
        assert_eq!(d.active_peaks()[0].index, 10);
    }

    #[test]
    fn rejects_flat_window_below_relative_height() {
        let mut d = detector();
        for day in 0..20 {
            // 2% above the floor — under the 5% relative-height minimum.
            let close = if day == 5 { 102.0 } else { 100.0 };
            d.add_bar(&flat_bar(day, close)).unwrap();
        }
        assert!(d.active_peaks().is_empty());
    }

    #[test]
    fn near_equal_peaks_coexist() {
        let mut d = detector();
        let mut day = 0;
        // First peak at 100 (floor 90 gives ~11% relative height).
        for &close in &[90.0, 90.0, 90.0, 90.0, 90.0, 100.0, 90.0, 90.0, 90.0, 90.0, 90.0, 90.0] {
            d.add_bar(&flat_bar(day, close)).unwrap();
            day += 1;
        }
        assert_eq!(d.active_peaks().len(), 1);
        // Second peak 2% higher: within the 3% supersede threshold, coexists.
        for &close in &[90.0, 90.0, 102.0, 90.0, 90.0, 90.0, 90.0, 90.0, 90.0, 90.0] {
            d.add_bar(&flat_bar(day, close)).unwrap();
            day += 1;
        }
        assert_eq!(d.active_peaks().len(), 2);
    }

    /// With close-mode confirmation, an upper wick never breaks anything, so
    /// a clearly higher wick peak displaces the older one through the
    /// reconcile step rather than through a breakout.
    #[test]
    fn clearly_higher_peak_supersedes_older() {
        let cfg = DetectorConfig {
            peak_measure: crate::domain::Measure::High,
            breakout_modes: vec![crate::domain::Measure::Close],
            ..Default::default()
        };
        let mut d = Detector::new("TEST", cfg).unwrap();
        let wick = |day: usize, high: f64| Bar {
            date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
                + chrono::Duration::days(day as i64),
            open: 90.0,
            high,
            low: 89.8,
            close: 90.0,
            volume: 1000.0,
        };
        let mut day = 0;
        for &high in &[90.2, 90.2, 90.2, 90.2, 90.2, 100.0, 90.2, 90.2, 90.2, 90.2, 90.2, 90.2] {
            d.add_bar(&wick(day, high)).unwrap();
            day += 1;
        }
        assert_eq!(d.active_peaks().len(), 1);
        assert_eq!(d.active_peaks()[0].price, 100.0);
        // A wick 10% above the old peak: no close breakout, but once the new
        // peak confirms, the old one is dropped.
        for &high in &[90.2, 90.2, 110.0, 90.2, 90.2, 90.2, 90.2, 90.2, 90.2, 90.2] {
            d.add_bar(&wick(day, high)).unwrap();
            day += 1;
        }
        assert_eq!(d.active_peaks().len(), 1);
        assert_eq!(d.active_peaks()[0].price, 110.0);
        assert!(d.breakout_history().is_empty());
    }
}
