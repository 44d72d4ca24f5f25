//! Peak — a historical local maximum acting as a resistance level.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::PeakId;

/// A resistance peak held in the detector's active set.
///
/// Peaks are cheap value snapshots: breakout events carry clones, never
/// references back into detector state. After creation the only field that
/// changes is `right_suppression_days`, written when the peak is broken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub id: PeakId,
    /// Bar index at which the peak sits.
    pub index: usize,
    /// Measure price at the peak bar (per the detector's `peak_measure`).
    pub price: f64,
    pub date: NaiveDate,
    /// Volume on the peak bar / mean volume of the prior up-to-63 bars.
    pub volume_surge_ratio: f64,
    /// (close − open) / open on the peak bar.
    pub candle_change_pct: f64,
    /// Consecutive prior bars whose high stayed below the peak price.
    pub left_suppression_days: usize,
    /// Bars between the peak and the bar that broke it; 0 until broken.
    pub right_suppression_days: usize,
    /// (price − local window min low) / that min low.
    pub relative_height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_serialization_roundtrip() {
        let peak = Peak {
            id: PeakId(3),
            index: 17,
            price: 110.5,
            date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            volume_surge_ratio: 2.4,
            candle_change_pct: 0.031,
            left_suppression_days: 12,
            right_suppression_days: 0,
            relative_height: 0.08,
        };
        let json = serde_json::to_string(&peak).unwrap();
        let deser: Peak = serde_json::from_str(&json).unwrap();
        assert_eq!(peak, deser);
    }
}
