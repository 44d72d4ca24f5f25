//! Detector configuration — explicit, validated at construction, immutable
//! afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Measure;

/// Errors raised while validating a configuration record.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("min_side_bars ({min_side_bars}) * 2 exceeds total_window ({total_window})")]
    WindowTooSmall {
        total_window: usize,
        min_side_bars: usize,
    },

    #[error("total_window must be at least 1")]
    EmptyWindow,

    #[error("breakout_modes must not be empty")]
    NoBreakoutModes,

    #[error("{name} must be finite, got {value}")]
    NonFiniteThreshold { name: &'static str, value: f64 },
}

/// Tuning knobs of the per-bar detector state machine.
///
/// A snapshot on disk is only restored when its stored configuration equals
/// the configuration of the detector being constructed; `PartialEq` here is
/// that gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Size of the sliding window examined for new peaks.
    pub total_window: usize,
    /// Minimum bars the peak must stand above on each side of the window.
    pub min_side_bars: usize,
    /// Minimum (peak − window low) / window low for acceptance.
    pub min_relative_height: f64,
    /// Fractional margin above a peak that confirms a breakout.
    pub exceed_threshold: f64,
    /// Fractional margin above a peak that removes it from the active set.
    pub peak_supersede_threshold: f64,
    /// Measure used to price a peak at creation.
    pub peak_measure: Measure,
    /// Measures checked for breakout confirmation; any one suffices.
    pub breakout_modes: Vec<Measure>,
    /// Lookback in bars for the recent-breakout count.
    pub momentum_window: usize,
    /// Persist detector state across restarts.
    pub use_cache: bool,
    /// Directory holding snapshot blobs and their metadata sidecars.
    pub cache_dir: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            total_window: 10,
            min_side_bars: 2,
            min_relative_height: 0.05,
            exceed_threshold: 0.005,
            peak_supersede_threshold: 0.03,
            peak_measure: Measure::BodyTop,
            breakout_modes: vec![Measure::BodyTop],
            momentum_window: 20,
            use_cache: false,
            cache_dir: PathBuf::from("./cache"),
        }
    }
}

impl DetectorConfig {
    /// Check construction preconditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_window == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.min_side_bars * 2 > self.total_window {
            return Err(ConfigError::WindowTooSmall {
                total_window: self.total_window,
                min_side_bars: self.min_side_bars,
            });
        }
        if self.breakout_modes.is_empty() {
            return Err(ConfigError::NoBreakoutModes);
        }
        for (name, value) in [
            ("min_relative_height", self.min_relative_height),
            ("exceed_threshold", self.exceed_threshold),
            ("peak_supersede_threshold", self.peak_supersede_threshold),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold { name, value });
            }
        }
        Ok(())
    }

    /// File stem keying the snapshot for `symbol` under this configuration:
    /// `{safe_symbol}_tw{W}_ms{S}_pm{M}_bm{sorted_modes}`.
    pub fn cache_file_stem(&self, symbol: &str) -> String {
        let safe_symbol = symbol.replace('/', "_");
        let mut mode_codes: Vec<char> = self.breakout_modes.iter().map(|m| m.code()).collect();
        mode_codes.sort_unstable();
        mode_codes.dedup();
        let bm: String = mode_codes.into_iter().collect();
        format!(
            "{safe_symbol}_tw{}_ms{}_pm{}_bm{bm}",
            self.total_window,
            self.min_side_bars,
            self.peak_measure.code(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_window_smaller_than_sides() {
        let cfg = DetectorConfig {
            total_window: 3,
            min_side_bars: 2,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::WindowTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_empty_breakout_modes() {
        let cfg = DetectorConfig {
            breakout_modes: vec![],
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::NoBreakoutModes)));
    }

    #[test]
    fn rejects_non_finite_threshold() {
        let cfg = DetectorConfig {
            exceed_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonFiniteThreshold { name: "exceed_threshold", .. })
        ));
    }

    #[test]
    fn cache_stem_encodes_params() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.cache_file_stem("600519.SH"), "600519.SH_tw10_ms2_pmb_bmb");
    }

    #[test]
    fn cache_stem_sanitizes_and_sorts_modes() {
        let cfg = DetectorConfig {
            breakout_modes: vec![Measure::High, Measure::BodyTop, Measure::Close],
            ..Default::default()
        };
        assert_eq!(cfg.cache_file_stem("BRK/A"), "BRK_A_tw10_ms2_pmb_bmbch");
    }

    #[test]
    fn config_json_roundtrip_with_defaults() {
        let cfg: DetectorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DetectorConfig::default());
    }
}
