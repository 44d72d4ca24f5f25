//! Scan configuration — a TOML file describing the universe, the date
//! range, and all three parameter groups.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scan::ScanParams;

/// A full scan run description, round-trippable through TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Symbols to scan.
    pub universe: Vec<String>,
    /// Inclusive date window applied to ingested bars; open-ended when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Where the scan document is written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Detector, feature-calculator, and scorer parameters.
    #[serde(flatten)]
    pub params: ScanParams,
}

impl ScanConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse scan config TOML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize scan config")
    }

    /// Keep only bars inside the configured date window.
    pub fn clip_bars(&self, bars: &mut Vec<breakscan_core::domain::Bar>) {
        bars.retain(|b| {
            self.start_date.map_or(true, |s| b.date >= s)
                && self.end_date.map_or(true, |e| b.date <= e)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breakscan_core::domain::Measure;

    #[test]
    fn minimal_toml_uses_defaults() {
        let cfg = ScanConfig::from_toml_str("universe = [\"SPY\", \"QQQ\"]").unwrap();
        assert_eq!(cfg.universe, vec!["SPY", "QQQ"]);
        assert_eq!(cfg.params.detector.total_window, 10);
        assert_eq!(cfg.params.features.stability_lookforward, 10);
        assert_eq!(cfg.params.scorer.base_score, 50.0);
    }

    #[test]
    fn parameter_groups_override() {
        let toml = r#"
universe = ["SPY"]
start_date = "2023-01-02"

[detector]
total_window = 14
breakout_modes = ["close", "body_top"]

[features]
continuity_lookback = 3

[scorer]
base_score = 40.0
"#;
        let cfg = ScanConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.params.detector.total_window, 14);
        assert_eq!(
            cfg.params.detector.breakout_modes,
            vec![Measure::Close, Measure::BodyTop]
        );
        assert_eq!(cfg.params.features.continuity_lookback, 3);
        assert_eq!(cfg.params.scorer.base_score, 40.0);
        assert_eq!(
            cfg.start_date,
            Some(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap())
        );
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = ScanConfig::default();
        cfg.universe = vec!["AAPL".into()];
        cfg.params.detector.total_window = 12;
        let toml = cfg.to_toml_string().unwrap();
        let parsed = ScanConfig::from_toml_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn clip_bars_respects_window() {
        use breakscan_core::domain::Bar;
        let mk = |day: u32| Bar {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1000.0,
        };
        let mut bars = vec![mk(2), mk(3), mk(4), mk(5)];
        let cfg = ScanConfig {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 3),
            end_date: NaiveDate::from_ymd_opt(2023, 1, 4),
            ..Default::default()
        };
        cfg.clip_bars(&mut bars);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2023, 1, 3).unwrap());
    }
}
