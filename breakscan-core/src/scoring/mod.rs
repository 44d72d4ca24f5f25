//! Quality scoring — a base score times eight independent bonus multipliers.
//!
//! Four bonuses describe the resistance being broken (age, tested count,
//! height, peak-bar volume) and four describe the breakout bar's own
//! behaviour (volume, gap, continuity, momentum). Every multiplier is >= 1,
//! so the quality score never drops below the base.

pub mod bonus;
pub mod cluster;

use serde::{Deserialize, Serialize};

use crate::domain::{Breakout, PeakId};

pub use bonus::{BonusHit, BonusTable, BonusTableError};

/// Scorer configuration: the base score and one step table per bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub base_score: f64,

    /// Age in bars of the oldest broken peak.
    pub age_bonus: BonusTable,
    /// Size of the largest price-clustered subset of the broken peaks.
    pub test_bonus: BonusTable,
    /// Max relative height across the broken peaks.
    pub height_bonus: BonusTable,
    /// Max volume surge ratio across the broken peaks.
    pub peak_volume_bonus: BonusTable,
    /// Breakout bar's own volume surge ratio.
    pub volume_bonus: BonusTable,
    /// Gap-up percentage (0 when the bar did not gap up).
    pub gap_bonus: BonusTable,
    /// Consecutive yang bars into the breakout.
    pub continuity_bonus: BonusTable,
    /// Breakouts inside the momentum window, including this one.
    pub momentum_bonus: BonusTable,

    /// Clustering proximity used by `test_bonus` when
    /// `cluster_density_threshold` is unset. Kept equal to the detector's
    /// supersede threshold by default so "tested resistance" and "retained
    /// resistance" mean the same price band.
    pub peak_supersede_threshold: f64,
    /// Explicit clustering proximity; `None` falls back to
    /// `peak_supersede_threshold`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_density_threshold: Option<f64>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            base_score: 50.0,
            age_bonus: BonusTable::new(vec![21.0, 63.0, 252.0], vec![1.15, 1.30, 1.50]),
            test_bonus: BonusTable::new(vec![2.0, 3.0, 4.0], vec![1.10, 1.25, 1.40]),
            height_bonus: BonusTable::new(vec![0.10, 0.20], vec![1.15, 1.30]),
            peak_volume_bonus: BonusTable::new(vec![2.0, 4.0], vec![1.15, 1.30]),
            volume_bonus: BonusTable::new(vec![1.5, 2.0], vec![1.15, 1.30]),
            gap_bonus: BonusTable::new(vec![0.01, 0.02], vec![1.10, 1.20]),
            continuity_bonus: BonusTable::new(vec![3.0], vec![1.15]),
            momentum_bonus: BonusTable::new(vec![2.0], vec![1.20]),
            peak_supersede_threshold: 0.03,
            cluster_density_threshold: None,
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<(), BonusTableError> {
        for (name, table) in self.tables() {
            table.validate(name)?;
        }
        Ok(())
    }

    fn tables(&self) -> [(&'static str, &BonusTable); 8] {
        [
            ("age_bonus", &self.age_bonus),
            ("test_bonus", &self.test_bonus),
            ("height_bonus", &self.height_bonus),
            ("peak_volume_bonus", &self.peak_volume_bonus),
            ("volume_bonus", &self.volume_bonus),
            ("gap_bonus", &self.gap_bonus),
            ("continuity_bonus", &self.continuity_bonus),
            ("momentum_bonus", &self.momentum_bonus),
        ]
    }

    fn cluster_proximity(&self) -> f64 {
        self.cluster_density_threshold
            .unwrap_or(self.peak_supersede_threshold)
    }
}

/// One row of a score explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusBreakdown {
    pub name: &'static str,
    pub raw_value: f64,
    pub threshold_hit: Option<f64>,
    pub multiplier: f64,
    pub triggered: bool,
}

/// Full score explanation; the same structure backs tests and UI tooltips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub bonuses: Vec<BonusBreakdown>,
    pub total: f64,
    pub broken_peak_ids: Vec<PeakId>,
}

/// Stateless quality scorer.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScorerConfig,
}

impl QualityScorer {
    /// Build a scorer; fails on a malformed bonus table.
    pub fn new(config: ScorerConfig) -> Result<Self, BonusTableError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score one breakout in place. Scoring is a pure function of the
    /// enriched features, so repeating it never changes the result.
    pub fn score(&self, breakout: &mut Breakout) {
        breakout.quality_score = Some(self.breakdown(breakout).total);
    }

    pub fn score_batch(&self, breakouts: &mut [Breakout]) {
        for b in breakouts {
            self.score(b);
        }
    }

    /// Explain the score of a breakout without mutating it.
    pub fn breakdown(&self, breakout: &Breakout) -> ScoreBreakdown {
        let raws = self.raw_values(breakout);
        let mut bonuses = Vec::with_capacity(raws.len());
        let mut total = self.config.base_score;

        for ((name, table), raw) in self.config.tables().into_iter().zip(raws) {
            let hit = table.lookup(raw);
            total *= hit.multiplier;
            bonuses.push(BonusBreakdown {
                name,
                raw_value: raw,
                threshold_hit: hit.threshold_hit,
                multiplier: hit.multiplier,
                triggered: hit.triggered(),
            });
        }

        ScoreBreakdown {
            base: self.config.base_score,
            bonuses,
            total,
            broken_peak_ids: breakout.broken_peak_ids(),
        }
    }

    /// Raw bonus inputs, in the same order as `ScorerConfig::tables`.
    fn raw_values(&self, b: &Breakout) -> [f64; 8] {
        let oldest_index = b
            .broken_peaks
            .iter()
            .map(|p| p.index)
            .min()
            .unwrap_or(b.index);
        let age = (b.index - oldest_index) as f64;

        let peak_prices: Vec<f64> = b.broken_peaks.iter().map(|p| p.price).collect();
        let tested = cluster::largest_cluster_size(&peak_prices, self.config.cluster_proximity());

        let max_height = b
            .broken_peaks
            .iter()
            .map(|p| p.relative_height)
            .fold(0.0_f64, f64::max);
        let max_peak_volume = b
            .broken_peaks
            .iter()
            .map(|p| p.volume_surge_ratio)
            .fold(0.0_f64, f64::max);

        let gap = if b.gap_up { b.gap_up_pct } else { 0.0 };

        [
            age,
            tested as f64,
            max_height,
            max_peak_volume,
            b.volume_surge_ratio,
            gap,
            b.continuity_days as f64,
            b.recent_breakout_count as f64,
        ]
    }
}
