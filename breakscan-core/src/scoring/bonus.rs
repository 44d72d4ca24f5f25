//! Step-function bonus tables.
//!
//! A table maps a raw value to a multiplier: the multiplier of the largest
//! threshold the value reaches, or 1.0 when it reaches none.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed bonus table, caught when the scorer is constructed.
#[derive(Debug, Error)]
pub enum BonusTableError {
    #[error("{table}: thresholds and multipliers must be equal-length and non-empty")]
    LengthMismatch { table: &'static str },

    #[error("{table}: thresholds must be finite and ascending")]
    BadThresholds { table: &'static str },

    #[error("{table}: multipliers must be finite and >= 1.0")]
    BadMultipliers { table: &'static str },
}

/// Thresholds `t₁ ≤ t₂ ≤ …` with one multiplier per threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusTable {
    pub thresholds: Vec<f64>,
    pub multipliers: Vec<f64>,
}

/// Result of one table lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusHit {
    pub multiplier: f64,
    /// The threshold the raw value reached; `None` means untriggered.
    pub threshold_hit: Option<f64>,
}

impl BonusHit {
    pub fn triggered(&self) -> bool {
        self.threshold_hit.is_some()
    }
}

impl BonusTable {
    pub fn new(thresholds: Vec<f64>, multipliers: Vec<f64>) -> Self {
        Self {
            thresholds,
            multipliers,
        }
    }

    /// Check table shape; `table` names the field in error messages.
    pub fn validate(&self, table: &'static str) -> Result<(), BonusTableError> {
        if self.thresholds.is_empty() || self.thresholds.len() != self.multipliers.len() {
            return Err(BonusTableError::LengthMismatch { table });
        }
        let ascending = self
            .thresholds
            .windows(2)
            .all(|w| w[0] <= w[1]);
        if !ascending || self.thresholds.iter().any(|t| !t.is_finite()) {
            return Err(BonusTableError::BadThresholds { table });
        }
        if self.multipliers.iter().any(|v| !v.is_finite() || *v < 1.0) {
            return Err(BonusTableError::BadMultipliers { table });
        }
        Ok(())
    }

    /// Multiplier of the largest threshold `x` reaches; 1.0 below the first.
    pub fn lookup(&self, x: f64) -> BonusHit {
        let mut hit = None;
        for (t, v) in self.thresholds.iter().zip(&self.multipliers) {
            if x >= *t {
                hit = Some((*t, *v));
            } else {
                break;
            }
        }
        match hit {
            Some((t, v)) => BonusHit {
                multiplier: v,
                threshold_hit: Some(t),
            },
            None => BonusHit {
                multiplier: 1.0,
                threshold_hit: None,
            },
        }
    }
}
