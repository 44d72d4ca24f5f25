//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol on a single calendar day.
///
/// The engine assigns each accepted bar a 0-based index; the bar itself
/// carries no index or symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Upper edge of the candle body: `max(open, close)`.
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Read the bar through a price measure.
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::High => self.high,
            Measure::Close => self.close,
            Measure::BodyTop => self.body_top(),
        }
    }

    /// Basic OHLCV sanity check: high >= low, body inside the range,
    /// strictly positive prices, non-negative volume, all fields finite.
    pub fn is_sane(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}

/// How to read a price off a bar.
///
/// `peak_measure` uses one of these when creating peaks; `breakout_modes`
/// is a set of these when confirming breakouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    High,
    Close,
    BodyTop,
}

impl Measure {
    /// One-letter code used in cache-key derivation.
    pub fn code(self) -> char {
        match self {
            Measure::High => 'h',
            Measure::Close => 'c',
            Measure::BodyTop => 'b',
        }
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Measure::High => "high",
            Measure::Close => "close",
            Measure::BodyTop => "body_top",
        };
        f.write_str(s)
    }
}
