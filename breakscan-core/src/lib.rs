//! Breakscan Core — incremental breakout detection for single-symbol bar
//! streams.
//!
//! Three components composed in dataflow order:
//! - [`detector::Detector`] consumes bars one at a time, maintains the
//!   active resistance peaks, and emits [`domain::BreakoutInfo`] events.
//! - [`features::FeatureCalculator`] enriches an event into a full
//!   [`domain::Breakout`] with behavioural features.
//! - [`scoring::QualityScorer`] assigns a multiplicative quality score and
//!   can explain it as a [`scoring::ScoreBreakdown`].
//!
//! The detector optionally persists its state so live monitoring survives
//! process restarts; the calculator and scorer are stateless.

pub mod detector;
pub mod domain;
pub mod features;
pub mod scoring;
