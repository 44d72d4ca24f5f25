//! Synthetic bar generation for demos and tests.
//!
//! Two shapes:
//! - a seeded random walk with drift and volatility, for load and
//!   robustness testing;
//! - a scripted resistance-then-breakout pattern with known peak and
//!   breakout positions, for pipeline tests that need predictable events.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use breakscan_core::domain::Bar;

/// Seeded geometric random walk. Same seed, same bars.
pub fn random_walk_bars(
    days: usize,
    start_date: NaiveDate,
    initial_price: f64,
    drift: f64,
    volatility: f64,
    seed: u64,
) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = initial_price;
    (0..days)
        .map(|i| {
            let open = close;
            let shock: f64 = rng.gen_range(-1.0..1.0) * volatility;
            close = (close * (1.0 + drift + shock)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            Bar {
                date: start_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(500.0..5000.0),
            }
        })
        .collect()
}

/// Scripted single-resistance shape over `4 * window` bars: a floor, one
/// spike forming a peak, and a late bar pushing through it.
///
/// With the default detector parameters (window 10) the spike at index
/// `window / 2 + 3` becomes an active peak and the bar at index
/// `3 * window` breaks it past the supersede margin.
pub fn resistance_breakout_bars(
    start_date: NaiveDate,
    floor: f64,
    peak_price: f64,
    breakout_price: f64,
    window: usize,
) -> Vec<Bar> {
    let total = window * 4;
    let peak_at = window / 2 + 3;
    let breakout_at = window * 3;
    (0..total)
        .map(|i| {
            let close = if i == peak_at {
                peak_price
            } else if i == breakout_at {
                breakout_price
            } else {
                floor
            };
            Bar {
                date: start_date + chrono::Duration::days(i as i64),
                open: close,
                high: close + floor * 0.002,
                low: close - floor * 0.005,
                close,
                volume: if i == peak_at || i == breakout_at {
                    3000.0
                } else {
                    1000.0
                },
            }
        })
        .collect()
}
