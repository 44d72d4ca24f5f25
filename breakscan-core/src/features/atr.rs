//! Average True Range over a bar series.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR uses Wilder smoothing (EMA with alpha = 1/period), seeded from the
//! mean of the first `period` proper true ranges.

use crate::domain::BarSeries;

/// True Range series. TR[0] has no previous close and is left NaN so the
/// Wilder seed starts from TR[1].
pub fn true_range(series: &BarSeries) -> Vec<f64> {
    let n = series.len();
    let mut tr = vec![f64::NAN; n];
    for i in 1..n {
        let h = series.high(i);
        let l = series.low(i);
        let pc = series.close(i - 1);
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// Wilder-smoothed ATR. Values before the seed forms are NaN; with fewer
/// than `period + 1` bars the whole series is NaN.
pub fn wilder_atr(series: &BarSeries, period: usize) -> Vec<f64> {
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let tr = true_range(series);
    let seed_end = 1 + period;
    let seed = tr[1..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for i in seed_end..n {
        prev = alpha * tr[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}
