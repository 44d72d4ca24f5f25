//! Price clustering for the resistance-test bonus.

/// Size of the largest price cluster.
///
/// Prices are sorted ascending; a cluster is a maximal run in which each
/// price sits within `proximity` (fractional) of its lower neighbour. A
/// single price clusters alone.
pub fn largest_cluster_size(prices: &[f64], proximity: f64) -> usize {
    if prices.is_empty() {
        return 0;
    }
    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut best = 1;
    let mut run = 1;
    for pair in sorted.windows(2) {
        if pair[1] - pair[0] <= proximity * pair[0] {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
    }
    best
}
