//! Moving-average smoothing.

/// Returns the number of bins of a smoothing window spanning `duration` for a given bin width.
/// The window always spans at least one bin.
pub fn window_len(duration: f64, bin_width: f64) -> usize {
    ((duration / bin_width).round() as usize).max(1)
}

/// Centered moving average with a window of `window` samples.
///
/// Sample `i` is averaged over `[i - window / 2, i + (window - 1) / 2]`. Near the borders, the
/// window shrinks to the samples available and the average is taken over those only, so that a
/// constant signal stays constant.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }

    let n = values.len();
    let half_left = window / 2;
    let half_right = (window - 1) / 2;

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half_left);
            let hi = (i + half_right).min(n - 1);
            values[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64
        })
        .collect()
}
