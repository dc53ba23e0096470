//! Estimation of the periodicity timescale of an autocorrelogram.
use crate::core::peaks::find_peaks;

/// Returns the number of samples spanned by `duration` given the mean spacing of `times`.
/// Degenerate time axes (fewer than two samples) map to a single sample.
pub fn duration_to_samples(duration: f64, times: &[f64]) -> f64 {
    if times.len() < 2 {
        return 1.0;
    }
    let spacing = (times[times.len() - 1] - times[0]) / (times.len() - 1) as f64;
    (duration / spacing).round().max(1.0)
}

/// Estimate the periodicity timescale of a signal, e.g., the log-autocorrelogram of a unit.
///
/// Peaks at least `min_width` seconds wide (at half prominence) are detected, and the mean
/// spacing between successive peak times is returned.
/// The function returns `None` if fewer than two peaks are found.
///
/// # Examples
///
/// ```rust
/// use spike_periodicity::core::periodicity::estimate_periodicity_timescale;
///
/// let times: Vec<f64> = (0..500).map(|i| i as f64 * 0.001).collect();
/// let values: Vec<f64> = times
///     .iter()
///     .map(|t| (2.0 * std::f64::consts::PI * t / 0.1).cos())
///     .collect();
///
/// let period = estimate_periodicity_timescale(&values, &times, 0.01).unwrap();
/// assert!((period - 0.1).abs() <= 0.001);
///
/// assert_eq!(estimate_periodicity_timescale(&vec![0.0; 500], &times, 0.01), None);
/// ```
pub fn estimate_periodicity_timescale(
    values: &[f64],
    times: &[f64],
    min_width: f64,
) -> Option<f64> {
    let min_width = duration_to_samples(min_width, times);
    let peak_times: Vec<f64> = find_peaks(values, min_width)
        .into_iter()
        .filter_map(|peak| times.get(peak.index).copied())
        .collect();

    if peak_times.len() < 2 {
        return None;
    }

    let intervals: Vec<f64> = peak_times.windows(2).map(|w| w[1] - w[0]).collect();
    Some(intervals.iter().sum::<f64>() / intervals.len() as f64)
}
