//! Pairwise-delay histograms (autocorrelograms) of spike trains.
//!
//! The autocorrelogram of a sorted spike train `x` counts all delays `x_i - x_j` with `i >= j`
//! falling within the histogram range, adds a small epsilon to every bin, smooths the counts
//! with a moving average and normalizes the result to sum to one.
//!
//! # Examples
//!
//! ```rust
//! use spike_periodicity::core::histogram::{Autocorrelogram, BinEdges, HistogramOptions};
//!
//! let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
//! let options = HistogramOptions::default_for(&edges);
//!
//! let acg = Autocorrelogram::build(&[0.0, 0.1, 0.2, 0.3], &edges, &options);
//! assert_eq!(acg.values().len(), edges.num_bins());
//! assert!((acg.values().iter().sum::<f64>() - 1.0).abs() < 1e-9);
//! ```
use serde::{Deserialize, Serialize};

use crate::core::smoothing::{moving_average, window_len};
use crate::core::{HISTOGRAM_EPSILON, SMOOTHING_DURATION};
use crate::error::AnalysisError;

/// Strictly increasing histogram bin edges `e_0 < e_1 < ... < e_k`, defining `k` bins.
/// Bin `i` covers `[e_i, e_{i+1})`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Create bin edges from explicit values, which must be finite and strictly increasing.
    pub fn new(edges: Vec<f64>) -> Result<Self, AnalysisError> {
        if edges.len() < 2 {
            return Err(AnalysisError::InvalidBinEdges(
                "at least two edges are required".to_string(),
            ));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(AnalysisError::InvalidBinEdges(
                "edges must be finite".to_string(),
            ));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AnalysisError::InvalidBinEdges(
                "edges must be strictly increasing".to_string(),
            ));
        }
        Ok(BinEdges { edges })
    }

    /// Evenly spaced edges `start, start + step, ...` strictly below `stop`.
    pub fn uniform(start: f64, stop: f64, step: f64) -> Result<Self, AnalysisError> {
        if !(step > 0.0) || !(stop > start) {
            return Err(AnalysisError::InvalidBinEdges(format!(
                "cannot build edges from {} to {} with step {}",
                start, stop, step
            )));
        }
        let num_edges = ((stop - start) / step).ceil() as usize;
        BinEdges::new((0..num_edges).map(|i| start + i as f64 * step).collect())
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges[..]
    }

    pub fn num_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// The lowest edge.
    pub fn lower(&self) -> f64 {
        self.edges[0]
    }

    /// The highest edge; values at or above are outside the histogram.
    pub fn upper(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    pub fn mean_width(&self) -> f64 {
        (self.upper() - self.lower()) / self.num_bins() as f64
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|w| w[0] + (w[1] - w[0]) / 2.0)
            .collect()
    }

    /// The index of the bin containing `value`, if any.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if !(value >= self.lower() && value < self.upper()) {
            return None;
        }
        Some(self.edges.partition_point(|e| *e <= value) - 1)
    }
}

/// Which pairs of spikes contribute a delay.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelaySet {
    /// All pairs `i >= j`, including the zero delay of each spike with itself.
    #[default]
    IncludeSelf,
    /// All pairs `i > j`.
    ExcludeSelf,
}

/// Options of the autocorrelogram construction.
#[derive(Debug, PartialEq, Clone)]
pub struct HistogramOptions {
    /// Value added to every bin before smoothing.
    pub epsilon: f64,
    /// Length of the moving-average window, in bins.
    pub smoothing_window: usize,
    pub delays: DelaySet,
}

impl HistogramOptions {
    /// Options with a smoothing window spanning `smoothing_duration` seconds of the given edges.
    pub fn new(edges: &BinEdges, smoothing_duration: f64, epsilon: f64, delays: DelaySet) -> Self {
        HistogramOptions {
            epsilon,
            smoothing_window: window_len(smoothing_duration, edges.mean_width()),
            delays,
        }
    }

    /// Options with the default epsilon and smoothing duration, all delays included.
    pub fn default_for(edges: &BinEdges) -> Self {
        HistogramOptions::new(
            edges,
            SMOOTHING_DURATION,
            HISTOGRAM_EPSILON,
            DelaySet::IncludeSelf,
        )
    }
}

/// Count the pairwise delays `times[i] - times[j]` (`i >= j`, or `i > j`) per bin.
/// The times must be sorted: each row stops as soon as delays leave the histogram range.
pub fn delay_counts(times: &[f64], edges: &BinEdges, delays: DelaySet) -> Vec<u64> {
    let mut counts = vec![0_u64; edges.num_bins()];
    let offset = match delays {
        DelaySet::IncludeSelf => 0,
        DelaySet::ExcludeSelf => 1,
    };

    for (j, t_j) in times.iter().enumerate() {
        for t_i in times.iter().skip(j + offset) {
            let delay = t_i - t_j;
            if delay >= edges.upper() {
                break;
            }
            if let Some(k) = edges.bin_index(delay) {
                counts[k] += 1;
            }
        }
    }

    counts
}

/// A smoothed and normalized autocorrelogram.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Autocorrelogram {
    values: Vec<f64>,
    num_delays: u64,
}

impl Autocorrelogram {
    /// Build the autocorrelogram of a sorted spike train.
    pub fn build(times: &[f64], edges: &BinEdges, options: &HistogramOptions) -> Self {
        let counts = delay_counts(times, edges, options.delays);
        let num_delays = counts.iter().sum();

        // Smoothing commutes with the constant offset: counts are smoothed first so that
        // equal windows give bitwise-equal values, then epsilon is added.
        let counts: Vec<f64> = counts.into_iter().map(|c| c as f64).collect();
        let mut values: Vec<f64> = moving_average(&counts, options.smoothing_window)
            .into_iter()
            .map(|v| v + options.epsilon)
            .collect();

        let total: f64 = values.iter().sum();
        if total > 0.0 {
            values.iter_mut().for_each(|v| *v /= total);
        }

        Autocorrelogram { values, num_delays }
    }

    /// The normalized values, one per bin.
    pub fn values(&self) -> &[f64] {
        &self.values[..]
    }

    /// Number of delays which fell in the histogram range.
    pub fn num_delays(&self) -> u64 {
        self.num_delays
    }

    /// Base-10 logarithm of the values.
    pub fn log10(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.log10()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bin_edges_uniform() {
        let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
        assert_eq!(edges.edges().len(), 500);
        assert_eq!(edges.num_bins(), 499);
        assert_relative_eq!(edges.upper(), 0.499, epsilon = 1e-12);
        assert_relative_eq!(edges.mean_width(), 0.001, epsilon = 1e-12);
        assert_relative_eq!(edges.centers()[0], 0.0005, epsilon = 1e-12);

        let edges = BinEdges::uniform(0.0, 1.0, 0.3).unwrap();
        assert_eq!(edges.edges().len(), 4);

        assert!(BinEdges::uniform(0.0, 0.5, 0.0).is_err());
        assert!(BinEdges::uniform(0.5, 0.0, 0.1).is_err());
        assert!(BinEdges::uniform(0.0, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_bin_edges_new() {
        assert!(BinEdges::new(vec![0.0]).is_err());
        assert!(BinEdges::new(vec![0.0, 0.0, 1.0]).is_err());
        assert!(BinEdges::new(vec![0.0, f64::NAN]).is_err());
        assert!(BinEdges::new(vec![0.0, 0.5, 2.0]).is_ok());
    }

    #[test]
    fn test_bin_index() {
        let edges = BinEdges::new(vec![0.0, 1.0, 2.0, 4.0]).unwrap();
        assert_eq!(edges.bin_index(-0.1), None);
        assert_eq!(edges.bin_index(0.0), Some(0));
        assert_eq!(edges.bin_index(0.99), Some(0));
        assert_eq!(edges.bin_index(1.0), Some(1));
        assert_eq!(edges.bin_index(3.5), Some(2));
        assert_eq!(edges.bin_index(4.0), None);
        assert_eq!(edges.bin_index(f64::NAN), None);
    }

    #[test]
    fn test_delay_counts() {
        let edges = BinEdges::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let times = [0.0, 1.5, 2.0, 10.0];

        // delays: 0 (x4), 1.5, 2.0, 0.5, 10, 8.5, 8
        assert_eq!(
            delay_counts(&times, &edges, DelaySet::IncludeSelf),
            vec![5, 1, 1]
        );
        assert_eq!(
            delay_counts(&times, &edges, DelaySet::ExcludeSelf),
            vec![1, 1, 1]
        );
        assert_eq!(
            delay_counts(&[], &edges, DelaySet::IncludeSelf),
            vec![0, 0, 0]
        );
    }

    #[test]
    fn test_delay_counts_matches_full_matrix() {
        let edges = BinEdges::uniform(0.0, 0.2, 0.01).unwrap();
        let mut sorted: Vec<f64> = (0..60)
            .map(|i| (i as f64 * 0.037).rem_euclid(0.9) + i as f64 * 0.011)
            .collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut expected = vec![0_u64; edges.num_bins()];
        for i in 0..sorted.len() {
            for j in 0..=i {
                if let Some(k) = edges.bin_index(sorted[i] - sorted[j]) {
                    expected[k] += 1;
                }
            }
        }

        assert_eq!(
            delay_counts(&sorted, &edges, DelaySet::IncludeSelf),
            expected
        );
    }

    #[test]
    fn test_autocorrelogram_normalized() {
        let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
        let options = HistogramOptions::default_for(&edges);
        assert_eq!(options.smoothing_window, 15);

        let times: Vec<f64> = (0..50).map(|i| i as f64 * 0.0137).collect();
        let acg = Autocorrelogram::build(&times, &edges, &options);
        assert_eq!(acg.values().len(), 499);
        assert_relative_eq!(acg.values().iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(acg.values().iter().all(|v| *v > 0.0));
    }

    #[test]
    fn test_autocorrelogram_empty_is_uniform() {
        let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
        let include_self = HistogramOptions::default_for(&edges);
        let exclude_self = HistogramOptions {
            delays: DelaySet::ExcludeSelf,
            ..HistogramOptions::default_for(&edges)
        };

        // no delay in range in both cases
        for (times, options) in [
            (vec![], &include_self),
            (vec![1.0, 2.0, 3.0], &exclude_self),
        ] {
            let acg = Autocorrelogram::build(&times, &edges, options);
            assert_eq!(acg.num_delays(), 0);
            let first = acg.values()[0];
            assert!(first > 0.0);
            assert!(acg.values().iter().all(|v| *v == first));
            assert_relative_eq!(acg.values().iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_autocorrelogram_mass_near_delays() {
        let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
        let options = HistogramOptions::default_for(&edges);
        let acg = Autocorrelogram::build(&[0.0, 0.1, 0.2, 0.3], &edges, &options);
        let centers = edges.centers();

        assert_eq!(acg.num_delays(), 10);

        // all the mass (apart from epsilon) lies within the smoothing window of a multiple of 0.1
        let far_mass: f64 = acg
            .values()
            .iter()
            .zip(centers.iter())
            .filter(|(_, t)| {
                let k = (**t / 0.1).round();
                (**t - k * 0.1).abs() > 0.01 || k > 3.0
            })
            .map(|(v, _)| v)
            .sum();
        assert!(far_mass < 1e-6);
    }

    #[test]
    fn test_exclude_self_drops_zero_delays() {
        let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
        let options = HistogramOptions {
            delays: DelaySet::ExcludeSelf,
            ..HistogramOptions::default_for(&edges)
        };
        let acg = Autocorrelogram::build(&[0.0, 0.1, 0.2, 0.3], &edges, &options);
        assert_eq!(acg.num_delays(), 6);
        assert!(acg.values()[0] < 1e-6);
    }
}
