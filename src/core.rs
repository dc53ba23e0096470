//! Core module defining the numerical building blocks of the periodicity analysis.
//!
//! It consists of the following components:
//!
//! - [`interval`]: Closed time intervals and sorted sets of disjoint intervals
//! - [`spike_train`]: The sorted spike times of a recorded unit
//! - [`histogram`]: Pairwise-delay histograms, a.k.a. autocorrelograms
//! - [`smoothing`]: Moving-average smoothing
//! - [`peaks`]: Peak detection with prominence and width
//! - [`periodicity`]: Periodicity timescale of an autocorrelogram
//! - [`stats`]: Quantiles, bootstrap and correlation
//!
//! # Examples
//!
//! ```
//! use spike_periodicity::core::histogram::{Autocorrelogram, BinEdges, HistogramOptions};
//! use spike_periodicity::core::interval::IntervalSet;
//! use spike_periodicity::core::periodicity::estimate_periodicity_timescale;
//! use spike_periodicity::core::spike_train::SpikeTrain;
//!
//! // A unit firing every 100 ms, recorded while the animal runs in two bouts
//! let spike_train = SpikeTrain::build(0, (0..200).map(|k| k as f64 * 0.1).collect()).unwrap();
//! let running = IntervalSet::from_pairs(&[(0.0, 8.0), (10.0, 18.0)]).unwrap();
//! let spike_train = spike_train.restrict_to(&running);
//!
//! // Autocorrelogram over [0, 0.5) s with 1 ms bins
//! let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
//! let options = HistogramOptions::default_for(&edges);
//! let acg = Autocorrelogram::build(spike_train.times(), &edges, &options);
//!
//! let period = estimate_periodicity_timescale(&acg.log10(), &edges.centers(), 0.01).unwrap();
//! assert!((period - 0.1).abs() <= 0.001);
//! ```
pub mod histogram;
pub mod interval;
pub mod peaks;
pub mod periodicity;
pub mod smoothing;
pub mod spike_train;
pub mod stats;

/// The value added to every autocorrelogram bin, so that logarithms stay finite.
pub const HISTOGRAM_EPSILON: f64 = 1e-9;
/// The duration of the moving-average window applied to autocorrelograms, in seconds.
pub const SMOOTHING_DURATION: f64 = 0.015;
/// The upper bound of the autocorrelogram delay range, in seconds.
pub const MAX_DELAY: f64 = 0.5;
/// The autocorrelogram bin width, in seconds.
pub const BIN_WIDTH: f64 = 0.001;
/// The minimum width of an autocorrelogram peak, in seconds.
pub const PEAK_MIN_WIDTH: f64 = 0.02;
