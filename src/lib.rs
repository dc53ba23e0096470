//! This crate provides tools for estimating the periodicity of spike-sorted units recorded under
//! optogenetic stimulation.
//!
//! # Autocorrelograms
//!
//! ```rust
//! use spike_periodicity::core::histogram::{Autocorrelogram, BinEdges, HistogramOptions};
//! use spike_periodicity::core::periodicity::estimate_periodicity_timescale;
//!
//! // Delays from 0 to 0.5 s in 1 ms bins
//! let edges = BinEdges::uniform(0.0, 0.5, 0.001).unwrap();
//! let options = HistogramOptions::default_for(&edges);
//!
//! let acg = Autocorrelogram::build(&[0.0, 0.1, 0.2, 0.3], &edges, &options);
//! let period = estimate_periodicity_timescale(&acg.log10(), &edges.centers(), 0.01).unwrap();
//! assert!((period - 0.1).abs() <= 0.001);
//! ```
//!
//! # Analyzing a Dataset
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use spike_periodicity::analysis::autocorrelogram::AutocorrelogramAnalysis;
//! use spike_periodicity::config::AnalysisConfig;
//! use spike_periodicity::dataset::filter::{DatasetFilter, StimulationProtocol};
//! use spike_periodicity::dataset::store::JsonSessionStore;
//! use spike_periodicity::dataset::synthetic::SyntheticSession;
//!
//! // A synthetic session with units entrained by 50 ms stimulation
//! let mut rng = StdRng::seed_from_u64(42);
//! let synthetic = SyntheticSession { period_ms: 50.0, ..Default::default() };
//! let store = JsonSessionStore::new(vec![synthetic.sample(0, &mut rng).unwrap()]);
//!
//! let config = AnalysisConfig::default();
//! let filter = DatasetFilter {
//!     protocol: Some(StimulationProtocol::FixedPeriod { period_ms: 50.0 }),
//!     ..Default::default()
//! };
//! let results = AutocorrelogramAnalysis::new(&config).unwrap().run(&store, &filter).unwrap();
//!
//! assert_eq!(results.num_sessions, 1);
//! assert_eq!(results.units.len(), 10);
//! ```
pub mod analysis;
pub mod config;
pub mod core;
pub mod dataset;
pub mod error;
