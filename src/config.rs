//! Parameters of the analyses, with defaults and JSON loading.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::histogram::{BinEdges, DelaySet, HistogramOptions};
use crate::core::{BIN_WIDTH, HISTOGRAM_EPSILON, MAX_DELAY, PEAK_MIN_WIDTH, SMOOTHING_DURATION};
use crate::error::AnalysisError;

/// How units are gated on their number of spikes.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpikeGate {
    /// The unit must reach the minimum number of spikes in every condition.
    #[default]
    EachCondition,
    /// The unit must reach the minimum number of spikes over all running intervals.
    Running,
}

/// The autocorrelogram histogram parameters, in seconds.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HistogramConfig {
    #[serde(default = "default_start")]
    pub start: f64,
    #[serde(default = "default_stop")]
    pub stop: f64,
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,
    #[serde(default = "default_smoothing_duration")]
    pub smoothing_duration: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub delays: DelaySet,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        HistogramConfig {
            start: default_start(),
            stop: default_stop(),
            bin_width: default_bin_width(),
            smoothing_duration: default_smoothing_duration(),
            epsilon: default_epsilon(),
            delays: DelaySet::default(),
        }
    }
}

impl HistogramConfig {
    /// Returns the bin edges shared by all autocorrelograms of a run.
    pub fn edges(&self) -> Result<BinEdges, AnalysisError> {
        BinEdges::uniform(self.start, self.stop, self.bin_width)
    }

    pub fn options(&self, edges: &BinEdges) -> HistogramOptions {
        HistogramOptions::new(edges, self.smoothing_duration, self.epsilon, self.delays)
    }
}

/// The place-field comparison parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PlaceFieldConfig {
    /// Minimum expected number of events of a unit over the encoding intervals, in both conditions.
    #[serde(default = "default_min_rate")]
    pub min_rate: f64,
    /// Whether to drop units whose control place field peak is below twice the uniform level.
    #[serde(default = "default_true")]
    pub filter_specificity: bool,
    /// Sampling rate of the decoding models, in Hz.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
}

impl Default for PlaceFieldConfig {
    fn default() -> Self {
        PlaceFieldConfig {
            min_rate: default_min_rate(),
            filter_specificity: true,
            sampling_rate: default_sampling_rate(),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_bootstrap_samples")]
    pub samples: usize,
    #[serde(default)]
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            samples: default_bootstrap_samples(),
            seed: 0,
        }
    }
}

/// All parameters of the analyses. Missing fields take their default value.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Whether running intervals are restricted to the port-free intervals.
    #[serde(default = "default_true")]
    pub filter_ports: bool,
    /// Running intervals must last strictly longer than this, in seconds.
    #[serde(default = "default_min_run_time")]
    pub min_run_time: f64,
    #[serde(default = "default_min_spikes")]
    pub min_spikes: usize,
    #[serde(default)]
    pub spike_gate: SpikeGate,
    #[serde(default)]
    pub histogram: HistogramConfig,
    /// Minimum width of the autocorrelogram peaks, in seconds.
    #[serde(default = "default_peak_min_width")]
    pub peak_min_width: f64,
    #[serde(default)]
    pub place_fields: PlaceFieldConfig,
    /// The period the control condition is compared to, in milliseconds.
    #[serde(default = "default_control_reference_period_ms")]
    pub control_reference_period_ms: f64,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            filter_ports: true,
            min_run_time: default_min_run_time(),
            min_spikes: default_min_spikes(),
            spike_gate: SpikeGate::default(),
            histogram: HistogramConfig::default(),
            peak_min_width: default_peak_min_width(),
            place_fields: PlaceFieldConfig::default(),
            control_reference_period_ms: default_control_reference_period_ms(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file, then validate it.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let file = File::open(path).map_err(|e| AnalysisError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        let config: AnalysisConfig =
            serde_json::from_reader(reader).map_err(|e| AnalysisError::IOError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the consistency of the parameters.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let histogram = &self.histogram;
        if !(histogram.bin_width > 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid bin width: must be positive".to_string(),
            ));
        }
        if !(histogram.stop > histogram.start) || histogram.start < 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "Invalid delay range: [{}, {})",
                histogram.start, histogram.stop
            )));
        }
        if !(histogram.smoothing_duration >= 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid smoothing duration: must be non-negative".to_string(),
            ));
        }
        if !(histogram.epsilon > 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid epsilon: must be positive".to_string(),
            ));
        }
        if !(self.peak_min_width > 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid peak width: must be positive".to_string(),
            ));
        }
        if !(self.min_run_time >= 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid minimum run time: must be non-negative".to_string(),
            ));
        }
        if !(self.place_fields.sampling_rate > 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid sampling rate: must be positive".to_string(),
            ));
        }
        if !(self.control_reference_period_ms > 0.0) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid reference period: must be positive".to_string(),
            ));
        }
        histogram.edges().map(|_| ())
    }
}

fn default_true() -> bool {
    true
}

fn default_start() -> f64 {
    0.0
}

fn default_stop() -> f64 {
    MAX_DELAY
}

fn default_bin_width() -> f64 {
    BIN_WIDTH
}

fn default_smoothing_duration() -> f64 {
    SMOOTHING_DURATION
}

fn default_epsilon() -> f64 {
    HISTOGRAM_EPSILON
}

fn default_min_rate() -> f64 {
    100.0
}

fn default_sampling_rate() -> f64 {
    500.0
}

fn default_bootstrap_samples() -> usize {
    1000
}

fn default_min_run_time() -> f64 {
    0.5
}

fn default_min_spikes() -> usize {
    300
}

fn default_peak_min_width() -> f64 {
    PEAK_MIN_WIDTH
}

fn default_control_reference_period_ms() -> f64 {
    125.0
}
