//! Typed records of recording sessions.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::interval::IntervalSet;
use crate::core::spike_train::SpikeTrain;
use crate::dataset::filter::{StimulationProtocol, TrackType};
use crate::error::AnalysisError;

/// The stimulation condition of a time interval.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Control,
    Test,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::Control, Condition::Test];
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Condition::Control => write!(f, "control"),
            Condition::Test => write!(f, "test"),
        }
    }
}

/// The intervals a decoding model was fitted on.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    Control,
    Test,
    /// The whole epoch, regardless of stimulation.
    Full,
}

impl From<Condition> for Encoding {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Control => Encoding::Control,
            Condition::Test => Encoding::Test,
        }
    }
}

/// A sorted-spikes decoding model fitted on part of a session.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DecodingModel {
    pub encoding: Encoding,
    /// The intervals the model was fitted on.
    pub encoding_intervals: IntervalSet,
    /// One place field (firing rate per position bin) per unit.
    pub place_fields: Vec<Vec<f64>>,
    /// One mean rate (events per sample) per unit.
    pub mean_rates: Vec<f64>,
    pub place_bin_centers: Vec<f64>,
}

/// A recording session, with everything the analyses need.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub nwb_file_name: String,
    pub position_interval_name: String,
    pub animal: String,
    #[serde(default)]
    pub track_type: Option<TrackType>,
    pub protocol: StimulationProtocol,
    #[serde(default)]
    pub pulse_length_ms: Option<f64>,
    #[serde(default)]
    pub transfected: Option<bool>,
    #[serde(default)]
    pub laser_power: Option<f64>,
    /// Intervals during which the animal runs.
    pub run_intervals: IntervalSet,
    /// Intervals during which the animal is away from the reward ports.
    #[serde(default)]
    pub port_free_intervals: Option<IntervalSet>,
    pub control_intervals: IntervalSet,
    pub test_intervals: IntervalSet,
    #[serde(default)]
    pub units: Vec<SpikeTrain>,
    /// Onsets of the stimulation pulses.
    #[serde(default)]
    pub stimulus_times: Vec<f64>,
    #[serde(default)]
    pub decoding_models: Vec<DecodingModel>,
}

impl SessionRecord {
    /// A short identifier of the session, for logging.
    pub fn name(&self) -> String {
        format!("{} ({})", self.nwb_file_name, self.position_interval_name)
    }

    pub fn condition_intervals(&self, condition: Condition) -> &IntervalSet {
        match condition {
            Condition::Control => &self.control_intervals,
            Condition::Test => &self.test_intervals,
        }
    }

    /// Returns the running intervals, away from the ports if `filter_ports` is set, which last
    /// strictly longer than `min_run_time`.
    pub fn valid_run_intervals(&self, filter_ports: bool, min_run_time: f64) -> IntervalSet {
        let run_intervals = match (&self.port_free_intervals, filter_ports) {
            (Some(port_free), true) => self.run_intervals.intersect(port_free),
            (None, true) => {
                log::warn!(
                    "{}: no port-free intervals, running intervals are not filtered",
                    self.name()
                );
                self.run_intervals.clone()
            }
            (_, false) => self.run_intervals.clone(),
        };
        run_intervals.filter_min_duration(min_run_time)
    }

    /// Returns the control and test decoding models.
    /// A session must hold exactly one model per encoding (control, test and full epoch).
    pub fn decoding_pair(&self) -> Result<(&DecodingModel, &DecodingModel), AnalysisError> {
        if self.decoding_models.len() != 3 {
            return Err(AnalysisError::InconsistentData(format!(
                "{}: expected 3 decoding models, found {}",
                self.name(),
                self.decoding_models.len()
            )));
        }
        let find = |encoding: Encoding| {
            let mut models = self
                .decoding_models
                .iter()
                .filter(move |model| model.encoding == encoding);
            match (models.next(), models.next()) {
                (Some(model), None) => Ok(model),
                _ => Err(AnalysisError::InconsistentData(format!(
                    "{}: expected exactly one {:?} decoding model",
                    self.name(),
                    encoding
                ))),
            }
        };
        find(Encoding::Full)?;
        Ok((find(Encoding::Control)?, find(Encoding::Test)?))
    }
}
