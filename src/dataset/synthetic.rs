//! Synthetic sessions with rhythmic units, for demonstrations and tests.
use rand::Rng;

use crate::core::interval::{Interval, IntervalSet};
use crate::core::spike_train::SpikeTrain;
use crate::dataset::filter::{StimulationProtocol, TrackType};
use crate::dataset::session::SessionRecord;
use crate::error::AnalysisError;

/// Parameters of a synthetic session.
///
/// Stimulation alternates between control and test blocks. Units fire once per cycle of the
/// control rhythm in control blocks and once per stimulation pulse in test blocks, with
/// Gaussian jitter, on top of Poisson background activity. The animal runs during the first
/// part of every block.
#[derive(Debug, PartialEq, Clone)]
pub struct SyntheticSession {
    pub animal: String,
    /// Driving period of the stimulation, in milliseconds.
    pub period_ms: f64,
    /// Period of the units in the control condition, in milliseconds.
    pub control_period_ms: f64,
    pub num_units: usize,
    /// Number of (control, test) block pairs.
    pub num_blocks: usize,
    pub block_duration: f64,
    /// Fraction of each block spent running.
    pub running_fraction: f64,
    pub jitter_std: f64,
    pub background_rate: f64,
}

impl Default for SyntheticSession {
    fn default() -> Self {
        SyntheticSession {
            animal: "synthetic".to_string(),
            period_ms: 80.0,
            control_period_ms: 125.0,
            num_units: 10,
            num_blocks: 3,
            block_duration: 40.0,
            running_fraction: 0.8,
            jitter_std: 0.003,
            background_rate: 5.0,
        }
    }
}

impl SyntheticSession {
    fn blocks(&self, offset: usize) -> Vec<Interval> {
        (0..self.num_blocks)
            .filter_map(|k| {
                let start = (2 * k + offset) as f64 * self.block_duration;
                Interval::build(start, start + self.block_duration).ok()
            })
            .collect()
    }

    /// Sample a session; `index` distinguishes the sessions of a dataset.
    pub fn sample<R: Rng>(
        &self,
        index: usize,
        rng: &mut R,
    ) -> Result<SessionRecord, AnalysisError> {
        if self.period_ms <= 0.0 || self.control_period_ms <= 0.0 || self.block_duration <= 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "Invalid synthetic session: periods and block duration must be positive"
                    .to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.running_fraction) {
            return Err(AnalysisError::InvalidParameter(
                "Invalid running fraction: must be in [0, 1]".to_string(),
            ));
        }
        if !self.jitter_std.is_finite() || self.jitter_std < 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "Invalid jitter: must be non-negative".to_string(),
            ));
        }
        if !self.background_rate.is_finite() || self.background_rate < 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "Invalid background rate: must be non-negative".to_string(),
            ));
        }

        let control_intervals = IntervalSet::build(self.blocks(0))?;
        let test_intervals = IntervalSet::build(self.blocks(1))?;
        let run_intervals = IntervalSet::build(
            (0..2 * self.num_blocks)
                .map(|k| {
                    let start = k as f64 * self.block_duration;
                    Interval::build(start, start + self.running_fraction * self.block_duration)
                })
                .collect::<Result<Vec<Interval>, AnalysisError>>()?,
        )?;

        let period = self.period_ms / 1000.0;
        let control_period = self.control_period_ms / 1000.0;

        let mut stimulus_times = vec![];
        for block in test_intervals.iter() {
            let num_pulses = (block.length() / period).ceil() as usize;
            stimulus_times.extend(
                (0..num_pulses)
                    .map(|k| block.start() + k as f64 * period)
                    .filter(|t| *t < block.end()),
            );
        }

        let mut units = vec![];
        for id in 0..self.num_units {
            let mut times = vec![];
            for (intervals, period) in [
                (&control_intervals, control_period),
                (&test_intervals, period),
            ] {
                for block in intervals.iter() {
                    let spike_train = SpikeTrain::rand_periodic(
                        id,
                        period,
                        block.length(),
                        self.jitter_std,
                        rng,
                    )?;
                    times.extend(spike_train.times().iter().map(|t| block.start() + t));
                }
            }
            let duration = 2.0 * self.num_blocks as f64 * self.block_duration;
            let background = SpikeTrain::rand_poisson(id, self.background_rate, duration, rng)?;
            times.extend_from_slice(background.times());
            units.push(SpikeTrain::build(id, times)?);
        }

        log::debug!(
            "Synthetic session {} sampled with {} units and {} pulses",
            index,
            units.len(),
            stimulus_times.len()
        );

        Ok(SessionRecord {
            nwb_file_name: format!("{}{:02}_.nwb", self.animal, index),
            position_interval_name: "pos 0 valid times".to_string(),
            animal: self.animal.clone(),
            track_type: Some(TrackType::WTrack),
            protocol: StimulationProtocol::FixedPeriod {
                period_ms: self.period_ms,
            },
            pulse_length_ms: Some(self.period_ms / 2.0),
            transfected: Some(true),
            laser_power: None,
            run_intervals,
            port_free_intervals: None,
            control_intervals,
            test_intervals,
            units,
            stimulus_times,
            decoding_models: vec![],
        })
    }
}
