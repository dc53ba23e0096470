//! Module implementing the spike train of a single recorded unit.
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::core::interval::IntervalSet;
use crate::error::AnalysisError;

/// The (sorted) spike times of a recorded unit, in seconds.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSpikeTrain")]
pub struct SpikeTrain {
    id: usize,
    times: Vec<f64>,
}

#[derive(Deserialize)]
struct RawSpikeTrain {
    id: usize,
    times: Vec<f64>,
}

impl TryFrom<RawSpikeTrain> for SpikeTrain {
    type Error = AnalysisError;

    fn try_from(raw: RawSpikeTrain) -> Result<Self, Self::Error> {
        SpikeTrain::build(raw.id, raw.times)
    }
}

impl SpikeTrain {
    /// Create a spike train with the specified parameters.
    /// If necessary, the spike times are sorted.
    /// The function returns an error for non-finite spike times.
    pub fn build(id: usize, mut times: Vec<f64>) -> Result<Self, AnalysisError> {
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return Err(AnalysisError::InvalidSpikeTimes(format!(
                "unit {} has a non-finite spike time ({})",
                id, t
            )));
        }
        times.sort_by(|t1, t2| t1.total_cmp(t2));
        Ok(SpikeTrain { id, times })
    }

    /// Returns the ID of the unit associated with the spike train.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the spike times.
    pub fn times(&self) -> &[f64] {
        &self.times[..]
    }

    pub fn num_spikes(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the spike train restricted to the provided intervals (bounds included).
    pub fn restrict_to(&self, intervals: &IntervalSet) -> SpikeTrain {
        SpikeTrain {
            id: self.id,
            times: intervals.restrict(&self.times),
        }
    }

    /// Sample a jittered periodic spike train over [0, duration).
    /// Each cycle emits one spike at `k * period + N(0, jitter_std)`.
    /// Out-of-range spikes are dropped.
    pub fn rand_periodic<R: Rng>(
        id: usize,
        period: f64,
        duration: f64,
        jitter_std: f64,
        rng: &mut R,
    ) -> Result<Self, AnalysisError> {
        if period <= 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "Invalid period value: must be positive".to_string(),
            ));
        }
        if duration < 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "Invalid duration value: must be non-negative".to_string(),
            ));
        }
        if !jitter_std.is_finite() || jitter_std < 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "Invalid jitter value: must be non-negative".to_string(),
            ));
        }
        let jitter = Normal::new(0.0, jitter_std)
            .map_err(|e| AnalysisError::InvalidParameter(e.to_string()))?;

        let num_cycles = (duration / period).ceil() as usize;
        let times = (0..num_cycles)
            .map(|k| k as f64 * period + jitter.sample(rng))
            .filter(|t| *t >= 0.0 && *t < duration)
            .collect();

        SpikeTrain::build(id, times)
    }

    /// Sample a homogeneous Poisson spike train over [0, duration).
    pub fn rand_poisson<R: Rng>(
        id: usize,
        firing_rate: f64,
        duration: f64,
        rng: &mut R,
    ) -> Result<Self, AnalysisError> {
        if firing_rate < 0.0 {
            return Err(AnalysisError::InvalidParameter(
                "Invalid firing rate value: must be non-negative".to_string(),
            ));
        }
        if firing_rate == 0.0 {
            return SpikeTrain::build(id, vec![]);
        }
        let isi =
            Exp::new(firing_rate).map_err(|e| AnalysisError::InvalidParameter(e.to_string()))?;

        let mut times = vec![];
        let mut t = isi.sample(rng);
        while t < duration {
            times.push(t);
            t += isi.sample(rng);
        }

        log::trace!(
            "{} spikes sampled for unit {} (expected {})",
            times.len(),
            id,
            firing_rate * duration
        );

        SpikeTrain::build(id, times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SEED: u64 = 42;

    #[test]
    fn test_spike_train_build() {
        // Test valid spike trains with unsorted spike times
        let spike_train = SpikeTrain::build(0, vec![0.0, 2.0, 5.0]).unwrap();
        assert_eq!(spike_train.times(), &[0.0, 2.0, 5.0]);

        let spike_train = SpikeTrain::build(0, vec![0.0, 5.0, 2.0]).unwrap();
        assert_eq!(spike_train.times(), &[0.0, 2.0, 5.0]);

        // Test empty spike train
        let spike_train = SpikeTrain::build(0, vec![]).unwrap();
        assert_eq!(spike_train.times(), &[] as &[f64]);

        // Test invalid spike train (NaN values)
        assert!(matches!(
            SpikeTrain::build(3, vec![0.0, 5.0, f64::NAN]),
            Err(AnalysisError::InvalidSpikeTimes(_))
        ));
    }

    #[test]
    fn test_restrict_to() {
        let spike_train = SpikeTrain::build(7, vec![0.1, 0.2, 1.1, 1.5, 3.0]).unwrap();
        let intervals = IntervalSet::from_pairs(&[(0.0, 0.15), (1.0, 2.0)]).unwrap();
        let restricted = spike_train.restrict_to(&intervals);

        assert_eq!(restricted.id(), 7);
        assert_eq!(restricted.times(), &[0.1, 1.1, 1.5]);
    }

    #[test]
    fn test_rand_periodic() {
        let mut rng = StdRng::seed_from_u64(SEED);

        assert!(SpikeTrain::rand_periodic(0, 0.0, 10.0, 0.001, &mut rng).is_err());
        assert!(SpikeTrain::rand_periodic(0, 0.1, 10.0, -1.0, &mut rng).is_err());
        assert!(SpikeTrain::rand_periodic(0, 0.1, 10.0, f64::NAN, &mut rng).is_err());

        let spike_train = SpikeTrain::rand_periodic(0, 0.1, 10.0, 0.0, &mut rng).unwrap();
        assert_eq!(spike_train.num_spikes(), 100);
        assert!(spike_train
            .times()
            .windows(2)
            .all(|w| ((w[1] - w[0]) - 0.1).abs() < 1e-9));

        let spike_train = SpikeTrain::rand_periodic(0, 0.1, 10.0, 0.002, &mut rng).unwrap();
        assert!(spike_train.times().windows(2).all(|w| w[0] <= w[1]));
        assert!(spike_train.times().iter().all(|t| (0.0..10.0).contains(t)));
    }

    #[test]
    fn test_rand_poisson() {
        let mut rng = StdRng::seed_from_u64(SEED);

        assert!(SpikeTrain::rand_poisson(0, -1.0, 10.0, &mut rng).is_err());
        assert!(SpikeTrain::rand_poisson(0, 0.0, 10.0, &mut rng)
            .unwrap()
            .is_empty());

        let spike_train = SpikeTrain::rand_poisson(0, 20.0, 100.0, &mut rng).unwrap();
        assert!(spike_train.times().windows(2).all(|w| w[0] <= w[1]));
        // 2000 expected spikes, std ~45
        assert!((1800..2200).contains(&spike_train.num_spikes()));
    }
}
