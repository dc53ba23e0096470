//! Dependence of the unit periodicities on the driving period of the stimulation.
//!
//! Control periodicities are compared to the reference period of the control condition and
//! test periodicities to the driving period. Fast driving (below 99 ms) is also compared to
//! twice the driving period, slow driving (above 130 ms) to half of it.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::core::stats::{bootstrap, median, quantile};
use crate::error::AnalysisError;

/// Driving periods below this are compared to twice the period, in milliseconds.
pub const HALF_FREQUENCY_BELOW_MS: f64 = 99.0;
/// Driving periods above this are compared to half the period, in milliseconds.
pub const DOUBLE_FREQUENCY_ABOVE_MS: f64 = 130.0;
/// Coverage of the bootstrap confidence intervals.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// The pooled periodicities obtained for one driving period, in seconds.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DrivenPeriodicities {
    pub period_ms: f64,
    pub control: Vec<f64>,
    pub test: Vec<f64>,
}

/// Periodicities relative to a reference period.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub reference_ms: f64,
    /// Periodicity minus reference, in seconds.
    pub offsets: Vec<f64>,
    pub median_offset: Option<f64>,
    /// Bootstrap confidence interval of the median offset.
    pub confidence_interval: Option<(f64, f64)>,
}

/// The comparisons for one driving period.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DependenceEntry {
    pub period_ms: f64,
    pub median_control: Option<f64>,
    pub median_test: Option<f64>,
    pub control: Comparison,
    pub test: Comparison,
    /// Comparison of the test periodicities to a harmonic of the driving period, if relevant.
    pub test_harmonic: Option<Comparison>,
}

/// Returns the harmonic reference of a driving period, if any.
pub fn harmonic_reference_ms(period_ms: f64) -> Option<f64> {
    if period_ms < HALF_FREQUENCY_BELOW_MS {
        Some(2.0 * period_ms)
    } else if period_ms > DOUBLE_FREQUENCY_ABOVE_MS {
        Some(period_ms / 2.0)
    } else {
        None
    }
}

fn compare(
    periodicities: &[f64],
    reference_ms: f64,
    num_samples: usize,
    rng: &mut ChaCha8Rng,
) -> Comparison {
    let reference = reference_ms / 1000.0;
    let offsets: Vec<f64> = periodicities.iter().map(|p| p - reference).collect();

    let medians = bootstrap(&offsets, num_samples, |x| median(x).unwrap_or(f64::NAN), rng);
    let alpha = (1.0 - CONFIDENCE_LEVEL) / 2.0;
    let confidence_interval = match (quantile(&medians, alpha), quantile(&medians, 1.0 - alpha)) {
        (Some(low), Some(high)) => Some((low, high)),
        _ => None,
    };

    Comparison {
        reference_ms,
        median_offset: median(&offsets),
        offsets,
        confidence_interval,
    }
}

/// Compare the periodicities obtained for several driving periods to their references.
pub fn periodicity_dependence(
    driven: &[DrivenPeriodicities],
    config: &AnalysisConfig,
) -> Result<Vec<DependenceEntry>, AnalysisError> {
    if let Some(entry) = driven.iter().find(|entry| !(entry.period_ms > 0.0)) {
        return Err(AnalysisError::InvalidParameter(format!(
            "Invalid driving period: {} ms",
            entry.period_ms
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.bootstrap.seed);
    let num_samples = config.bootstrap.samples;

    Ok(driven
        .iter()
        .map(|entry| {
            let control = compare(
                &entry.control,
                config.control_reference_period_ms,
                num_samples,
                &mut rng,
            );
            let test = compare(&entry.test, entry.period_ms, num_samples, &mut rng);
            let test_harmonic = harmonic_reference_ms(entry.period_ms)
                .map(|reference_ms| compare(&entry.test, reference_ms, num_samples, &mut rng));

            log::debug!(
                "{} ms driving: median test offset {:?} (harmonic {:?})",
                entry.period_ms,
                test.median_offset,
                test_harmonic.as_ref().and_then(|c| c.median_offset)
            );

            DependenceEntry {
                period_ms: entry.period_ms,
                median_control: median(&entry.control),
                median_test: median(&entry.test),
                control,
                test,
                test_harmonic,
            }
        })
        .collect())
}
