//! Descriptive statistics used to summarize populations of units.
use rand::Rng;

use crate::error::AnalysisError;

/// Returns the mean of the values, if any.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Returns the `q`-quantile of the values, linearly interpolated between order statistics.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let sorted = sorted(values);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo]))
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`, clamped to the end values outside.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    let k = xp.partition_point(|v| *v <= x);
    let (x0, x1) = (xp[k - 1], xp[k]);
    let (f0, f1) = (fp[k - 1], fp[k]);
    if x1 == x0 {
        return f0;
    }
    f0 + (x - x0) * (f1 - f0) / (x1 - x0)
}

/// Quantiles of weighted values.
///
/// Each value sits at the middle of its cumulative weight, and quantiles are interpolated
/// in between. With `old_style`, the positions are rescaled to span exactly `[0, 1]`, which
/// reproduces [`quantile`] for unit weights.
pub fn weighted_quantile(
    values: &[f64],
    quantiles: &[f64],
    weights: Option<&[f64]>,
    old_style: bool,
) -> Result<Vec<f64>, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::InvalidParameter(
            "cannot compute quantiles of an empty sample".to_string(),
        ));
    }
    if quantiles.iter().any(|q| !(0.0..=1.0).contains(q)) {
        return Err(AnalysisError::InvalidParameter(
            "quantiles should be in [0, 1]".to_string(),
        ));
    }
    let weights = match weights {
        Some(weights) if weights.len() != values.len() => {
            return Err(AnalysisError::InvalidParameter(format!(
                "{} weights provided for {} values",
                weights.len(),
                values.len()
            )));
        }
        Some(weights) => weights.to_vec(),
        None => vec![1.0; values.len()],
    };
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(AnalysisError::InvalidParameter(
            "weights should be finite and non-negative".to_string(),
        ));
    }
    if weights.iter().all(|w| *w == 0.0) {
        return Err(AnalysisError::InvalidParameter(
            "weights should have a positive sum".to_string(),
        ));
    }

    let mut pairs: Vec<(f64, f64)> = values.iter().copied().zip(weights).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (values, weights): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    let mut cumulative = 0.0;
    let mut positions: Vec<f64> = weights
        .iter()
        .map(|w| {
            cumulative += w;
            cumulative - 0.5 * w
        })
        .collect();

    if old_style {
        let first = positions[0];
        positions.iter_mut().for_each(|p| *p -= first);
        let last = positions[positions.len() - 1];
        if last > 0.0 {
            positions.iter_mut().for_each(|p| *p /= last);
        }
    } else {
        positions.iter_mut().for_each(|p| *p /= cumulative);
    }

    Ok(quantiles
        .iter()
        .map(|q| interp(*q, &positions, &values))
        .collect())
}

/// Evaluate `statistic` on `num_samples` resamples (with replacement) of `values`.
pub fn bootstrap<R, F>(values: &[f64], num_samples: usize, statistic: F, rng: &mut R) -> Vec<f64>
where
    R: Rng,
    F: Fn(&[f64]) -> f64,
{
    if values.is_empty() {
        return vec![];
    }
    let mut resample = vec![0.0; values.len()];
    (0..num_samples)
        .map(|_| {
            resample
                .iter_mut()
                .for_each(|v| *v = values[rng.gen_range(0..values.len())]);
            statistic(&resample)
        })
        .collect()
}

/// Pearson correlation coefficient of two equally long samples.
/// Returns `None` if the samples are empty, of different lengths, or constant.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    let (mx, my) = (mean(x)?, mean(y)?);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y.iter()) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}
