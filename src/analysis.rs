//! Analyses over a dataset of recording sessions.
//!
//! - [`autocorrelogram`]: Autocorrelograms and periodicity of the units, per stimulation condition
//! - [`place_fields`]: Comparison of the decoded place fields between stimulation conditions
//! - [`dependence`]: Dependence of the periodicity on the driving period of the stimulation
use serde::{Deserialize, Serialize};

pub mod autocorrelogram;
pub mod dependence;
pub mod place_fields;

/// Identifies a unit within a dataset.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct UnitKey {
    /// The recording file of the session.
    pub session: String,
    pub unit: usize,
}

/// Returns the indices that sort the keys in increasing order, ties keeping their order.
pub(crate) fn argsort_by_key<T: PartialOrd>(keys: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| {
        keys[a]
            .partial_cmp(&keys[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argsort_by_key() {
        assert_eq!(argsort_by_key(&[3, 1, 2]), vec![1, 2, 0]);
        assert_eq!(argsort_by_key(&[1.0, 0.5, 1.0, 0.0]), vec![3, 1, 0, 2]);
        assert!(argsort_by_key::<usize>(&[]).is_empty());
    }
}
