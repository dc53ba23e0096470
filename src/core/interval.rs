//! Closed time intervals and sorted sets of non-overlapping intervals.
use std::cmp::Ordering;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A closed time interval [start, end].
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Interval {
    start: f64,
    end: f64,
}

impl Interval {
    /// Create a closed interval. Returns an error if a bound is not finite or if start > end.
    pub fn build(start: f64, end: f64) -> Result<Self, AnalysisError> {
        if !start.is_finite() || !end.is_finite() || start > end {
            return Err(AnalysisError::InvalidInterval { start, end });
        }
        Ok(Interval { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// The intersection of two closed intervals, if any.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            Some(Interval { start, end })
        } else {
            None
        }
    }
}

impl TryFrom<[f64; 2]> for Interval {
    type Error = AnalysisError;

    fn try_from(bounds: [f64; 2]) -> Result<Self, Self::Error> {
        Interval::build(bounds[0], bounds[1])
    }
}

impl From<Interval> for [f64; 2] {
    fn from(interval: Interval) -> Self {
        [interval.start, interval.end]
    }
}

/// A sorted sequence of non-overlapping closed intervals.
/// Two consecutive intervals may share an endpoint.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Interval>", into = "Vec<Interval>")]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// An empty interval set.
    pub fn new_empty() -> Self {
        IntervalSet { intervals: vec![] }
    }

    /// Create an interval set from intervals which must already be sorted and non-overlapping.
    pub fn build(intervals: Vec<Interval>) -> Result<Self, AnalysisError> {
        if let Some((prev, next)) = intervals
            .iter()
            .tuple_windows()
            .find(|(prev, next)| prev.end > next.start)
        {
            return Err(AnalysisError::InvalidIntervalSet(format!(
                "[{}, {}] and [{}, {}] are either unsorted or overlapping",
                prev.start, prev.end, next.start, next.end
            )));
        }
        Ok(IntervalSet { intervals })
    }

    /// Create an interval set from (start, end) pairs.
    /// The pairs must already be sorted and non-overlapping.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, AnalysisError> {
        let intervals = pairs
            .iter()
            .map(|&(start, end)| Interval::build(start, end))
            .collect::<Result<Vec<Interval>, AnalysisError>>()?;
        IntervalSet::build(intervals)
    }

    /// Create the union of arbitrary intervals: they are sorted and overlapping ones are merged.
    pub fn union_of(mut intervals: Vec<Interval>) -> Self {
        intervals.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(Ordering::Equal)
                .then(a.end.partial_cmp(&b.end).unwrap_or(Ordering::Equal))
        });

        let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start < last.end => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }

        IntervalSet { intervals: merged }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<Interval> {
        self.intervals.iter()
    }

    /// Total time covered by the set.
    pub fn total_duration(&self) -> f64 {
        self.intervals.iter().map(|interval| interval.length()).sum()
    }

    pub fn contains(&self, time: f64) -> bool {
        let pos = self.intervals.partition_point(|interval| interval.end < time);
        self.intervals
            .get(pos)
            .is_some_and(|interval| interval.contains(time))
    }

    /// Keep only the intervals strictly longer than `min_duration`.
    pub fn filter_min_duration(&self, min_duration: f64) -> Self {
        IntervalSet {
            intervals: self
                .intervals
                .iter()
                .filter(|interval| interval.length() > min_duration)
                .cloned()
                .collect(),
        }
    }

    /// Intersection of two interval sets, computed by a sweep over both sets.
    pub fn intersect(&self, other: &IntervalSet) -> IntervalSet {
        let mut intervals = vec![];
        let (mut i, mut j) = (0, 0);

        while i < self.intervals.len() && j < other.intervals.len() {
            let a = &self.intervals[i];
            let b = &other.intervals[j];

            if let Some(interval) = a.intersect(b) {
                intervals.push(interval);
            }

            // Advance whichever interval ends first (both on ties)
            match a.end.partial_cmp(&b.end) {
                Some(Ordering::Less) => i += 1,
                Some(Ordering::Greater) => j += 1,
                _ => {
                    i += 1;
                    j += 1;
                }
            }
        }

        IntervalSet { intervals }
    }

    /// Returns the (sorted) times falling within any interval of the set, bounds included.
    /// The times must be sorted; a single merge-style sweep is used.
    pub fn restrict(&self, times: &[f64]) -> Vec<f64> {
        let mut restricted = vec![];
        let mut intervals = self.intervals.iter().peekable();

        for &time in times {
            while let Some(interval) = intervals.peek() {
                if interval.end < time {
                    intervals.next();
                } else {
                    break;
                }
            }
            match intervals.peek() {
                Some(interval) if interval.contains(time) => restricted.push(time),
                Some(_) => {}
                None => break,
            }
        }

        restricted
    }
}

impl TryFrom<Vec<Interval>> for IntervalSet {
    type Error = AnalysisError;

    fn try_from(intervals: Vec<Interval>) -> Result<Self, Self::Error> {
        IntervalSet::build(intervals)
    }
}

impl From<IntervalSet> for Vec<Interval> {
    fn from(set: IntervalSet) -> Self {
        set.intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(f64, f64)]) -> IntervalSet {
        IntervalSet::from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_interval_build() {
        assert!(Interval::build(0.0, 1.0).is_ok());
        assert!(Interval::build(1.0, 1.0).is_ok());
        assert_eq!(
            Interval::build(2.0, 1.0),
            Err(AnalysisError::InvalidInterval {
                start: 2.0,
                end: 1.0
            })
        );
        assert!(Interval::build(f64::NAN, 1.0).is_err());
        assert!(Interval::build(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_interval_contains() {
        let interval = Interval::build(0.0, 10.0).unwrap();
        assert_eq!(interval.contains(-1.0), false);
        assert_eq!(interval.contains(0.0), true);
        assert_eq!(interval.contains(5.0), true);
        assert_eq!(interval.contains(10.0), true);
        assert_eq!(interval.contains(12.0), false);

        let intervals = set(&[(0.0, 0.5), (3.0, 5.0)]);
        assert_eq!(intervals.contains(-1.0), false);
        assert_eq!(intervals.contains(0.0), true);
        assert_eq!(intervals.contains(2.0), false);
        assert_eq!(intervals.contains(5.0), true);
        assert_eq!(intervals.contains(10.0), false);
    }

    #[test]
    fn test_set_build() {
        assert!(IntervalSet::from_pairs(&[(0.0, 1.0), (1.0, 2.0)]).is_ok());
        assert!(matches!(
            IntervalSet::from_pairs(&[(0.0, 1.5), (1.0, 2.0)]),
            Err(AnalysisError::InvalidIntervalSet(_))
        ));
        assert!(matches!(
            IntervalSet::from_pairs(&[(3.0, 4.0), (1.0, 2.0)]),
            Err(AnalysisError::InvalidIntervalSet(_))
        ));
    }

    #[test]
    fn test_union_of() {
        let union = IntervalSet::union_of(vec![
            Interval::build(3.0, 5.0).unwrap(),
            Interval::build(0.0, 1.0).unwrap(),
            Interval::build(0.5, 2.0).unwrap(),
            Interval::build(4.0, 4.5).unwrap(),
        ]);
        assert_eq!(union, set(&[(0.0, 2.0), (3.0, 5.0)]));
        assert_eq!(IntervalSet::union_of(vec![]), IntervalSet::new_empty());
    }

    #[test]
    fn test_intersect() {
        let a = set(&[(0.0, 2.0), (3.0, 6.0), (8.0, 9.0)]);
        let b = set(&[(1.0, 4.0), (5.0, 8.5)]);
        let expected = set(&[(1.0, 2.0), (3.0, 4.0), (5.0, 6.0), (8.0, 8.5)]);

        assert_eq!(a.intersect(&b), expected);
        assert_eq!(b.intersect(&a), expected);
    }

    #[test]
    fn test_intersect_degenerate() {
        let a = set(&[(0.0, 2.0), (3.0, 6.0)]);
        let empty = IntervalSet::new_empty();

        assert!(a.intersect(&empty).is_empty());
        assert!(empty.intersect(&a).is_empty());
        assert!(a.intersect(&set(&[(10.0, 11.0)])).is_empty());

        // shared endpoint of closed intervals
        assert_eq!(a.intersect(&set(&[(2.0, 2.5)])), set(&[(2.0, 2.0)]));
    }

    #[test]
    fn test_intersect_idempotent() {
        let a = set(&[(0.0, 1.0), (1.0, 2.0), (2.5, 2.5), (3.0, 7.25)]);
        assert_eq!(a.intersect(&a), a);
    }

    #[test]
    fn test_intersect_one_spanning_many() {
        let a = set(&[(0.0, 100.0)]);
        let b = set(&[(1.0, 2.0), (3.0, 4.0), (99.0, 101.0)]);
        let expected = set(&[(1.0, 2.0), (3.0, 4.0), (99.0, 100.0)]);
        assert_eq!(a.intersect(&b), expected);
        assert_eq!(b.intersect(&a), expected);
    }

    #[test]
    fn test_restrict() {
        let intervals = set(&[(1.0, 2.0), (4.0, 5.0)]);
        let times = [0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 4.5, 5.0, 6.0];
        assert_eq!(
            intervals.restrict(&times),
            vec![1.0, 1.5, 2.0, 4.0, 4.5, 5.0]
        );

        assert!(IntervalSet::new_empty().restrict(&times).is_empty());
        assert!(intervals.restrict(&[]).is_empty());
    }

    #[test]
    fn test_restrict_is_ordered_subsequence() {
        let intervals = set(&[(0.1, 0.35), (0.5, 0.52), (0.9, 1.3)]);
        let times: Vec<f64> = (0..200).map(|i| i as f64 * 0.0071).collect();
        let restricted = intervals.restrict(&times);

        assert!(restricted.windows(2).all(|w| w[0] <= w[1]));
        assert!(restricted.iter().all(|t| intervals.contains(*t)));
        assert!(restricted.iter().all(|t| times.contains(t)));
        assert_eq!(
            restricted.len(),
            times.iter().filter(|t| intervals.contains(**t)).count()
        );
    }

    #[test]
    fn test_filter_min_duration() {
        let intervals = set(&[(0.0, 0.25), (1.0, 1.5), (2.0, 3.0)]);
        assert_eq!(intervals.filter_min_duration(0.5), set(&[(2.0, 3.0)]));
        assert_eq!(intervals.total_duration(), 1.75);
    }

    #[test]
    fn test_serde() {
        let intervals = set(&[(0.0, 0.25), (1.0, 1.5)]);
        let json = serde_json::to_string(&intervals).unwrap();
        assert_eq!(json, "[[0.0,0.25],[1.0,1.5]]");
        assert_eq!(
            serde_json::from_str::<IntervalSet>(&json).unwrap(),
            intervals
        );
        assert!(serde_json::from_str::<IntervalSet>("[[1.0,0.0]]").is_err());
        assert!(serde_json::from_str::<IntervalSet>("[[0.0,2.0],[1.0,3.0]]").is_err());
    }
}
