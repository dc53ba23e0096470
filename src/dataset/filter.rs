//! Typed restriction of the recording sessions to analyze.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dataset::session::SessionRecord;

/// Tolerance when comparing stimulation parameters.
const PARAMETER_TOLERANCE: f64 = 1e-9;

const WTRACK_ALIASES: [&str; 6] = ["wtrack", "w-track", "w track", "W-track", "W track", "Wtrack"];
const LINEARTRACK_ALIASES: [&str; 6] = [
    "lineartrack",
    "linear-track",
    "linear track",
    "Linear-track",
    "Linear track",
    "Lineartrack",
];

/// The behavioral task of a session.
/// Parsing recognizes the usual spellings of the W-track and linear track tasks.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrackType {
    WTrack,
    LinearTrack,
    Other(String),
}

impl TrackType {
    pub fn parse(name: &str) -> Self {
        if WTRACK_ALIASES.contains(&name) {
            TrackType::WTrack
        } else if LINEARTRACK_ALIASES.contains(&name) {
            TrackType::LinearTrack
        } else {
            TrackType::Other(name.to_string())
        }
    }

    /// Returns the canonical name of the task.
    pub fn name(&self) -> &str {
        match self {
            TrackType::WTrack => "wtrack",
            TrackType::LinearTrack => "lineartrack",
            TrackType::Other(name) => name,
        }
    }
}

impl From<String> for TrackType {
    fn from(name: String) -> Self {
        TrackType::parse(&name)
    }
}

impl From<TrackType> for String {
    fn from(track_type: TrackType) -> Self {
        track_type.name().to_string()
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The optogenetic stimulation protocol of a session.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StimulationProtocol {
    /// Pulses delivered at a fixed period, in milliseconds.
    FixedPeriod { period_ms: f64 },
    /// Pulses triggered in closed loop at a targeted phase of the theta rhythm, in degrees.
    ClosedLoopPhase { targeted_phase: f64 },
    Other,
}

impl StimulationProtocol {
    /// Returns the driving period, if the protocol has one.
    pub fn period_ms(&self) -> Option<f64> {
        match self {
            StimulationProtocol::FixedPeriod { period_ms } => Some(*period_ms),
            _ => None,
        }
    }

    /// Check whether a session protocol satisfies this one.
    pub fn matches(&self, other: &StimulationProtocol) -> bool {
        match (self, other) {
            (
                StimulationProtocol::FixedPeriod { period_ms: a },
                StimulationProtocol::FixedPeriod { period_ms: b },
            ) => (a - b).abs() < PARAMETER_TOLERANCE,
            (
                StimulationProtocol::ClosedLoopPhase { targeted_phase: a },
                StimulationProtocol::ClosedLoopPhase { targeted_phase: b },
            ) => (a - b).abs() < PARAMETER_TOLERANCE,
            (StimulationProtocol::Other, StimulationProtocol::Other) => true,
            _ => false,
        }
    }
}

impl fmt::Display for StimulationProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StimulationProtocol::FixedPeriod { period_ms } => write!(f, "{}ms", period_ms),
            StimulationProtocol::ClosedLoopPhase { targeted_phase } => {
                write!(f, "{} phase", targeted_phase)
            }
            StimulationProtocol::Other => write!(f, "other"),
        }
    }
}

/// A restriction of the sessions to analyze. Unset fields do not restrict anything.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct DatasetFilter {
    /// The animal; an empty name matches every animal.
    #[serde(default)]
    pub animal: Option<String>,
    #[serde(default)]
    pub track_type: Option<TrackType>,
    #[serde(default)]
    pub protocol: Option<StimulationProtocol>,
    /// Sessions must have strictly longer pulses.
    #[serde(default)]
    pub min_pulse_length_ms: Option<f64>,
    /// Sessions must have strictly shorter pulses.
    #[serde(default)]
    pub max_pulse_length_ms: Option<f64>,
    #[serde(default)]
    pub transfected: Option<bool>,
    #[serde(default)]
    pub laser_power: Option<f64>,
}

impl DatasetFilter {
    /// Check whether a session satisfies every restriction of the filter.
    /// A session lacking a restricted attribute does not match.
    pub fn matches(&self, session: &SessionRecord) -> bool {
        if let Some(animal) = &self.animal {
            if !animal.is_empty() && animal != &session.animal {
                return false;
            }
        }
        if let Some(track_type) = &self.track_type {
            if session.track_type.as_ref() != Some(track_type) {
                return false;
            }
        }
        if let Some(protocol) = &self.protocol {
            if !protocol.matches(&session.protocol) {
                return false;
            }
        }
        if let Some(min) = self.min_pulse_length_ms {
            if !session.pulse_length_ms.is_some_and(|length| length > min) {
                return false;
            }
        }
        if let Some(max) = self.max_pulse_length_ms {
            if !session.pulse_length_ms.is_some_and(|length| length < max) {
                return false;
            }
        }
        if let Some(transfected) = self.transfected {
            if session.transfected != Some(transfected) {
                return false;
            }
        }
        if let Some(power) = self.laser_power {
            if !session
                .laser_power
                .is_some_and(|p| (p - power).abs() < PARAMETER_TOLERANCE)
            {
                return false;
            }
        }
        true
    }

    /// Returns the driving period of the restricted protocol, if any.
    pub fn period_ms(&self) -> Option<f64> {
        self.protocol.as_ref().and_then(|p| p.period_ms())
    }

    /// Returns the restrictions as (key, value) pairs, in a fixed order.
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut description = vec![];
        if let Some(animal) = &self.animal {
            description.push(("animal".to_string(), animal.clone()));
        }
        if let Some(track_type) = &self.track_type {
            description.push(("track_type".to_string(), track_type.to_string()));
        }
        match &self.protocol {
            Some(StimulationProtocol::FixedPeriod { period_ms }) => {
                description.push(("period_ms".to_string(), period_ms.to_string()))
            }
            Some(StimulationProtocol::ClosedLoopPhase { targeted_phase }) => {
                description.push(("targeted_phase".to_string(), targeted_phase.to_string()))
            }
            Some(StimulationProtocol::Other) => {
                description.push(("protocol".to_string(), "other".to_string()))
            }
            None => {}
        }
        if let Some(min) = self.min_pulse_length_ms {
            description.push(("min_pulse_length".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_pulse_length_ms {
            description.push(("max_pulse_length".to_string(), max.to_string()));
        }
        if let Some(transfected) = self.transfected {
            description.push(("transfected".to_string(), transfected.to_string()));
        }
        if let Some(power) = self.laser_power {
            description.push(("laser_power".to_string(), power.to_string()));
        }
        description
    }

    /// A short title, e.g., "rat1: 125ms opto stim".
    pub fn title(&self) -> String {
        let animal = self.animal.as_deref().unwrap_or("all animals");
        match &self.protocol {
            Some(protocol) => format!("{}: {} opto stim", animal, protocol),
            None => format!("{}: opto stim", animal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interval::IntervalSet;

    fn session() -> SessionRecord {
        SessionRecord {
            nwb_file_name: "rat1_20240101_.nwb".to_string(),
            position_interval_name: "pos 1 valid times".to_string(),
            animal: "rat1".to_string(),
            track_type: Some(TrackType::WTrack),
            protocol: StimulationProtocol::FixedPeriod { period_ms: 125.0 },
            pulse_length_ms: Some(40.0),
            transfected: Some(true),
            laser_power: None,
            run_intervals: IntervalSet::new_empty(),
            port_free_intervals: None,
            control_intervals: IntervalSet::new_empty(),
            test_intervals: IntervalSet::new_empty(),
            units: vec![],
            stimulus_times: vec![],
            decoding_models: vec![],
        }
    }

    #[test]
    fn test_track_type_aliases() {
        for alias in WTRACK_ALIASES {
            assert_eq!(TrackType::parse(alias), TrackType::WTrack);
        }
        for alias in LINEARTRACK_ALIASES {
            assert_eq!(TrackType::parse(alias), TrackType::LinearTrack);
        }
        assert_eq!(
            TrackType::parse("open field"),
            TrackType::Other("open field".to_string())
        );
        assert_eq!(
            serde_json::from_str::<TrackType>(r#""W track""#).unwrap(),
            TrackType::WTrack
        );
        assert_eq!(
            serde_json::to_string(&TrackType::LinearTrack).unwrap(),
            r#""lineartrack""#
        );
    }

    #[test]
    fn test_protocol_serde() {
        let protocol: StimulationProtocol =
            serde_json::from_str(r#"{"kind": "fixed-period", "period_ms": 80.0}"#).unwrap();
        assert_eq!(protocol, StimulationProtocol::FixedPeriod { period_ms: 80.0 });
        assert_eq!(protocol.period_ms(), Some(80.0));

        let protocol: StimulationProtocol =
            serde_json::from_str(r#"{"kind": "closed-loop-phase", "targeted_phase": 90.0}"#)
                .unwrap();
        assert_eq!(protocol.period_ms(), None);
        assert_eq!(protocol.to_string(), "90 phase");
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(DatasetFilter::default().matches(&session()));

        let filter = DatasetFilter {
            animal: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.matches(&session()));
    }

    #[test]
    fn test_filter_matches() {
        let session = session();

        let filter = DatasetFilter {
            animal: Some("rat1".to_string()),
            track_type: Some(TrackType::parse("w-track")),
            protocol: Some(StimulationProtocol::FixedPeriod { period_ms: 125.0 }),
            ..Default::default()
        };
        assert!(filter.matches(&session));

        let filter = DatasetFilter {
            animal: Some("rat2".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&session));

        let filter = DatasetFilter {
            protocol: Some(StimulationProtocol::ClosedLoopPhase {
                targeted_phase: 125.0,
            }),
            ..Default::default()
        };
        assert!(!filter.matches(&session));

        let filter = DatasetFilter {
            track_type: Some(TrackType::LinearTrack),
            ..Default::default()
        };
        assert!(!filter.matches(&session));
    }

    #[test]
    fn test_pulse_length_bounds_are_strict() {
        let session = session();
        let within = |min: Option<f64>, max: Option<f64>| {
            DatasetFilter {
                min_pulse_length_ms: min,
                max_pulse_length_ms: max,
                ..Default::default()
            }
            .matches(&session)
        };
        assert!(within(Some(39.0), Some(41.0)));
        assert!(!within(Some(40.0), None));
        assert!(!within(None, Some(40.0)));

        let mut no_pulse = self::session();
        no_pulse.pulse_length_ms = None;
        let filter = DatasetFilter {
            min_pulse_length_ms: Some(0.0),
            ..Default::default()
        };
        assert!(!filter.matches(&no_pulse));
    }

    #[test]
    fn test_transfected_and_laser_power() {
        let session = session();
        let filter = DatasetFilter {
            transfected: Some(false),
            ..Default::default()
        };
        assert!(!filter.matches(&session));

        let filter = DatasetFilter {
            laser_power: Some(5.0),
            ..Default::default()
        };
        assert!(!filter.matches(&session));
    }

    #[test]
    fn test_describe() {
        let filter = DatasetFilter {
            animal: Some("rat1".to_string()),
            protocol: Some(StimulationProtocol::FixedPeriod { period_ms: 125.0 }),
            min_pulse_length_ms: Some(30.0),
            ..Default::default()
        };
        assert_eq!(
            filter.describe(),
            vec![
                ("animal".to_string(), "rat1".to_string()),
                ("period_ms".to_string(), "125".to_string()),
                ("min_pulse_length".to_string(), "30".to_string()),
            ]
        );
        assert_eq!(filter.title(), "rat1: 125ms opto stim");
        assert_eq!(filter.period_ms(), Some(125.0));
    }
}
