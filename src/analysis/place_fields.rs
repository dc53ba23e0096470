//! Comparison of the decoded place fields of the units between stimulation conditions.
use serde::{Deserialize, Serialize};

use crate::analysis::{argsort_by_key, UnitKey};
use crate::config::AnalysisConfig;
use crate::core::stats::{median, pearson_correlation};
use crate::dataset::filter::DatasetFilter;
use crate::dataset::session::{DecodingModel, SessionRecord};
use crate::dataset::store::SessionSource;
use crate::error::AnalysisError;

/// The place fields of a unit in both conditions, before gating.
#[derive(Debug, PartialEq, Clone)]
pub struct UnitPlaceFields {
    pub key: UnitKey,
    /// Place fields normalized to sum to one.
    pub control: Vec<f64>,
    pub test: Vec<f64>,
    /// Expected number of events over the encoding intervals.
    pub control_events: f64,
    pub test_events: f64,
}

/// The results of the place-field comparison of a dataset.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PlaceFieldResults {
    pub title: String,
    pub filter: Vec<(String, String)>,
    pub num_sessions: usize,
    pub place_bin_centers: Vec<f64>,
    pub units: Vec<UnitKey>,
    pub control: Vec<Vec<f64>>,
    pub test: Vec<Vec<f64>>,
    /// Pearson correlation of the place fields of each unit; `None` for flat place fields.
    pub correlations: Vec<Option<f64>>,
    pub median_correlation: Option<f64>,
    /// Display order of the units, by position of their control place field peak.
    pub unit_order: Vec<usize>,
}

/// Returns the place field scaled to sum to one, or `None` if it has no positive mass.
fn normalize(place_field: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = place_field.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    Some(place_field.iter().map(|v| v / total).collect())
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(i_max, v_max), (i, v)| {
            if *v > v_max {
                (i, *v)
            } else {
                (i_max, v_max)
            }
        })
        .0
}

fn check_model(session: &SessionRecord, model: &DecodingModel) -> Result<(), AnalysisError> {
    let num_bins = model.place_bin_centers.len();
    if model.place_fields.len() != model.mean_rates.len() {
        return Err(AnalysisError::InconsistentData(format!(
            "{}: {} place fields for {} mean rates",
            session.name(),
            model.place_fields.len(),
            model.mean_rates.len()
        )));
    }
    if model.place_fields.iter().any(|pf| pf.len() != num_bins) {
        return Err(AnalysisError::InconsistentData(format!(
            "{}: place fields do not span the {} place bins",
            session.name(),
            num_bins
        )));
    }
    Ok(())
}

/// The place-field comparison.
pub struct PlaceFieldAnalysis<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> PlaceFieldAnalysis<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(PlaceFieldAnalysis { config })
    }

    /// Extract the place fields of the units of a session, with the place bin centers.
    /// The session must hold one control, one test and one full-epoch decoding model, and
    /// the control and test models must describe the same units over the same place bins.
    pub fn session_place_fields(
        &self,
        session: &SessionRecord,
    ) -> Result<(Vec<f64>, Vec<UnitPlaceFields>), AnalysisError> {
        let (control, test) = session.decoding_pair()?;
        check_model(session, control)?;
        check_model(session, test)?;

        if control.place_fields.len() != test.place_fields.len() {
            return Err(AnalysisError::InconsistentData(format!(
                "{}: {} control units but {} test units",
                session.name(),
                control.place_fields.len(),
                test.place_fields.len()
            )));
        }
        if control.place_bin_centers != test.place_bin_centers {
            return Err(AnalysisError::InconsistentData(format!(
                "{}: place bins differ between conditions",
                session.name()
            )));
        }

        let sampling_rate = self.config.place_fields.sampling_rate;
        let control_samples = control.encoding_intervals.total_duration() * sampling_rate;
        let test_samples = test.encoding_intervals.total_duration() * sampling_rate;

        let mut units = vec![];
        for (unit, (control_pf, test_pf)) in control
            .place_fields
            .iter()
            .zip(test.place_fields.iter())
            .enumerate()
        {
            match (normalize(control_pf), normalize(test_pf)) {
                (Some(control_pf), Some(test_pf)) => units.push(UnitPlaceFields {
                    key: UnitKey {
                        session: session.nwb_file_name.clone(),
                        unit,
                    },
                    control: control_pf,
                    test: test_pf,
                    control_events: control.mean_rates[unit] * control_samples,
                    test_events: test.mean_rates[unit] * test_samples,
                }),
                _ => log::debug!("{}: unit {} has an empty place field", session.name(), unit),
            }
        }

        Ok((test.place_bin_centers.clone(), units))
    }

    /// Check whether a unit passes the rate and specificity gates.
    pub fn passes_gates(&self, unit: &UnitPlaceFields) -> bool {
        let config = &self.config.place_fields;
        if !(unit.control_events > config.min_rate && unit.test_events > config.min_rate) {
            return false;
        }
        let min_peak = if config.filter_specificity && !unit.control.is_empty() {
            2.0 / unit.control.len() as f64
        } else {
            0.0
        };
        unit.control.iter().fold(f64::NEG_INFINITY, |a, b| a.max(*b)) > min_peak
    }

    /// Run the comparison on the sessions of the source matching the filter.
    /// All sessions must share the same place bins.
    pub fn run<S: SessionSource>(
        &self,
        source: &S,
        filter: &DatasetFilter,
    ) -> Result<PlaceFieldResults, AnalysisError> {
        let sessions = source.fetch_sessions(filter)?;

        let mut place_bin_centers: Option<Vec<f64>> = None;
        let mut units = vec![];
        for session in sessions.iter() {
            let (centers, session_units) = self.session_place_fields(session)?;
            match &place_bin_centers {
                Some(expected) if expected != &centers => {
                    return Err(AnalysisError::InconsistentData(format!(
                        "{}: place bins don't match",
                        session.name()
                    )));
                }
                Some(_) => {}
                None => place_bin_centers = Some(centers),
            }
            units.extend(session_units);
        }

        let num_units = units.len();
        let units: Vec<UnitPlaceFields> = units
            .into_iter()
            .filter(|unit| self.passes_gates(unit))
            .collect();
        log::info!("{} units out of {} pass the place-field gates", units.len(), num_units);
        if units.is_empty() {
            log::warn!("No unit left to compare");
        }

        let correlations: Vec<Option<f64>> = units
            .iter()
            .map(|unit| pearson_correlation(&unit.control, &unit.test))
            .collect();
        let valid: Vec<f64> = correlations.iter().flatten().copied().collect();
        let peaks: Vec<usize> = units.iter().map(|unit| argmax(&unit.control)).collect();

        Ok(PlaceFieldResults {
            title: filter.title(),
            filter: filter.describe(),
            num_sessions: sessions.len(),
            place_bin_centers: place_bin_centers.unwrap_or_default(),
            median_correlation: median(&valid),
            correlations,
            unit_order: argsort_by_key(&peaks),
            control: units.iter().map(|unit| unit.control.clone()).collect(),
            test: units.iter().map(|unit| unit.test.clone()).collect(),
            units: units.into_iter().map(|unit| unit.key).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interval::IntervalSet;
    use crate::dataset::filter::StimulationProtocol;
    use crate::dataset::session::Encoding;
    use crate::dataset::store::JsonSessionStore;
    use approx::assert_relative_eq;

    fn model(
        encoding: Encoding,
        place_fields: Vec<Vec<f64>>,
        mean_rates: Vec<f64>,
    ) -> DecodingModel {
        DecodingModel {
            encoding,
            // 10 s, i.e., 5000 samples at 500 Hz
            encoding_intervals: IntervalSet::from_pairs(&[(0.0, 4.0), (10.0, 16.0)]).unwrap(),
            place_fields,
            mean_rates,
            place_bin_centers: vec![0.0, 10.0, 20.0, 30.0],
        }
    }

    fn session(name: &str) -> SessionRecord {
        let control = vec![
            vec![0.0, 0.0, 8.0, 2.0],
            vec![6.0, 2.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0, 1.0],
            vec![0.0, 10.0, 0.0, 0.0],
        ];
        let test = vec![
            vec![0.0, 1.0, 6.0, 3.0],
            vec![1.0, 1.0, 2.0, 6.0],
            vec![1.0, 2.0, 1.0, 1.0],
            vec![0.0, 9.0, 1.0, 0.0],
        ];
        SessionRecord {
            nwb_file_name: name.to_string(),
            position_interval_name: "pos 1 valid times".to_string(),
            animal: "rat1".to_string(),
            track_type: None,
            protocol: StimulationProtocol::ClosedLoopPhase {
                targeted_phase: 90.0,
            },
            pulse_length_ms: None,
            transfected: None,
            laser_power: None,
            run_intervals: IntervalSet::new_empty(),
            port_free_intervals: None,
            control_intervals: IntervalSet::new_empty(),
            test_intervals: IntervalSet::new_empty(),
            units: vec![],
            stimulus_times: vec![],
            decoding_models: vec![
                model(Encoding::Control, control, vec![0.05, 0.05, 0.05, 0.01]),
                model(Encoding::Test, test, vec![0.05, 0.05, 0.05, 0.05]),
                model(Encoding::Full, vec![], vec![]),
            ],
        }
    }

    #[test]
    fn test_session_place_fields() {
        let config = AnalysisConfig::default();
        let analysis = PlaceFieldAnalysis::new(&config).unwrap();
        let (centers, units) = analysis.session_place_fields(&session("a.nwb")).unwrap();

        assert_eq!(centers, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(units.len(), 4);
        assert_eq!(units[0].control, vec![0.0, 0.0, 0.8, 0.2]);
        assert_relative_eq!(units[0].control_events, 250.0, epsilon = 1e-9);
        assert_relative_eq!(units[3].control_events, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_gates() {
        let config = AnalysisConfig::default();
        let analysis = PlaceFieldAnalysis::new(&config).unwrap();
        let (_, units) = analysis.session_place_fields(&session("a.nwb")).unwrap();

        assert!(analysis.passes_gates(&units[0]));
        assert!(analysis.passes_gates(&units[1]));
        // flat place field
        assert!(!analysis.passes_gates(&units[2]));
        // too few control events
        assert!(!analysis.passes_gates(&units[3]));

        let mut config = AnalysisConfig::default();
        config.place_fields.filter_specificity = false;
        let analysis = PlaceFieldAnalysis::new(&config).unwrap();
        assert!(analysis.passes_gates(&units[2]));
    }

    #[test]
    fn test_run() {
        let config = AnalysisConfig::default();
        let analysis = PlaceFieldAnalysis::new(&config).unwrap();
        let store = JsonSessionStore::new(vec![session("a.nwb"), session("b.nwb")]);

        let results = analysis.run(&store, &DatasetFilter::default()).unwrap();
        assert_eq!(results.num_sessions, 2);
        assert_eq!(results.units.len(), 4);
        assert_eq!(results.units[2].session, "b.nwb");
        assert_eq!(results.units[3].unit, 1);

        // unit 0 peaks at bin 2, unit 1 at bin 0
        assert_eq!(results.unit_order, vec![1, 3, 0, 2]);

        let r0 = results.correlations[0].unwrap();
        let r1 = results.correlations[1].unwrap();
        assert!(r0 > 0.8);
        assert!(r1 < 0.0);
        assert_eq!(results.title, "all animals: opto stim");
    }

    #[test]
    fn test_inconsistent_sessions() {
        let config = AnalysisConfig::default();
        let analysis = PlaceFieldAnalysis::new(&config).unwrap();

        let mut missing_model = session("a.nwb");
        missing_model.decoding_models.pop();
        let store = JsonSessionStore::new(vec![missing_model]);
        assert!(matches!(
            analysis.run(&store, &DatasetFilter::default()),
            Err(AnalysisError::InconsistentData(_))
        ));

        let mut other_bins = session("b.nwb");
        for model in other_bins.decoding_models.iter_mut() {
            model.place_bin_centers = vec![0.0, 5.0, 10.0, 15.0];
        }
        let store = JsonSessionStore::new(vec![session("a.nwb"), other_bins]);
        assert!(matches!(
            analysis.run(&store, &DatasetFilter::default()),
            Err(AnalysisError::InconsistentData(_))
        ));

        let mut missing_rate = session("c.nwb");
        missing_rate.decoding_models[0].mean_rates.pop();
        assert!(analysis.session_place_fields(&missing_rate).is_err());
    }
}
