//! Autocorrelograms and periodicity of sorted units under optogenetic stimulation.
//!
//! For every session of the dataset, the spike trains are restricted to the valid running
//! intervals and split by stimulation condition. Units with enough spikes get one
//! autocorrelogram per condition, whose periodicity timescale is then estimated. The
//! autocorrelogram of the stimulation pulses serves as a reference.
use serde::{Deserialize, Serialize};

use crate::analysis::{argsort_by_key, UnitKey};
use crate::config::{AnalysisConfig, SpikeGate};
use crate::core::histogram::{Autocorrelogram, BinEdges, HistogramOptions};
use crate::core::periodicity::estimate_periodicity_timescale;
use crate::core::spike_train::SpikeTrain;
use crate::core::stats::{mean, quantile};
use crate::dataset::filter::DatasetFilter;
use crate::dataset::session::{Condition, SessionRecord};
use crate::dataset::store::SessionSource;
use crate::error::AnalysisError;

/// The autocorrelograms of the units of a session which pass the spike gate.
/// Rows of both conditions are aligned: row `i` always describes unit `unit_ids[i]`.
#[derive(Debug, PartialEq, Clone)]
pub struct SessionAutocorrelograms {
    pub session: String,
    pub unit_ids: Vec<usize>,
    pub control: Vec<Autocorrelogram>,
    pub test: Vec<Autocorrelogram>,
    /// Number of spikes of each unit in the test condition.
    pub test_counts: Vec<usize>,
    /// Autocorrelogram of the stimulation pulses.
    pub stimulus: Autocorrelogram,
}

impl SessionAutocorrelograms {
    pub fn condition(&self, condition: Condition) -> &[Autocorrelogram] {
        match condition {
            Condition::Control => &self.control[..],
            Condition::Test => &self.test[..],
        }
    }

    pub fn num_units(&self) -> usize {
        self.unit_ids.len()
    }
}

/// Per-bin median and quartiles of a population of autocorrelograms.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub median: Vec<f64>,
    pub lower_quartile: Vec<f64>,
    pub upper_quartile: Vec<f64>,
}

impl Summary {
    fn of_rows(rows: &[Vec<f64>]) -> Self {
        let num_bins = rows.first().map_or(0, |row| row.len());
        let mut summary = Summary::default();
        for k in 0..num_bins {
            let column: Vec<f64> = rows.iter().map(|row| row[k]).collect();
            summary.median.push(quantile(&column, 0.5).unwrap_or(f64::NAN));
            summary
                .lower_quartile
                .push(quantile(&column, 0.25).unwrap_or(f64::NAN));
            summary
                .upper_quartile
                .push(quantile(&column, 0.75).unwrap_or(f64::NAN));
        }
        summary
    }
}

/// The autocorrelograms of a condition, pooled over the dataset.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ConditionResults {
    /// The period the periodicities are expected at, in milliseconds.
    pub reference_period_ms: Option<f64>,
    /// One normalized autocorrelogram per unit (or per session for the stimulus).
    pub autocorrelograms: Vec<Vec<f64>>,
    /// The periodicities of all rows where one could be estimated, in seconds.
    pub periodicities: Vec<f64>,
    /// The same periodicities, grouped by session.
    pub session_periodicities: Vec<Vec<f64>>,
    /// The periodicity of the mean autocorrelogram.
    pub mean_periodicity: Option<f64>,
    pub summary: Summary,
}

/// The results of the autocorrelogram analysis of a dataset.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AutocorrelogramResults {
    pub title: String,
    pub filter: Vec<(String, String)>,
    /// Number of sessions matching the filter.
    pub num_sessions: usize,
    /// Number of sessions which were not skipped.
    pub num_analyzed_sessions: usize,
    pub bin_centers: Vec<f64>,
    pub units: Vec<UnitKey>,
    pub test_counts: Vec<usize>,
    /// Display order of the units, by increasing number of test spikes.
    pub unit_order: Vec<usize>,
    pub control: ConditionResults,
    pub test: ConditionResults,
    pub stimulus: ConditionResults,
}

impl AutocorrelogramResults {
    pub fn condition(&self, condition: Condition) -> &ConditionResults {
        match condition {
            Condition::Control => &self.control,
            Condition::Test => &self.test,
        }
    }
}

/// The autocorrelogram analysis, with the bin edges shared by all its autocorrelograms.
pub struct AutocorrelogramAnalysis<'a> {
    config: &'a AnalysisConfig,
    edges: BinEdges,
    options: HistogramOptions,
}

impl<'a> AutocorrelogramAnalysis<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let edges = config.histogram.edges()?;
        let options = config.histogram.options(&edges);
        Ok(AutocorrelogramAnalysis {
            config,
            edges,
            options,
        })
    }

    pub fn edges(&self) -> &BinEdges {
        &self.edges
    }

    /// Build the autocorrelogram of sorted event times.
    pub fn autocorrelogram(&self, times: &[f64]) -> Autocorrelogram {
        Autocorrelogram::build(times, &self.edges, &self.options)
    }

    /// Estimate the periodicity timescale of an autocorrelogram.
    pub fn periodicity(&self, values: &[f64]) -> Option<f64> {
        let log_values: Vec<f64> = values.iter().map(|v| v.log10()).collect();
        estimate_periodicity_timescale(
            &log_values,
            &self.edges.centers(),
            self.config.peak_min_width,
        )
    }

    fn passes_gate(&self, running: &SpikeTrain, per_condition: &[Vec<f64>; 2]) -> bool {
        match self.config.spike_gate {
            SpikeGate::Running => running.num_spikes() >= self.config.min_spikes,
            SpikeGate::EachCondition => per_condition
                .iter()
                .all(|times| times.len() >= self.config.min_spikes),
        }
    }

    /// Compute the autocorrelograms of a session.
    /// Sessions without units, valid running intervals or stimulation intervals are skipped.
    pub fn analyze_session(
        &self,
        session: &SessionRecord,
    ) -> Result<Option<SessionAutocorrelograms>, AnalysisError> {
        if session.units.is_empty() {
            log::warn!("{}: no units found, session skipped", session.name());
            return Ok(None);
        }

        let run_intervals =
            session.valid_run_intervals(self.config.filter_ports, self.config.min_run_time);
        if run_intervals.is_empty() {
            log::warn!("{}: no valid running intervals, session skipped", session.name());
            return Ok(None);
        }

        if session.control_intervals.is_empty() || session.test_intervals.is_empty() {
            log::warn!("{}: no optogenetic intervals found, session skipped", session.name());
            return Ok(None);
        }

        let stimulus = SpikeTrain::build(0, session.stimulus_times.clone())?;
        let mut results = SessionAutocorrelograms {
            session: session.nwb_file_name.clone(),
            unit_ids: vec![],
            control: vec![],
            test: vec![],
            test_counts: vec![],
            stimulus: self.autocorrelogram(stimulus.times()),
        };

        for unit in session.units.iter() {
            let running = unit.restrict_to(&run_intervals);
            let per_condition = Condition::ALL.map(|condition| {
                session
                    .condition_intervals(condition)
                    .restrict(running.times())
            });

            if !self.passes_gate(&running, &per_condition) {
                log::debug!(
                    "{}: unit {} skipped ({} running spikes, {} control, {} test)",
                    session.name(),
                    unit.id(),
                    running.num_spikes(),
                    per_condition[0].len(),
                    per_condition[1].len()
                );
                continue;
            }

            let [control, test] = per_condition;
            results.unit_ids.push(unit.id());
            results.test_counts.push(test.len());
            results.control.push(self.autocorrelogram(&control));
            results.test.push(self.autocorrelogram(&test));
        }

        log::info!(
            "{}: {} units out of {} pass the spike gate",
            session.name(),
            results.num_units(),
            session.units.len()
        );

        Ok(Some(results))
    }

    fn condition_results(
        &self,
        sessions: &[Vec<&Autocorrelogram>],
        reference_period_ms: Option<f64>,
    ) -> ConditionResults {
        let session_periodicities: Vec<Vec<f64>> = sessions
            .iter()
            .map(|rows| {
                rows.iter()
                    .filter_map(|acg| self.periodicity(acg.values()))
                    .collect()
            })
            .collect();

        let autocorrelograms: Vec<Vec<f64>> = sessions
            .iter()
            .flatten()
            .map(|acg| acg.values().to_vec())
            .collect();

        let mean_periodicity = if autocorrelograms.is_empty() {
            None
        } else {
            let mean_values: Vec<f64> = (0..self.edges.num_bins())
                .map(|k| {
                    let column: Vec<f64> = autocorrelograms.iter().map(|row| row[k]).collect();
                    mean(&column).unwrap_or(f64::NAN)
                })
                .collect();
            self.periodicity(&mean_values)
        };

        ConditionResults {
            reference_period_ms,
            periodicities: session_periodicities.iter().flatten().copied().collect(),
            session_periodicities,
            mean_periodicity,
            summary: Summary::of_rows(&autocorrelograms),
            autocorrelograms,
        }
    }

    /// Pool the autocorrelograms of the analyzed sessions.
    pub fn collect(
        &self,
        filter: &DatasetFilter,
        num_sessions: usize,
        sessions: &[SessionAutocorrelograms],
    ) -> AutocorrelogramResults {
        let units: Vec<UnitKey> = sessions
            .iter()
            .flat_map(|s| {
                s.unit_ids.iter().map(|id| UnitKey {
                    session: s.session.clone(),
                    unit: *id,
                })
            })
            .collect();
        let test_counts: Vec<usize> = sessions
            .iter()
            .flat_map(|s| s.test_counts.iter().copied())
            .collect();

        let rows = |condition: Condition| {
            sessions
                .iter()
                .map(|s| s.condition(condition).iter().collect::<Vec<_>>())
                .collect::<Vec<_>>()
        };
        let stimulus_rows: Vec<Vec<&Autocorrelogram>> =
            sessions.iter().map(|s| vec![&s.stimulus]).collect();

        let period_ms = filter.period_ms();
        AutocorrelogramResults {
            title: filter.title(),
            filter: filter.describe(),
            num_sessions,
            num_analyzed_sessions: sessions.len(),
            bin_centers: self.edges.centers(),
            unit_order: argsort_by_key(&test_counts),
            units,
            test_counts,
            control: self.condition_results(
                &rows(Condition::Control),
                Some(self.config.control_reference_period_ms),
            ),
            test: self.condition_results(&rows(Condition::Test), period_ms),
            stimulus: self.condition_results(&stimulus_rows, period_ms),
        }
    }

    /// Run the analysis on the sessions of the source matching the filter.
    pub fn run<S: SessionSource>(
        &self,
        source: &S,
        filter: &DatasetFilter,
    ) -> Result<AutocorrelogramResults, AnalysisError> {
        let sessions = source.fetch_sessions(filter)?;

        let mut analyzed = vec![];
        for session in sessions.iter() {
            if let Some(result) = self.analyze_session(session)? {
                analyzed.push(result);
            }
        }

        let results = self.collect(filter, sessions.len(), &analyzed);
        log::info!(
            "{} units analyzed over {} sessions ({} control and {} test periodicities)",
            results.units.len(),
            results.num_analyzed_sessions,
            results.control.periodicities.len(),
            results.test.periodicities.len()
        );
        Ok(results)
    }
}
