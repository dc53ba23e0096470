use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use spike_periodicity::analysis::autocorrelogram::AutocorrelogramAnalysis;
use spike_periodicity::analysis::dependence::{periodicity_dependence, DrivenPeriodicities};
use spike_periodicity::analysis::place_fields::PlaceFieldAnalysis;
use spike_periodicity::config::AnalysisConfig;
use spike_periodicity::dataset::filter::{DatasetFilter, StimulationProtocol, TrackType};
use spike_periodicity::dataset::store::JsonSessionStore;
use spike_periodicity::dataset::synthetic::SyntheticSession;
use spike_periodicity::error::AnalysisError;

#[derive(Parser, Debug)]
#[command(version, about = "Periodicity of spike-sorted units under optogenetic stimulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Write the results to this file instead of the standard output
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    /// The log level, one of: off, error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,
    /// Also write the logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Autocorrelograms and periodicity of the units, per stimulation condition
    Autocorrelogram {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Comparison of the place fields between stimulation conditions
    PlaceFields {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Dependence of the periodicity on the driving period
    Dependence {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        filter: FilterArgs,
        /// The driving periods to compare, in milliseconds
        #[arg(long, value_delimiter = ',', required = true)]
        periods: Vec<f64>,
    },
    /// Autocorrelogram analysis of synthetic sessions
    Demo {
        /// The driving period of the stimulation, in milliseconds
        #[arg(long, default_value = "80.0")]
        period_ms: f64,
        /// The number of sessions
        #[arg(long, default_value = "2")]
        num_sessions: usize,
        /// The number of units per session
        #[arg(long, default_value = "10")]
        num_units: usize,
        /// The seed used for sampling the sessions
        #[arg(long, default_value = "0")]
        seed: u64,
        /// Save the synthetic sessions to this file
        #[arg(long)]
        save_sessions: Option<PathBuf>,
        /// The analysis configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// The sessions (JSON)
    #[arg(long)]
    sessions: PathBuf,
    /// The analysis configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    #[arg(long)]
    animal: Option<String>,
    /// The task, e.g., wtrack or "linear track"
    #[arg(long)]
    track_type: Option<String>,
    /// The driving period of the stimulation, in milliseconds
    #[arg(long, conflicts_with = "targeted_phase")]
    period_ms: Option<f64>,
    /// The targeted phase of closed-loop stimulation, in degrees
    #[arg(long)]
    targeted_phase: Option<f64>,
    #[arg(long)]
    min_pulse_length: Option<f64>,
    #[arg(long)]
    max_pulse_length: Option<f64>,
    #[arg(long)]
    transfected: Option<bool>,
    #[arg(long)]
    laser_power: Option<f64>,
}

impl FilterArgs {
    fn to_filter(&self) -> DatasetFilter {
        let protocol = match (self.period_ms, self.targeted_phase) {
            (Some(period_ms), _) => Some(StimulationProtocol::FixedPeriod { period_ms }),
            (None, Some(targeted_phase)) => {
                Some(StimulationProtocol::ClosedLoopPhase { targeted_phase })
            }
            (None, None) => None,
        };
        DatasetFilter {
            animal: self.animal.clone(),
            track_type: self.track_type.as_deref().map(TrackType::parse),
            protocol,
            min_pulse_length_ms: self.min_pulse_length,
            max_pulse_length_ms: self.max_pulse_length,
            transfected: self.transfected,
            laser_power: self.laser_power,
        }
    }
}

fn init_logging(level: LevelFilter, log_file: &Option<PathBuf>) -> Result<(), AnalysisError> {
    let pattern = "{d(%Y-%m-%d %H:%M:%S)} {l} - {m}\n";
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(path) = log_file {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(pattern)))
            .build(path)
            .map_err(|e| AnalysisError::IOError(e.to_string()))?;
        builder = builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    let config = builder
        .build(root.build(level))
        .map_err(|e| AnalysisError::IOError(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| AnalysisError::IOError(e.to_string()))?;
    Ok(())
}

fn load_config(path: &Option<PathBuf>) -> Result<AnalysisConfig, AnalysisError> {
    match path {
        Some(path) => AnalysisConfig::load_from(path),
        None => Ok(AnalysisConfig::default()),
    }
}

fn write_results<T: Serialize>(results: &T, output: &Option<PathBuf>) -> Result<(), AnalysisError> {
    let mut writer: BufWriter<Box<dyn Write>> = match output {
        Some(path) => BufWriter::new(Box::new(
            File::create(path).map_err(|e| AnalysisError::IOError(e.to_string()))?,
        )),
        None => BufWriter::new(Box::new(std::io::stdout())),
    };
    serde_json::to_writer_pretty(&mut writer, results)
        .map_err(|e| AnalysisError::IOError(e.to_string()))?;
    writeln!(writer).map_err(|e| AnalysisError::IOError(e.to_string()))?;
    writer.flush().map_err(|e| AnalysisError::IOError(e.to_string()))?;
    if let Some(path) = output {
        log::info!("Results saved to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<(), AnalysisError> {
    let cli = Cli::parse();
    init_logging(cli.log_level, &cli.log_file)?;
    log::debug!("{:?}", cli);

    match &cli.command {
        Command::Autocorrelogram { data, filter } => {
            let config = load_config(&data.config)?;
            let store = JsonSessionStore::load_from(&data.sessions)?;
            let analysis = AutocorrelogramAnalysis::new(&config)?;
            let results = analysis.run(&store, &filter.to_filter())?;
            write_results(&results, &cli.output)
        }
        Command::PlaceFields { data, filter } => {
            let config = load_config(&data.config)?;
            let store = JsonSessionStore::load_from(&data.sessions)?;
            let analysis = PlaceFieldAnalysis::new(&config)?;
            let results = analysis.run(&store, &filter.to_filter())?;
            write_results(&results, &cli.output)
        }
        Command::Dependence {
            data,
            filter,
            periods,
        } => {
            let config = load_config(&data.config)?;
            let store = JsonSessionStore::load_from(&data.sessions)?;
            let analysis = AutocorrelogramAnalysis::new(&config)?;

            let mut driven = vec![];
            for period_ms in periods.iter() {
                let filter = FilterArgs {
                    period_ms: Some(*period_ms),
                    targeted_phase: None,
                    ..filter.clone()
                }
                .to_filter();
                let results = analysis.run(&store, &filter)?;
                driven.push(DrivenPeriodicities {
                    period_ms: *period_ms,
                    control: results.control.periodicities,
                    test: results.test.periodicities,
                });
            }
            write_results(&periodicity_dependence(&driven, &config)?, &cli.output)
        }
        Command::Demo {
            period_ms,
            num_sessions,
            num_units,
            seed,
            save_sessions,
            config,
        } => {
            let config = load_config(config)?;
            let synthetic = SyntheticSession {
                period_ms: *period_ms,
                num_units: *num_units,
                ..Default::default()
            };

            let mut rng = ChaCha8Rng::seed_from_u64(*seed);
            let mut store = JsonSessionStore::default();
            for index in 0..*num_sessions {
                store.add_session(synthetic.sample(index, &mut rng)?);
            }
            log::info!("{} synthetic sessions sampled", store.num_sessions());

            if let Some(path) = save_sessions {
                store.save_to(path)?;
                log::info!("Sessions saved to {}", path.display());
            }

            let analysis = AutocorrelogramAnalysis::new(&config)?;
            let results = analysis.run(&store, &DatasetFilter::default())?;
            log::info!(
                "Mean autocorrelogram periodicity: {:?} s (control), {:?} s (test)",
                results.control.mean_periodicity,
                results.test.mean_periodicity
            );
            write_results(&results, &cli.output)
        }
    }
}
