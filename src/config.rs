//! Functions and structures related to configuring the perf reporter.
//!
//! The reporter can be configured at run time by passing in the options and flags
//! defined by the [`PerfConfiguration`] structure.
//!
//! It can be configured programmatically with [`PerfDefaultType::set_default`]. Options
//! set at run time always take precedence over programmatic defaults.

use gumdrop::Options;
use serde::{Deserialize, Serialize};
use simplelog::*;
use std::fmt::Debug;
use std::path::PathBuf;

use crate::report::PerfReportFormat;
use crate::{PerfReporter, PerfReporterError};

/// Runtime options available when launching the perf reporter.
///
/// Custom defaults can be programmatically set for these options using the
/// [`PerfDefaults`] structure.
///
/// The reporter leverages [`gumdrop`](https://docs.rs/gumdrop/) to derive the help
/// from the below structure.
#[derive(Options, Debug, Clone, Default, Serialize, Deserialize)]
#[options(
    help = r#"Aggregates per-request timings of a collection run into per-iteration totals
and min/median/max timings per request.

The following runtime options are available:"#
)]
pub struct PerfConfiguration {
    /// Displays this help
    #[options(short = "h")]
    pub help: bool,
    /// Prints version information
    // Add a blank line and then a 'Report:' header after this option
    #[options(short = "V", help = "Prints version information\n\nReport:")]
    pub version: bool,

    /// Writes a JSON report instead of tab-separated tables
    #[options(short = "j")]
    pub json: bool,
    /// Includes per-iteration timings in the report
    #[options(short = "i")]
    pub per_iteration: bool,
    /// Writes the report to stdout instead of a file
    #[options(no_short)]
    pub stdout: bool,
    /// Sets report file path (default: newman-run-report-perf.<json|tsv>)
    // Add a blank line and then a 'Logging:' header after this option
    #[options(
        short = "e",
        meta = "PATH",
        help = "Sets report file path (default: newman-run-report-perf.<json|tsv>)\n\nLogging:"
    )]
    pub export: String,

    /// Enables log file and sets name
    #[options(short = "G", meta = "NAME")]
    pub perf_log: String,
    /// Increases log file level (-g, -gg, etc)
    #[options(short = "g", count)]
    pub log_level: u8,
    /// Decreases verbosity (-q, -qq, etc)
    #[options(count, short = "q")]
    pub quiet: u8,
    /// Increases verbosity (-v, -vv, etc)
    // Add a blank line and then an 'Input:' header after this option
    #[options(
        count,
        short = "v",
        help = "Increases verbosity (-v, -vv, etc)\n\nInput:"
    )]
    pub verbose: u8,

    /// Replays run events from file (default: stdin)
    #[options(no_short, meta = "FILE")]
    pub events: String,
}

/// Optional default values for [`PerfConfiguration`] options.
#[derive(Clone, Debug, Default)]
pub struct PerfDefaults {
    /// An optional default for writing a JSON report.
    pub json: Option<bool>,
    /// An optional default for including per-iteration timings.
    pub per_iteration: Option<bool>,
    /// An optional default for writing the report to stdout.
    pub stdout: Option<bool>,
    /// An optional default for the report file path.
    pub export: Option<String>,
    /// An optional default for the log file name.
    pub perf_log: Option<String>,
    /// An optional default log file level.
    pub log_level: Option<u8>,
    /// An optional default value for quiet level.
    pub quiet: Option<u8>,
    /// An optional default value for verbosity level.
    pub verbose: Option<u8>,
    /// An optional default for the event log to replay.
    pub events: Option<String>,
}

/// Defines all [`PerfConfiguration`] options that can be programmatically configured
/// with a custom default.
#[derive(Debug)]
pub enum PerfDefault {
    /// An optional default for writing a JSON report.
    Json,
    /// An optional default for including per-iteration timings.
    PerIteration,
    /// An optional default for writing the report to stdout.
    Stdout,
    /// An optional default for the report file path.
    Export,
    /// An optional default for the log file name.
    PerfLog,
    /// An optional default log file level.
    LogLevel,
    /// An optional default value for quiet level.
    Quiet,
    /// An optional default value for verbosity level.
    Verbose,
    /// An optional default for the event log to replay.
    Events,
}

/// Run-time options can be programmatically configured with custom defaults.
///
/// The following options are configured with a borrowed string slice ([`&str`]):
///  - [`PerfDefault::Export`]
///  - [`PerfDefault::PerfLog`]
///  - [`PerfDefault::Events`]
///
/// The following options are configured with a [`usize`] integer:
///  - [`PerfDefault::LogLevel`]
///  - [`PerfDefault::Quiet`]
///  - [`PerfDefault::Verbose`]
///
/// The following flags are configured with a [`bool`] (and otherwise default to
/// [`false`]):
///  - [`PerfDefault::Json`]
///  - [`PerfDefault::PerIteration`]
///  - [`PerfDefault::Stdout`]
///
/// # Example
/// ```rust
/// use perf_reporter::prelude::*;
///
/// fn main() -> Result<(), PerfReporterError> {
///     let _reporter = PerfReporter::initialize_with_config(PerfConfiguration::default())?
///         .set_default(PerfDefault::Json, true)?
///         .set_default(PerfDefault::Export, "reports/perf.json")?;
///
///     Ok(())
/// }
/// ```
pub trait PerfDefaultType<T> {
    /// Sets a [`PerfDefault`] to the provided value. The required type of each option
    /// is documented in [`PerfDefaultType`].
    fn set_default(self, key: PerfDefault, value: T) -> Result<Self, PerfReporterError>
    where
        Self: Sized;
}
impl PerfDefaultType<&str> for PerfReporter {
    /// Sets [`PerfDefault`] to a [`&str`] value.
    fn set_default(mut self, key: PerfDefault, value: &str) -> Result<Self, PerfReporterError> {
        match key {
            PerfDefault::Export => self.defaults.export = Some(value.to_string()),
            PerfDefault::PerfLog => self.defaults.perf_log = Some(value.to_string()),
            PerfDefault::Events => self.defaults.events = Some(value.to_string()),
            PerfDefault::Json
            | PerfDefault::PerIteration
            | PerfDefault::Stdout
            | PerfDefault::LogLevel
            | PerfDefault::Quiet
            | PerfDefault::Verbose => {
                return Err(wrong_default_type(key, value, "&str"));
            }
        }
        Ok(self)
    }
}
impl PerfDefaultType<usize> for PerfReporter {
    /// Sets [`PerfDefault`] to a [`usize`] value.
    fn set_default(mut self, key: PerfDefault, value: usize) -> Result<Self, PerfReporterError> {
        match key {
            PerfDefault::LogLevel => self.defaults.log_level = Some(clamp_level(value)),
            PerfDefault::Quiet => self.defaults.quiet = Some(clamp_level(value)),
            PerfDefault::Verbose => self.defaults.verbose = Some(clamp_level(value)),
            PerfDefault::Json
            | PerfDefault::PerIteration
            | PerfDefault::Stdout
            | PerfDefault::Export
            | PerfDefault::PerfLog
            | PerfDefault::Events => {
                return Err(wrong_default_type(key, value, "usize"));
            }
        }
        Ok(self)
    }
}
impl PerfDefaultType<bool> for PerfReporter {
    /// Sets [`PerfDefault`] to a [`bool`] value.
    fn set_default(mut self, key: PerfDefault, value: bool) -> Result<Self, PerfReporterError> {
        match key {
            PerfDefault::Json => self.defaults.json = Some(value),
            PerfDefault::PerIteration => self.defaults.per_iteration = Some(value),
            PerfDefault::Stdout => self.defaults.stdout = Some(value),
            PerfDefault::Export
            | PerfDefault::PerfLog
            | PerfDefault::Events
            | PerfDefault::LogLevel
            | PerfDefault::Quiet
            | PerfDefault::Verbose => {
                return Err(wrong_default_type(key, value, "bool"));
            }
        }
        Ok(self)
    }
}

/// Verbosity counters are stored as `u8`, larger values behave like the maximum.
fn clamp_level(value: usize) -> u8 {
    if value > u8::MAX as usize {
        u8::MAX
    } else {
        value as u8
    }
}

fn wrong_default_type<T: Debug>(key: PerfDefault, value: T, expected: &str) -> PerfReporterError {
    PerfReporterError::InvalidOption {
        option: format!("PerfDefault::{:?}", key),
        value: format!("{:?}", value),
        detail: format!(
            "set_default(PerfDefault::{:?}, {:?}) expected a value of type {}.",
            key, value, expected
        ),
    }
}

/// Used internally to configure [`PerfConfiguration`] values based on precedence rules.
#[derive(Debug, Clone)]
pub(crate) struct PerfValue<'a, T> {
    /// The optional value to set.
    pub(crate) value: Option<T>,
    /// Filter using this value if true.
    pub(crate) filter: bool,
    /// An optional INFO level log message.
    pub(crate) message: &'a str,
}

pub(crate) trait PerfConfigure<T> {
    /// Set [`PerfValue`] with supported type.
    fn get_value(&self, values: Vec<PerfValue<T>>) -> Option<T>;
}

impl<T: Debug> PerfConfigure<T> for PerfConfiguration {
    /// Use the first unfiltered [`PerfValue`].
    fn get_value(&self, values: Vec<PerfValue<T>>) -> Option<T> {
        for value in values {
            if let Some(v) = value.value {
                if value.filter {
                    continue;
                } else {
                    if !value.message.is_empty() {
                        info!("{} = {:?}", value.message, v)
                    }
                    return Some(v);
                }
            }
        }
        None
    }
}

impl PerfConfiguration {
    /// Implement precedence rules for all [`PerfConfiguration`] values.
    pub(crate) fn configure(&mut self, defaults: &PerfDefaults) {
        // Configure `quiet`.
        self.quiet = self
            .get_value(vec![
                // Use --quiet if set.
                PerfValue {
                    value: Some(self.quiet),
                    filter: self.quiet == 0,
                    message: "",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.quiet,
                    filter: defaults.quiet.is_none(),
                    message: "",
                },
            ])
            .unwrap_or(0);

        // Configure `verbose`.
        self.verbose = self
            .get_value(vec![
                // Use --verbose if set.
                PerfValue {
                    value: Some(self.verbose),
                    filter: self.verbose == 0,
                    message: "",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.verbose,
                    filter: defaults.verbose.is_none(),
                    message: "",
                },
            ])
            .unwrap_or(0);

        // Configure `log_level`.
        self.log_level = self
            .get_value(vec![
                // Use --log-level if set.
                PerfValue {
                    value: Some(self.log_level),
                    filter: self.log_level == 0,
                    message: "",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.log_level,
                    filter: defaults.log_level.is_none(),
                    message: "",
                },
            ])
            .unwrap_or(0);

        // Configure `perf_log`.
        self.perf_log = self
            .get_value(vec![
                // Use --perf-log if set.
                PerfValue {
                    value: Some(self.perf_log.to_string()),
                    filter: self.perf_log.is_empty(),
                    message: "perf_log",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.perf_log.clone(),
                    filter: defaults.perf_log.is_none(),
                    message: "perf_log",
                },
            ])
            .unwrap_or_default();

        // Configure `json`.
        self.json = self
            .get_value(vec![
                // Use --json if set.
                PerfValue {
                    value: Some(self.json),
                    filter: !self.json,
                    message: "json",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.json,
                    filter: defaults.json.is_none(),
                    message: "json",
                },
            ])
            .unwrap_or(false);

        // Configure `per_iteration`.
        self.per_iteration = self
            .get_value(vec![
                // Use --per-iteration if set.
                PerfValue {
                    value: Some(self.per_iteration),
                    filter: !self.per_iteration,
                    message: "per_iteration",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.per_iteration,
                    filter: defaults.per_iteration.is_none(),
                    message: "per_iteration",
                },
            ])
            .unwrap_or(false);

        // Configure `stdout`.
        self.stdout = self
            .get_value(vec![
                // Use --stdout if set.
                PerfValue {
                    value: Some(self.stdout),
                    filter: !self.stdout,
                    message: "stdout",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.stdout,
                    filter: defaults.stdout.is_none(),
                    message: "stdout",
                },
            ])
            .unwrap_or(false);

        // Configure `export`.
        self.export = self
            .get_value(vec![
                // Use --export if set.
                PerfValue {
                    value: Some(self.export.to_string()),
                    filter: self.export.is_empty(),
                    message: "export",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.export.clone(),
                    filter: defaults.export.is_none(),
                    message: "export",
                },
            ])
            .unwrap_or_default();

        // Configure `events`.
        self.events = self
            .get_value(vec![
                // Use --events if set.
                PerfValue {
                    value: Some(self.events.to_string()),
                    filter: self.events.is_empty(),
                    message: "events",
                },
                // Otherwise use PerfDefault if set.
                PerfValue {
                    value: defaults.events.clone(),
                    filter: defaults.events.is_none(),
                    message: "events",
                },
            ])
            .unwrap_or_default();
    }

    /// Validate configured [`PerfConfiguration`] values.
    pub(crate) fn validate(&self) -> Result<(), PerfReporterError> {
        // Can't set both --verbose and --quiet.
        if self.verbose > 0 && self.quiet > 0 {
            return Err(PerfReporterError::InvalidOption {
                option: "`configuration.verbose`".to_string(),
                value: self.verbose.to_string(),
                detail: "`configuration.verbose` can not be set with `configuration.quiet`."
                    .to_string(),
            });
        }

        // Nothing is exported when writing to stdout.
        if self.stdout && !self.export.is_empty() {
            return Err(PerfReporterError::InvalidOption {
                option: "`configuration.export`".to_string(),
                value: self.export.to_string(),
                detail: "`configuration.export` can not be set with `configuration.stdout`."
                    .to_string(),
            });
        }

        Ok(())
    }

    /// The report format selected by `--json`.
    pub fn report_format(&self) -> PerfReportFormat {
        PerfReportFormat::from_json_flag(self.json)
    }

    /// The explicit report destination, if `--export` is set.
    pub fn export_path(&self) -> Option<PathBuf> {
        if self.export.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.export))
        }
    }

    /// Optionally initialize the logger which writes to standard error and/or to a
    /// configurable log file.
    ///
    /// Console output goes to standard error so it never mixes with a report written
    /// to standard out.
    pub fn initialize_perf_logger(&self) {
        // Configure debug output level.
        let debug_level = match self.verbose {
            0 => match self.quiet {
                0 => LevelFilter::Info,
                _ => LevelFilter::Warn,
            },
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Configure log file level.
        let log_level = match self.log_level {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
            debug_level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )];

        // Open the log file if configured.
        let perf_log: Option<PathBuf> = if !self.perf_log.is_empty() {
            Some(PathBuf::from(&self.perf_log))
        } else {
            None
        };
        if let Some(log_to_file) = perf_log.as_ref() {
            match std::fs::File::create(log_to_file) {
                Ok(file) => loggers.push(WriteLogger::new(log_level, Config::default(), file)),
                Err(e) => eprintln!(
                    "failed to create log file {}: {}",
                    log_to_file.display(),
                    e
                ),
            }
        }

        match CombinedLogger::init(loggers) {
            Ok(_) => (),
            Err(e) => {
                info!("failed to initialize CombinedLogger: {}", e);
            }
        }
        if let Some(log_to_file) = perf_log {
            info!("Writing to log file: {}", log_to_file.display());
        }

        info!("Output verbosity level: {}", debug_level);
        info!("Logfile verbosity level: {}", log_level);
    }
}
