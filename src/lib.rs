//! # Perf Reporter
//!
//! Perf Reporter turns the request notifications of an API collection run into a
//! performance report.
//!
//! The execution engine running the collection notifies the reporter immediately
//! before each request is sent, again when each request completes, and one final
//! time when the run is complete. The reporter pairs each start with its completion
//! to measure how long the request took, and when the run is complete aggregates the
//! measurements in two stages:
//!
//! 1. Repeats of the same request within one iteration are summed, and their status
//!    codes counted.
//! 2. Each request's per-iteration totals are reduced to a minimum, median and
//!    maximum.
//!
//! The report is rendered either as tab-separated tables (the default) or as JSON,
//! and is written to standard out or handed over to be exported to a file.
//!
//! ## Reporting on a run
//!
//! Add the following boilerplate `use` declaration:
//!
//! ```rust
//! use perf_reporter::prelude::*;
//! ```
//!
//! Then initialize a [`PerfReporter`], optionally set some defaults, and forward the
//! engine's notifications:
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use perf_reporter::prelude::*;
//!
//! fn main() -> Result<(), PerfReporterError> {
//!     let mut reporter = PerfReporter::initialize_with_config(PerfConfiguration::default())?
//!         .set_default(PerfDefault::Json, true)?
//!         .set_default(PerfDefault::Stdout, true)?;
//!
//!     let started = Utc::now();
//!     reporter.before_request("call-1", started)?;
//!     reporter.request("call-1", started + Duration::milliseconds(120), 0, "Login", 200)?;
//!
//!     // Prints {"perRequest":[{"name":"Login","elapsedMSes":[120],...}]}
//!     let _delivery = reporter.before_done()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Engines that run requests on multiple threads instead give each thread a
//! [`RunEventSender`](./events/struct.RunEventSender.html) and let the reporter drain
//! them with [`PerfReporter::receive_events`].
//!
//! ## Run-time options
//!
//! Options are described by [`PerfConfiguration`](./config/struct.PerfConfiguration.html).
//! Run the `perf-reporter` binary with `-h` for a summary.

#[macro_use]
extern crate log;

pub mod config;
pub mod events;
pub mod export;
pub mod metrics;
pub mod naming;
pub mod prelude;
pub mod report;
pub mod timing;

use chrono::prelude::*;
use gumdrop::Options;
use std::io::BufRead;
use std::{fmt, io};

use crate::config::{PerfConfiguration, PerfDefaults};
use crate::events::{RunEvent, RunEventSender};
use crate::export::{PerfDelivery, PerfExport};
use crate::metrics::{PerfMetrics, TimingLog};
use crate::naming::ResolveName;
use crate::timing::{CorrelationToken, TimingCorrelator};

/// An enumeration of all errors a [`PerfReporter`] can return.
#[derive(Debug)]
pub enum PerfReporterError {
    /// Wraps a [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html).
    Io(io::Error),
    /// Wraps a [`serde_json::Error`](https://docs.rs/serde_json/*/serde_json/struct.Error.html).
    Json(serde_json::Error),
    /// Invalid option or value specified, may only be invalid in context.
    InvalidOption {
        /// The invalid option that caused this error, may be only invalid in context.
        option: String,
        /// The invalid value that caused this error, may be only invalid in context.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// A notification arrived after the run was already finalized.
    InvalidPhase {
        /// The phase the reporter was in.
        phase: ReporterPhase,
        /// An optional explanation of the error.
        detail: String,
    },
    /// A request completed without a matching start.
    UnmatchedCompletion {
        /// The correlation token of the completed request.
        token: String,
        /// An optional explanation of the error.
        detail: String,
    },
    /// Quantiles were requested for an empty list of durations.
    EmptySamples {
        /// An optional explanation of the error.
        detail: String,
    },
    /// The channel between the execution engine and the reporter is closed.
    ChannelClosed {
        /// An optional explanation of the error.
        detail: String,
    },
}
/// Implement a helper to provide a text description of all possible types of errors.
impl PerfReporterError {
    fn describe(&self) -> &str {
        match *self {
            PerfReporterError::Io(_) => "io::Error",
            PerfReporterError::Json(_) => "serde_json::Error",
            PerfReporterError::InvalidOption { .. } => "invalid option or value specified",
            PerfReporterError::InvalidPhase { .. } => "notification received in invalid phase",
            PerfReporterError::UnmatchedCompletion { .. } => {
                "request completed without a matching start"
            }
            PerfReporterError::EmptySamples { .. } => "no samples to compute quantiles from",
            PerfReporterError::ChannelClosed { .. } => "event channel closed",
        }
    }
}

/// Implement format trait to allow displaying errors.
impl fmt::Display for PerfReporterError {
    // Implement display of error with `{}` marker.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PerfReporterError::Io(ref source) => {
                write!(f, "PerfReporterError: {} ({})", self.describe(), source)
            }
            PerfReporterError::Json(ref source) => {
                write!(f, "PerfReporterError: {} ({})", self.describe(), source)
            }
            PerfReporterError::InvalidOption { ref detail, .. }
            | PerfReporterError::InvalidPhase { ref detail, .. }
            | PerfReporterError::UnmatchedCompletion { ref detail, .. }
            | PerfReporterError::EmptySamples { ref detail }
            | PerfReporterError::ChannelClosed { ref detail } => {
                write!(f, "PerfReporterError: {} ({})", self.describe(), detail)
            }
        }
    }
}

// Define the lower level source of this error, if any.
impl std::error::Error for PerfReporterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            PerfReporterError::Io(ref source) => Some(source),
            PerfReporterError::Json(ref source) => Some(source),
            _ => None,
        }
    }
}

/// Auto-convert IO errors.
impl From<io::Error> for PerfReporterError {
    fn from(err: io::Error) -> PerfReporterError {
        PerfReporterError::Io(err)
    }
}

/// Auto-convert JSON errors.
impl From<serde_json::Error> for PerfReporterError {
    fn from(err: serde_json::Error) -> PerfReporterError {
        PerfReporterError::Json(err)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// A [`PerfReporter`] moves through each of the following phases, in order, exactly
/// once.
pub enum ReporterPhase {
    /// No request has started yet.
    Idle,
    /// Requests are being timed.
    Collecting,
    /// The run is complete and the report is being built.
    Finalizing,
    /// The report has been delivered, no further notifications are accepted.
    Done,
}
impl fmt::Display for ReporterPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let phase = match self {
            ReporterPhase::Idle => "idle",
            ReporterPhase::Collecting => "collecting",
            ReporterPhase::Finalizing => "finalizing",
            ReporterPhase::Done => "done",
        };
        f.write_str(phase)
    }
}

/// Global state of the reporter for one run.
pub struct PerfReporter {
    /// Optional default values for run-time options.
    defaults: PerfDefaults,
    /// Configuration object holding options set when launching the reporter.
    configuration: PerfConfiguration,
    /// Which phase the reporter is currently operating in.
    phase: ReporterPhase,
    /// Start timestamps of requests that have not completed yet.
    correlator: TimingCorrelator,
    /// Every completed request, in completion order.
    log: TimingLog,
    /// Unbounded sender cloned into each [`RunEventSender`], dropped once the
    /// reporter starts receiving.
    tx: Option<flume::Sender<RunEvent>>,
    /// Unbounded receiver drained by [`PerfReporter::receive_events`].
    rx: flume::Receiver<RunEvent>,
    /// The aggregated metrics, once the run is finalized.
    metrics: Option<PerfMetrics>,
}
/// The reporter's internal global state.
impl PerfReporter {
    /// Load configuration from the command line and initialize a [`PerfReporter`].
    ///
    /// # Example
    /// ```rust,no_run
    /// use perf_reporter::prelude::*;
    ///
    /// let reporter = PerfReporter::initialize();
    /// ```
    pub fn initialize() -> Result<PerfReporter, PerfReporterError> {
        PerfReporter::initialize_with_config(PerfConfiguration::parse_args_default_or_exit())
    }

    /// Initialize a [`PerfReporter`] with an already loaded configuration.
    ///
    /// # Example
    /// ```rust
    /// use perf_reporter::PerfReporter;
    /// use perf_reporter::config::PerfConfiguration;
    /// use gumdrop::Options;
    ///
    /// let configuration = PerfConfiguration::parse_args_default(&["--json"]).unwrap();
    /// let reporter = PerfReporter::initialize_with_config(configuration).unwrap();
    /// ```
    pub fn initialize_with_config(
        configuration: PerfConfiguration,
    ) -> Result<PerfReporter, PerfReporterError> {
        let (tx, rx) = flume::unbounded();
        Ok(PerfReporter {
            defaults: PerfDefaults::default(),
            configuration,
            phase: ReporterPhase::Idle,
            correlator: TimingCorrelator::new(),
            log: TimingLog::new(),
            tx: Some(tx),
            rx,
            metrics: None,
        })
    }

    /// The run-time configuration with defaults applied, validated.
    pub fn configuration(&self) -> Result<PerfConfiguration, PerfReporterError> {
        let mut configuration = self.configuration.clone();
        configuration.configure(&self.defaults);
        configuration.validate()?;
        Ok(configuration)
    }

    /// Which phase the reporter is in.
    pub fn phase(&self) -> &ReporterPhase {
        &self.phase
    }

    /// Every request timed so far.
    pub fn timings(&self) -> &TimingLog {
        &self.log
    }

    /// How many requests have started but not completed.
    pub fn pending(&self) -> usize {
        self.correlator.pending()
    }

    /// The aggregated metrics, available once the run is finalized.
    pub fn metrics(&self) -> Option<&PerfMetrics> {
        self.metrics.as_ref()
    }

    /// A sender for engine worker threads, see [`PerfReporter::receive_events`].
    pub fn sender(&self) -> Result<RunEventSender, PerfReporterError> {
        match self.tx.as_ref() {
            Some(tx) => Ok(RunEventSender::new(tx.clone())),
            None => Err(PerfReporterError::ChannelClosed {
                detail: "the reporter is already receiving events".to_string(),
            }),
        }
    }

    /// Notifications are only accepted until the run is finalized.
    fn accept(&self, notification: &str) -> Result<(), PerfReporterError> {
        match self.phase {
            ReporterPhase::Idle | ReporterPhase::Collecting => Ok(()),
            ReporterPhase::Finalizing | ReporterPhase::Done => {
                Err(PerfReporterError::InvalidPhase {
                    phase: self.phase.clone(),
                    detail: format!("{} received after the run was finalized", notification),
                })
            }
        }
    }

    /// The request identified by `token` is about to be sent at `at`.
    pub fn before_request<T: Into<CorrelationToken>>(
        &mut self,
        token: T,
        at: DateTime<Utc>,
    ) -> Result<(), PerfReporterError> {
        self.accept("beforeRequest")?;
        if self.phase == ReporterPhase::Idle {
            debug!("entering {} phase", ReporterPhase::Collecting);
            self.phase = ReporterPhase::Collecting;
        }
        self.correlator.start(token.into(), at);
        Ok(())
    }

    /// The request identified by `token` completed at `at` with `status`.
    ///
    /// `status` is `0` if no response was received. The timing is recorded under the
    /// display name of `item`.
    pub fn request<T: Into<CorrelationToken>, N: ResolveName + ?Sized>(
        &mut self,
        token: T,
        at: DateTime<Utc>,
        iteration: usize,
        item: &N,
        status: u16,
    ) -> Result<(), PerfReporterError> {
        self.accept("request")?;
        let timing =
            self.correlator
                .complete(&token.into(), at, iteration, item.display_name(), status)?;
        self.log.push(timing);
        Ok(())
    }

    /// The run is complete: aggregate, render and deliver the report.
    ///
    /// With `--stdout` the report is written to standard out before returning,
    /// otherwise the returned [`PerfExport`] is ready to be written with
    /// [`PerfExport::write`].
    pub fn before_done(&mut self) -> Result<PerfDelivery, PerfReporterError> {
        self.accept("beforeDone")?;
        let configuration = self.configuration()?;

        debug!("entering {} phase", ReporterPhase::Finalizing);
        self.phase = ReporterPhase::Finalizing;

        let orphaned = self.correlator.pending();
        if orphaned > 0 {
            warn!(
                "{} requests started but never completed, they are not reported",
                orphaned
            );
        }

        let metrics = PerfMetrics::from_log(&self.log, configuration.per_iteration);
        let format = configuration.report_format();
        let content = report::render(&metrics, format)?;
        self.metrics = Some(metrics);

        let delivery = if configuration.stdout {
            export::write_stdout(&content)?;
            PerfDelivery::Stdout { content }
        } else {
            PerfDelivery::Export(PerfExport::new(
                format,
                configuration.export_path(),
                content,
            ))
        };

        info!(
            "reported {} timings from {} requests",
            self.log.len(),
            self.metrics.as_ref().map_or(0, |m| m.per_request.len())
        );
        self.phase = ReporterPhase::Done;
        Ok(delivery)
    }

    /// Dispatch one [`RunEvent`], returning the delivered report once the run is done.
    pub fn handle_event(
        &mut self,
        event: RunEvent,
    ) -> Result<Option<PerfDelivery>, PerfReporterError> {
        match event {
            RunEvent::BeforeRequest { token, timestamp } => {
                self.before_request(token, timestamp)?;
                Ok(None)
            }
            RunEvent::Request {
                token,
                iteration,
                item,
                status,
                timestamp,
            } => {
                self.request(token, timestamp, iteration, &item, status)?;
                Ok(None)
            }
            RunEvent::BeforeDone => self.before_done().map(Some),
        }
    }

    /// Drain events sent through [`RunEventSender`]s until `beforeDone` is received,
    /// then deliver the report.
    ///
    /// No new senders can be created once receiving starts. If every sender is
    /// dropped before `beforeDone` arrives, the run can't complete and
    /// [`PerfReporterError::ChannelClosed`] is returned.
    pub fn receive_events(&mut self) -> Result<PerfDelivery, PerfReporterError> {
        // Only engine senders keep the channel open from here on.
        self.tx = None;

        loop {
            let event = self
                .rx
                .recv()
                .map_err(|_| PerfReporterError::ChannelClosed {
                    detail: "all senders dropped before beforeDone".to_string(),
                })?;
            trace!("received {:?}", event);
            if let Some(delivery) = self.handle_event(event)? {
                return Ok(delivery);
            }
        }
    }

    /// Replay a newline-delimited JSON event log, see
    /// [`read_events`](./events/fn.read_events.html).
    ///
    /// Events following `beforeDone` are ignored. A log that ends without
    /// `beforeDone` is returned as [`PerfReporterError::InvalidPhase`].
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<PerfDelivery, PerfReporterError> {
        let mut replayed = 0;
        for event in events::read_events(reader) {
            replayed += 1;
            if let Some(delivery) = self.handle_event(event?)? {
                debug!("replayed {} events", replayed);
                return Ok(delivery);
            }
        }
        Err(PerfReporterError::InvalidPhase {
            phase: self.phase.clone(),
            detail: format!("event log ended after {} events without beforeDone", replayed),
        })
    }
}
