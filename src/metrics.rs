//! Raw request timings and the summaries aggregated from them.
//!
//! Every completed request becomes a [`RawTiming`], appended to the run's
//! [`TimingLog`]. When the run finishes the log is reduced in two stages:
//!
//! 1. [`aggregate_iterations`] collapses repeats of the same request within one
//!    iteration into an [`IterationSummary`], summing their durations and counting
//!    their status codes.
//! 2. [`aggregate_requests`] collapses each request's per-iteration totals into a
//!    [`RequestSummary`], one duration per iteration in which the request ran.
//!
//! The result is wrapped in [`PerfMetrics`], which serializes to the structured
//! report format. [`Quantiles`] are computed from each [`RequestSummary`] only
//! when the report is rendered.

mod quantile;

pub use quantile::{quantiles, Quantiles};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::PerfReporterError;

/// One completed request observation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawTiming {
    /// Zero-based index of the iteration the request ran in.
    pub iteration: usize,
    /// Hierarchical display name of the request, for example `Users/Create user`.
    pub name: String,
    /// How many milliseconds the request took.
    #[serde(rename = "elapsedMS")]
    pub elapsed_ms: u64,
    /// The response status code, `0` if no response was received.
    pub status: u16,
}
impl RawTiming {
    pub fn new(iteration: usize, name: String, elapsed_ms: u64, status: u16) -> Self {
        RawTiming {
            iteration,
            name,
            elapsed_ms,
            status,
        }
    }
}

/// Append-only, ordered log of every [`RawTiming`] observed during a run.
#[derive(Debug, Clone, Default)]
pub struct TimingLog {
    timings: Vec<RawTiming>,
}
impl TimingLog {
    pub fn new() -> Self {
        TimingLog::default()
    }

    pub fn push(&mut self, timing: RawTiming) {
        trace!(
            "logged {} (iteration {}): {}ms [{}]",
            timing.name,
            timing.iteration,
            timing.elapsed_ms,
            timing.status
        );
        self.timings.push(timing);
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn as_slice(&self) -> &[RawTiming] {
        &self.timings
    }
}

/// All [`RawTiming`]s sharing one iteration and display name.
///
/// A request can run more than once within an iteration (retries, loops), in which
/// case its durations are summed and each status code is counted.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    /// Zero-based index of the iteration.
    pub iteration: usize,
    /// Display name of the request.
    pub name: String,
    /// Combined milliseconds of every repeat of this request during the iteration.
    #[serde(rename = "elapsedMS")]
    pub elapsed_ms: u64,
    /// How often each status code was returned, keyed by status code.
    pub statuses: BTreeMap<u16, usize>,
}
impl IterationSummary {
    fn new(iteration: usize, name: &str) -> Self {
        IterationSummary {
            iteration,
            name: name.to_string(),
            elapsed_ms: 0,
            statuses: BTreeMap::new(),
        }
    }

    /// Fold one more repeat of this request into the summary.
    fn record(&mut self, timing: &RawTiming) {
        self.elapsed_ms += timing.elapsed_ms;
        *self.statuses.entry(timing.status).or_insert(0) += 1;
    }

    /// How many [`RawTiming`]s were folded into this summary.
    pub fn count(&self) -> usize {
        self.statuses.values().sum()
    }
}

/// All [`IterationSummary`]s sharing one display name, across every iteration.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RequestSummary {
    /// Display name of the request.
    pub name: String,
    /// Summed duration of the request in each iteration it ran in, in iteration order.
    ///
    /// Iterations in which the request did not run contribute nothing.
    #[serde(rename = "elapsedMSes")]
    pub elapsed_ms_list: Vec<u64>,
}
impl RequestSummary {
    /// The min/median/max of this request's per-iteration durations.
    pub fn quantiles(&self) -> Result<Quantiles, PerfReporterError> {
        quantiles(&self.elapsed_ms_list).map_err(|_| PerfReporterError::EmptySamples {
            detail: format!("request `{}` has no recorded iterations", self.name),
        })
    }
}

/// Stage one: collapse [`RawTiming`]s into one [`IterationSummary`] per (iteration, name).
///
/// Summaries are returned ordered by iteration and then by name, regardless of the
/// order of `timings`.
pub fn aggregate_iterations(timings: &[RawTiming]) -> Vec<IterationSummary> {
    let mut groups: BTreeMap<(usize, &str), IterationSummary> = BTreeMap::new();
    for timing in timings {
        groups
            .entry((timing.iteration, timing.name.as_str()))
            .or_insert_with(|| IterationSummary::new(timing.iteration, &timing.name))
            .record(timing);
    }
    debug!(
        "aggregated {} timings into {} iteration summaries",
        timings.len(),
        groups.len()
    );
    groups.into_iter().map(|(_, summary)| summary).collect()
}

/// Stage two: collapse [`IterationSummary`]s into one [`RequestSummary`] per name.
///
/// Summaries are returned ordered by name, and each duration list is in iteration
/// order, regardless of the order of `summaries`.
pub fn aggregate_requests(summaries: &[IterationSummary]) -> Vec<RequestSummary> {
    let mut groups: BTreeMap<&str, BTreeMap<usize, u64>> = BTreeMap::new();
    for summary in summaries {
        *groups
            .entry(summary.name.as_str())
            .or_insert_with(BTreeMap::new)
            .entry(summary.iteration)
            .or_insert(0) += summary.elapsed_ms;
    }
    debug!(
        "aggregated {} iteration summaries into {} request summaries",
        summaries.len(),
        groups.len()
    );
    groups
        .into_iter()
        .map(|(name, per_iteration)| RequestSummary {
            name: name.to_string(),
            elapsed_ms_list: per_iteration.into_iter().map(|(_, ms)| ms).collect(),
        })
        .collect()
}

/// The aggregated timings of one complete run.
///
/// When serialized, `perIteration` is only included if `display_per_iteration` is
/// set, and each `perRequest` entry is extended with its `elapsedMSesQuantiles`:
/// ```json
/// {
///   "perIteration": [
///     {"iteration": 0, "name": "A", "elapsedMS": 150, "statuses": {"200": 1, "500": 1}},
///     {"iteration": 1, "name": "A", "elapsedMS": 200, "statuses": {"200": 1}}
///   ],
///   "perRequest": [
///     {"name": "A", "elapsedMSes": [150, 200],
///      "elapsedMSesQuantiles": {"min": 150, "median": 175, "max": 200}}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerfMetrics {
    /// One summary per distinct (iteration, name), ordered by iteration then name.
    pub per_iteration: Vec<IterationSummary>,
    /// One summary per distinct name, ordered by name.
    pub per_request: Vec<RequestSummary>,
    /// Flag indicating whether or not to include `per_iteration` in reports.
    pub display_per_iteration: bool,
}
impl PerfMetrics {
    /// Run both aggregation stages over a complete [`TimingLog`].
    pub fn from_log(log: &TimingLog, display_per_iteration: bool) -> Self {
        let per_iteration = aggregate_iterations(log.as_slice());
        let per_request = aggregate_requests(&per_iteration);
        PerfMetrics {
            per_iteration,
            per_request,
            display_per_iteration,
        }
    }
}

/// A [`RequestSummary`] extended with its quantiles for the structured report.
#[derive(Serialize)]
struct RequestSummaryReport<'a> {
    name: &'a str,
    #[serde(rename = "elapsedMSes")]
    elapsed_ms_list: &'a [u64],
    #[serde(rename = "elapsedMSesQuantiles")]
    quantiles: Quantiles,
}

/// Implement Serialize for PerfMetrics, projecting quantiles at serialization time.
impl Serialize for PerfMetrics {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut per_request = Vec::with_capacity(self.per_request.len());
        for summary in &self.per_request {
            let quantiles = summary
                .quantiles()
                .map_err(<S::Error as serde::ser::Error>::custom)?;
            per_request.push(RequestSummaryReport {
                name: &summary.name,
                elapsed_ms_list: &summary.elapsed_ms_list,
                quantiles,
            });
        }

        let fields = if self.display_per_iteration { 2 } else { 1 };
        let mut s = serializer.serialize_struct("PerfMetrics", fields)?;
        if self.display_per_iteration {
            s.serialize_field("perIteration", &self.per_iteration)?;
        } else {
            s.skip_field("perIteration")?;
        }
        s.serialize_field("perRequest", &per_request)?;
        s.end()
    }
}
