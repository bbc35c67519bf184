//! Renders [`PerfMetrics`] as either a tab-separated text report or a JSON report.
//!
//! The tab-separated report always contains the timing-per-request table, and
//! optionally a per-iteration table first:
//! ```text
//! ---------- Per iteration/request ----------
//! iteration	elapsed (ms)	name	status codes
//! 0	150	A	1(200), 1(500)
//! 1	200	A	1(200)
//! ---------- Timing per request (ms) ----------
//! t_min	t_median	t_max	name
//! 150	175	200	A
//! ```

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metrics::{IterationSummary, PerfMetrics, RequestSummary};
use crate::PerfReporterError;

/// Heading of the optional per-iteration table.
pub const PER_ITERATION_HEADING: &str = "---------- Per iteration/request ----------";
/// Column headers of the per-iteration table.
pub const PER_ITERATION_HEADER: &str = "iteration\telapsed (ms)\tname\tstatus codes";
/// Heading of the timing-per-request table.
pub const PER_REQUEST_HEADING: &str = "---------- Timing per request (ms) ----------";
/// Column headers of the timing-per-request table.
pub const PER_REQUEST_HEADER: &str = "t_min\tt_median\tt_max\tname";

/// The supported report formats.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum PerfReportFormat {
    /// Human readable tab-separated tables (default).
    Tsv,
    /// Structured JSON.
    Json,
}
impl PerfReportFormat {
    /// Select the format from the `--json` flag.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            PerfReportFormat::Json
        } else {
            PerfReportFormat::Tsv
        }
    }

    /// File extension used for reports of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            PerfReportFormat::Tsv => "tsv",
            PerfReportFormat::Json => "json",
        }
    }
}
impl fmt::Display for PerfReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Render the complete report in the requested format.
pub fn render(
    metrics: &PerfMetrics,
    format: PerfReportFormat,
) -> Result<String, PerfReporterError> {
    info!(
        "rendering {} report ({} requests, {} iteration summaries)",
        format,
        metrics.per_request.len(),
        metrics.per_iteration.len()
    );
    match format {
        PerfReportFormat::Json => Ok(serde_json::to_string(metrics)?),
        PerfReportFormat::Tsv => render_tsv(metrics),
    }
}

/// Render the tab-separated report.
pub fn render_tsv(metrics: &PerfMetrics) -> Result<String, PerfReporterError> {
    let mut buffer = String::new();

    if metrics.display_per_iteration {
        buffer.push_str(PER_ITERATION_HEADING);
        buffer.push('\n');
        buffer.push_str(PER_ITERATION_HEADER);
        buffer.push('\n');
        for summary in &metrics.per_iteration {
            buffer.push_str(&per_iteration_line(summary));
            buffer.push('\n');
        }
    }

    buffer.push_str(PER_REQUEST_HEADING);
    buffer.push('\n');
    buffer.push_str(PER_REQUEST_HEADER);
    buffer.push('\n');
    for summary in &metrics.per_request {
        buffer.push_str(&per_request_line(summary)?);
        buffer.push('\n');
    }

    Ok(buffer)
}

/// One row of the per-iteration table.
fn per_iteration_line(summary: &IterationSummary) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        summary.iteration,
        summary.elapsed_ms,
        summary.name,
        format_statuses(summary)
    )
}

/// One row of the timing-per-request table.
fn per_request_line(summary: &RequestSummary) -> Result<String, PerfReporterError> {
    let q = summary.quantiles()?;
    Ok(format!(
        "{}\t{}\t{}\t{}",
        q.min, q.median, q.max, summary.name
    ))
}

/// Status code counts as `count(status)`, ordered by status code.
pub(crate) fn format_statuses(summary: &IterationSummary) -> String {
    // BTreeMap iteration is already ordered by status code.
    summary
        .statuses
        .iter()
        .map(|(status, count)| format!("{}({})", count, status))
        .join(", ")
}
