//! Delivers a rendered report to standard output or to a file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::report::PerfReportFormat;
use crate::PerfReporterError;

/// Logical name under which the report is exported.
pub const EXPORT_NAME: &str = "perf-reporter";

/// Default report file name, without the extension.
pub const DEFAULT_FILE_STEM: &str = "newman-run-report-perf";

/// What happened to a rendered report.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PerfDelivery {
    /// The report was written to standard output.
    Stdout {
        /// The report as written.
        content: String,
    },
    /// The report is handed over to be written to a file.
    Export(PerfExport),
}

/// A report ready to be written to a file.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PerfExport {
    /// Logical name of the exporter, always [`EXPORT_NAME`].
    pub name: String,
    /// File name used when no explicit path is configured.
    pub default: String,
    /// Optional explicit destination.
    pub path: Option<PathBuf>,
    /// The rendered report.
    pub content: String,
}
impl PerfExport {
    /// Describe an export of `content` in `format`, optionally to an explicit `path`.
    pub fn new(format: PerfReportFormat, path: Option<PathBuf>, content: String) -> Self {
        PerfExport {
            name: EXPORT_NAME.to_string(),
            default: default_file_name(format),
            path,
            content,
        }
    }

    /// Where [`write`](#method.write) will put the report.
    ///
    /// An explicit path that names an existing directory receives the default file
    /// name; without an explicit path the default file name is used as is.
    pub fn destination(&self) -> PathBuf {
        match self.path.as_ref() {
            Some(path) if path.is_dir() => path.join(&self.default),
            Some(path) => path.clone(),
            None => PathBuf::from(&self.default),
        }
    }

    /// Write the report, creating missing parent directories. Returns the path written.
    pub fn write(&self) -> Result<PathBuf, PerfReporterError> {
        let destination = self.destination();
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("creating report directory: {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&destination, self.content.as_bytes())?;
        info!("wrote {} report to {}", self.name, destination.display());
        Ok(destination)
    }
}

/// The default report file name for `format`, for example `newman-run-report-perf.tsv`.
pub fn default_file_name(format: PerfReportFormat) -> String {
    format!("{}.{}", DEFAULT_FILE_STEM, format.extension())
}

/// Write a rendered report to standard output.
pub(crate) fn write_stdout(content: &str) -> Result<(), PerfReporterError> {
    write_to(&mut std::io::stdout().lock(), content)
}

/// Write a rendered report to any writer, followed by a newline.
pub(crate) fn write_to<W: Write>(writer: &mut W, content: &str) -> Result<(), PerfReporterError> {
    writeln!(writer, "{}", content)?;
    writer.flush()?;
    Ok(())
}
