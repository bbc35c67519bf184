use chrono::prelude::*;
use gumdrop::Options;

use perf_reporter::prelude::*;

/// Not all functions are used by all tests, so we enable allow(dead_code) to avoid
/// compiler warnings during testing.

/// Build a configuration from command line style options.
///
/// The following options are configured by default, if not set to a custom value:
///  --stdout is never set, so reports are returned as an export.
#[allow(dead_code)]
pub fn build_configuration(custom: Vec<&str>) -> PerfConfiguration {
    // Parse these options to generate a PerfConfiguration.
    PerfConfiguration::parse_args_default(&custom)
        .expect("failed to parse options and generate a configuration")
}

/// Initialize a reporter from command line style options.
#[allow(dead_code)]
pub fn build_reporter(custom: Vec<&str>) -> PerfReporter {
    PerfReporter::initialize_with_config(build_configuration(custom))
        .expect("failed to initialize reporter")
}

/// A fixed wall clock instant, offset by `ms` milliseconds.
#[allow(dead_code)]
pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_714_557_600_000 + ms).unwrap()
}

/// Notify the reporter of a request started at `start_ms` that took `elapsed_ms`.
#[allow(dead_code)]
pub fn time_request(
    reporter: &mut PerfReporter,
    token: &str,
    iteration: usize,
    name: &str,
    start_ms: i64,
    elapsed_ms: i64,
    status: u16,
) {
    reporter
        .before_request(token, at(start_ms))
        .expect("beforeRequest rejected");
    reporter
        .request(token, at(start_ms + elapsed_ms), iteration, name, status)
        .expect("request rejected");
}

/// Notify the reporter of a small run with two requests over three iterations:
///  - iteration 0: `Users/List` twice (30ms + 20ms, both 200), `Users/Create` (80ms, 201)
///  - iteration 1: `Users/List` (40ms, 500), `Users/Create` (120ms, no response)
///  - iteration 2: `Users/List` (60ms, 200)
#[allow(dead_code)]
pub fn run_users_collection(reporter: &mut PerfReporter) {
    time_request(reporter, "1", 0, "Users/List", 0, 30, 200);
    time_request(reporter, "2", 0, "Users/Create", 100, 80, 201);
    time_request(reporter, "3", 0, "Users/List", 200, 20, 200);
    time_request(reporter, "4", 1, "Users/List", 300, 40, 500);
    time_request(reporter, "5", 1, "Users/Create", 400, 120, 0);
    time_request(reporter, "6", 2, "Users/List", 600, 60, 200);
}

/// Finalize the run, expecting the report to be handed over for export.
#[allow(dead_code)]
pub fn finish(reporter: &mut PerfReporter) -> PerfExport {
    match reporter.before_done().expect("beforeDone rejected") {
        PerfDelivery::Export(export) => export,
        other => panic!("expected an export, got {:?}", other),
    }
}

/// Helper to delete test artifacts, if existing.
#[allow(dead_code)]
pub fn cleanup_files(files: Vec<&str>) {
    for file in files {
        if std::path::Path::new(file).exists() {
            std::fs::remove_file(file).expect("failed to remove file");
        }
    }
}
