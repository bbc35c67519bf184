mod common;

use perf_reporter::prelude::*;

// Can't be tested:
// - PerfDefault::PerfLog (logger can only be configured once)
// - PerfDefault::Verbose (logger can only be configured once)
// - PerfDefault::LogLevel (can't validate due to logger limitation)

#[test]
/// Programmatic defaults select the report format and destination.
fn defaults_shape_the_report() {
    let mut reporter = common::build_reporter(vec![])
        .set_default(PerfDefault::Json, true)
        .unwrap()
        .set_default(PerfDefault::PerIteration, true)
        .unwrap()
        .set_default(PerfDefault::Export, "reports/perf.json")
        .unwrap();

    common::time_request(&mut reporter, "a", 0, "A", 0, 20, 200);
    let export = common::finish(&mut reporter);

    assert_eq!(export.default, "newman-run-report-perf.json");
    assert_eq!(
        export.path,
        Some(std::path::PathBuf::from("reports/perf.json"))
    );
    assert!(export.content.starts_with(r#"{"perIteration":["#));
}

#[test]
/// Run-time options take precedence over programmatic defaults.
fn run_time_options_win() {
    let reporter = common::build_reporter(vec!["--export", "cli.tsv", "-q"])
        .set_default(PerfDefault::Export, "default.tsv")
        .unwrap()
        .set_default(PerfDefault::Quiet, 2)
        .unwrap()
        .set_default(PerfDefault::Events, "run.ndjson")
        .unwrap();

    let configuration = reporter.configuration().unwrap();
    assert_eq!(configuration.export, "cli.tsv");
    assert_eq!(configuration.quiet, 1);
    assert_eq!(configuration.events, "run.ndjson");
    assert!(!configuration.json);
}

#[test]
/// A default for the stdout flag switches the delivery.
fn stdout_default() {
    let mut reporter = common::build_reporter(vec![])
        .set_default(PerfDefault::Stdout, true)
        .unwrap();
    assert!(matches!(
        reporter.before_done().unwrap(),
        PerfDelivery::Stdout { .. }
    ));
}

#[test]
/// Every default must be set with the type of its option.
fn wrong_type() {
    assert!(common::build_reporter(vec![])
        .set_default(PerfDefault::Export, true)
        .is_err());
    assert!(common::build_reporter(vec![])
        .set_default(PerfDefault::Stdout, 1)
        .is_err());
    assert!(common::build_reporter(vec![])
        .set_default(PerfDefault::Verbose, "1")
        .is_err());
}
