mod common;

use perf_reporter::prelude::*;

#[test]
/// A completion without a start is rejected and nothing is recorded.
fn unmatched_completion() {
    let mut reporter = common::build_reporter(vec![]);
    let error = reporter
        .request("ghost", common::at(10), 0, "A", 200)
        .unwrap_err();
    match error {
        PerfReporterError::UnmatchedCompletion { ref token, .. } => assert_eq!(token, "ghost"),
        ref other => panic!("unexpected error: {:?}", other),
    }
    assert!(error.to_string().starts_with(
        "PerfReporterError: request completed without a matching start"
    ));
    assert!(reporter.timings().is_empty());
}

#[test]
/// A reporter is single use: nothing is accepted once the run is finalized.
fn single_use() {
    let mut reporter = common::build_reporter(vec![]);
    common::time_request(&mut reporter, "a", 0, "A", 0, 10, 200);
    common::finish(&mut reporter);

    assert!(matches!(
        reporter.before_done(),
        Err(PerfReporterError::InvalidPhase {
            phase: ReporterPhase::Done,
            ..
        })
    ));
    assert!(matches!(
        reporter.before_request("b", common::at(100)),
        Err(PerfReporterError::InvalidPhase { .. })
    ));
    assert_eq!(reporter.timings().len(), 1);
}

#[test]
/// Conflicting options are reported when the run is finalized.
fn invalid_options() {
    let mut reporter = common::build_reporter(vec!["--stdout", "--export", "perf.tsv"]);
    match reporter.before_done() {
        Err(PerfReporterError::InvalidOption { option, .. }) => {
            assert_eq!(option, "`configuration.export`")
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let reporter = common::build_reporter(vec!["-v", "-q"]);
    assert!(matches!(
        reporter.configuration(),
        Err(PerfReporterError::InvalidOption { .. })
    ));
}

#[test]
/// Receiving fails if every sender goes away before the run completes.
fn senders_dropped() {
    let mut reporter = common::build_reporter(vec![]);
    let sender = reporter.sender().unwrap();
    std::thread::spawn(move || {
        sender.before_request("a").unwrap();
        sender
            .request("a", 0, ItemPath::new(vec![ItemNode::unnamed("col")]), 200)
            .unwrap();
    })
    .join()
    .unwrap();

    assert!(matches!(
        reporter.receive_events(),
        Err(PerfReporterError::ChannelClosed { .. })
    ));
    assert_eq!(reporter.timings().len(), 1);
    assert_eq!(reporter.timings().as_slice()[0].name, "col");
}
