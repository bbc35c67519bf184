use serial_test::serial;
use std::process::Command;

mod common;

const EVENTS_FILE: &str = "binary-test-events.ndjson";
const DEFAULT_TSV: &str = "newman-run-report-perf.tsv";

const EVENT_LOG: &str = r#"{"event":"beforeRequest","token":"t1","timestamp":"2024-05-01T10:00:00.000Z"}
{"event":"request","token":"t1","iteration":0,"item":[{"id":"c","name":"API"},{"id":"r","name":"Health"}],"status":200,"timestamp":"2024-05-01T10:00:00.015Z"}
{"event":"beforeDone"}
"#;

fn perf_reporter(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_perf-reporter"))
        .args(args)
        .output()
        .expect("failed to run perf-reporter")
}

#[test]
#[serial]
/// The binary replays an event file and prints the report.
fn replay_to_stdout() {
    std::fs::write(EVENTS_FILE, EVENT_LOG).unwrap();

    let output = perf_reporter(&["--events", EVENTS_FILE, "--stdout", "--json", "-q"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "{\"perRequest\":[{\"name\":\"Health\",\"elapsedMSes\":[15],\"elapsedMSesQuantiles\":{\"min\":15,\"median\":15,\"max\":15}}]}\n"
    );

    common::cleanup_files(vec![EVENTS_FILE]);
}

#[test]
#[serial]
/// Without --stdout the binary writes the default report file.
fn replay_to_file() {
    std::fs::write(EVENTS_FILE, EVENT_LOG).unwrap();
    common::cleanup_files(vec![DEFAULT_TSV]);

    let output = perf_reporter(&["--events", EVENTS_FILE, "-q"]);
    assert!(output.status.success());
    assert_eq!(
        std::fs::read_to_string(DEFAULT_TSV).unwrap(),
        "---------- Timing per request (ms) ----------\nt_min\tt_median\tt_max\tname\n15\t15\t15\tHealth\n"
    );

    common::cleanup_files(vec![EVENTS_FILE, DEFAULT_TSV]);
}

#[test]
/// A missing event file is an error.
fn missing_event_file() {
    let output = perf_reporter(&["--events", "does-not-exist.ndjson", "-q"]);
    assert!(!output.status.success());
}

#[test]
fn version() {
    let output = perf_reporter(&["-V"]);
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .starts_with("perf-reporter "));
}
