#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{self, BufReader};

use perf_reporter::prelude::*;

/// Replay a recorded collection run and write its performance report.
fn main() -> Result<(), PerfReporterError> {
    let mut reporter = PerfReporter::initialize()?;
    let configuration = reporter.configuration()?;

    if configuration.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    configuration.initialize_perf_logger();

    let delivery = if configuration.events.is_empty() {
        info!("reading events from stdin");
        let stdin = io::stdin();
        let handle = stdin.lock();
        reporter.replay(handle)?
    } else {
        info!("reading events from {}", configuration.events);
        let file = File::open(&configuration.events)?;
        reporter.replay(BufReader::new(file))?
    };

    if let PerfDelivery::Export(export) = delivery {
        export.write()?;
    }

    Ok(())
}
