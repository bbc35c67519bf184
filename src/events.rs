//! Notifications raised by the execution engine while a run is in progress.
//!
//! Engines that run requests on several threads send notifications through a
//! [`RunEventSender`], a cheap clone of an unbounded
//! [`flume channel`](https://docs.rs/flume/*/flume/fn.unbounded.html). Each
//! notification is stamped with the wall-clock time at which it was raised, so time
//! spent waiting in the channel is not counted as request time. The
//! [`PerfReporter`](../struct.PerfReporter.html) drains the channel serially.
//!
//! Notifications can also be recorded as newline-delimited JSON and replayed later
//! with [`read_events`], which is how the `perf-reporter` binary works:
//! ```json
//! {"event":"beforeRequest","token":"7c1e","timestamp":"2024-05-01T10:00:00.000Z"}
//! {"event":"request","token":"7c1e","iteration":0,"item":[{"id":"c","name":"API"},{"id":"r","name":"Login"}],"status":200,"timestamp":"2024-05-01T10:00:00.120Z"}
//! {"event":"beforeDone"}
//! ```

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

use crate::naming::ItemPath;
use crate::timing::CorrelationToken;
use crate::PerfReporterError;

/// One notification from the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RunEvent {
    /// A request is about to be sent.
    BeforeRequest {
        token: CorrelationToken,
        timestamp: DateTime<Utc>,
    },
    /// A request completed.
    Request {
        token: CorrelationToken,
        /// Zero-based index of the iteration the request ran in.
        iteration: usize,
        /// Path from the collection root to the request.
        item: ItemPath,
        /// The response status code, `0` if no response was received.
        #[serde(default)]
        status: u16,
        timestamp: DateTime<Utc>,
    },
    /// The run is complete, no further notifications follow.
    BeforeDone,
}

/// Sends [`RunEvent`]s to a [`PerfReporter`](../struct.PerfReporter.html).
///
/// Clone one sender per engine worker thread.
#[derive(Debug, Clone)]
pub struct RunEventSender {
    tx: flume::Sender<RunEvent>,
}
impl RunEventSender {
    pub(crate) fn new(tx: flume::Sender<RunEvent>) -> Self {
        RunEventSender { tx }
    }

    /// A request identified by `token` is about to be sent.
    pub fn before_request<T: Into<CorrelationToken>>(
        &self,
        token: T,
    ) -> Result<(), PerfReporterError> {
        self.send(RunEvent::BeforeRequest {
            token: token.into(),
            timestamp: Utc::now(),
        })
    }

    /// The request identified by `token` completed with `status`.
    pub fn request<T: Into<CorrelationToken>>(
        &self,
        token: T,
        iteration: usize,
        item: ItemPath,
        status: u16,
    ) -> Result<(), PerfReporterError> {
        self.send(RunEvent::Request {
            token: token.into(),
            iteration,
            item,
            status,
            timestamp: Utc::now(),
        })
    }

    /// The run is complete.
    pub fn before_done(&self) -> Result<(), PerfReporterError> {
        self.send(RunEvent::BeforeDone)
    }

    /// Forward an already stamped event, for example one being replayed.
    pub fn send(&self, event: RunEvent) -> Result<(), PerfReporterError> {
        self.tx
            .send(event)
            .map_err(|e| PerfReporterError::ChannelClosed {
                detail: format!("failed to send {:?}: reporter is gone", e.into_inner()),
            })
    }
}

/// Parse newline-delimited JSON [`RunEvent`]s. Blank lines are skipped.
///
/// Parsing is lazy: each item is the result of reading and parsing one line.
pub fn read_events<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<RunEvent, PerfReporterError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(serde_json::from_str::<RunEvent>(&line).map_err(|e| {
                warn!("invalid event on line {}: {}", index + 1, e);
                PerfReporterError::Json(e)
            })),
            Err(e) => Some(Err(PerfReporterError::Io(e))),
        })
}
