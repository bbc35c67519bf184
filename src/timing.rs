//! Correlates the start and completion notifications of individual requests.
//!
//! The execution engine raises a `beforeRequest` notification immediately before
//! sending each request, and a `request` notification once the response (or an
//! error) has been received. Both carry the same [`CorrelationToken`], which the
//! [`TimingCorrelator`] uses to pair them and compute how long the request took.

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::metrics::RawTiming;
use crate::PerfReporterError;

/// Opaque identifier linking a request's start notification with its completion.
///
/// Tokens are generated by the execution engine, one per call attempt, and only
/// need to be unique among requests that are outstanding at the same time.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// Wrap an engine-provided identifier.
    pub fn new<T: Into<String>>(token: T) -> Self {
        CorrelationToken(token.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationToken {
    fn from(token: &str) -> Self {
        CorrelationToken::new(token)
    }
}

impl From<String> for CorrelationToken {
    fn from(token: String) -> Self {
        CorrelationToken(token)
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tracks one pending start timestamp per in-flight request.
///
/// Notifications are delivered to the correlator serially (see
/// [`PerfReporter::receive_events`](../struct.PerfReporter.html#method.receive_events)),
/// so a plain map is sufficient even when the engine runs requests concurrently.
#[derive(Debug, Default)]
pub struct TimingCorrelator {
    pending: HashMap<CorrelationToken, DateTime<Utc>>,
}

impl TimingCorrelator {
    pub fn new() -> Self {
        TimingCorrelator::default()
    }

    /// Record when the request identified by `token` started.
    ///
    /// If the token already has a pending start it is replaced: the last start wins.
    pub fn start(&mut self, token: CorrelationToken, at: DateTime<Utc>) {
        if let Some(previous) = self.pending.insert(token.clone(), at) {
            debug!(
                "replaced pending start for {} (was {}, now {})",
                token,
                previous.to_rfc3339(),
                at.to_rfc3339()
            );
        } else {
            trace!("pending start for {} at {}", token, at.to_rfc3339());
        }
    }

    /// Match a completion with its pending start, returning the completed timing.
    ///
    /// The pending start is removed. A completion with no pending start is a
    /// contract violation by the execution engine and is returned as
    /// [`PerfReporterError::UnmatchedCompletion`].
    pub fn complete(
        &mut self,
        token: &CorrelationToken,
        at: DateTime<Utc>,
        iteration: usize,
        name: String,
        status: u16,
    ) -> Result<RawTiming, PerfReporterError> {
        let started = match self.pending.remove(token) {
            Some(started) => started,
            None => {
                return Err(PerfReporterError::UnmatchedCompletion {
                    token: token.to_string(),
                    detail: format!(
                        "request `{}` (iteration {}) completed without a matching start",
                        name, iteration
                    ),
                });
            }
        };

        let elapsed = at.signed_duration_since(started).num_milliseconds();
        // The wall clock can step backwards between the two notifications.
        let elapsed_ms = if elapsed < 0 {
            warn!(
                "clock went backwards while timing {} ({}ms), recording 0ms",
                name, elapsed
            );
            0
        } else {
            elapsed as u64
        };

        Ok(RawTiming::new(iteration, name, elapsed_ms, status))
    }

    /// How many starts are still waiting for a completion.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether `token` currently has a pending start.
    pub fn is_pending(&self, token: &CorrelationToken) -> bool {
        self.pending.contains_key(token)
    }
}
