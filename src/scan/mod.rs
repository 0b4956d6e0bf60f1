//! Scan submission and report polling
//!
//! A scan run is strictly sequential:
//!
//! 1. [`SubmissionClient`] posts the target and receives a report id
//! 2. [`ReportPoller`] polls for the report under a bounded [`PollPolicy`]
//! 3. [`ArtifactFetcher`] fetches the screenshot, best-effort
//!
//! [`ScanOrchestrator`] composes the three into one cancellable operation.
//! Runs share no mutable state, so any number of them may be in flight at once.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::client::{Artifact, Report};
use crate::error::{ScanError, ScanResult};

mod artifact;
mod orchestrator;
mod poller;
mod submission;

pub use artifact::ArtifactFetcher;
pub use orchestrator::ScanOrchestrator;
pub use poller::{PollState, ReportPoller};
pub use submission::SubmissionClient;

/// Delay between report polls.
///
/// Tuned against the hosted sandbox's typical scan duration.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Report polls issued before giving up (about one minute at the default interval)
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 62;

/// Bounded, fixed-interval policy for waiting on a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl PollPolicy {
    /// Create a policy. `max_attempts` is clamped to at least 1.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on time spent sleeping between polls
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_POLL_ATTEMPTS)
    }
}

/// A request to scan one URL or bare domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    target: String,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Target exactly as the caller supplied it
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Reject requests that must never reach the wire.
    ///
    /// Only the empty string is rejected; whitespace and URL well-formedness
    /// are left to the server.
    pub fn validate(&self) -> ScanResult<()> {
        if self.target.is_empty() {
            return Err(ScanError::Validation(
                "target must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Correlation key returned by a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub report_id: String,
}

/// Outcome of a single report poll
#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    /// Not available yet (HTTP 404)
    Pending,
    /// Report is available
    Ready(Report),
    /// Terminal failure for this poll
    Failed(ScanError),
}

/// Combined result of a successful run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub report_id: String,
    pub report: Report,
    /// Screenshot, `None` when absent or when fetching it failed
    pub artifact: Option<Artifact>,
}

/// State transitions published while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// The scan was accepted and assigned a report id
    Submitted { report_id: String },
    /// About to issue poll number `attempt` (1-based)
    Polling { attempt: u32, max_attempts: u32 },
    /// The report became available after `attempts` polls
    ReportReady { attempts: u32 },
    /// Fetching the screenshot
    FetchingScreenshot,
    /// The run completed successfully
    Finished,
}

/// Channel a presentation layer subscribes to for [`ScanEvent`]s
pub type EventSender = mpsc::UnboundedSender<ScanEvent>;

/// Send an event if anyone is listening.
///
/// A dropped receiver is not an error; the run simply continues unobserved.
pub(crate) fn emit(events: Option<&EventSender>, event: ScanEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval(), Duration::from_millis(1000));
        assert_eq!(policy.max_attempts(), 62);
        assert_eq!(policy.budget(), Duration::from_secs(62));
    }

    #[test]
    fn test_policy_clamps_zero_attempts() {
        let policy = PollPolicy::new(Duration::from_millis(10), 0);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_request_validation() {
        assert!(ScanRequest::new("example.com").validate().is_ok());
        assert!(matches!(
            ScanRequest::new("").validate(),
            Err(ScanError::Validation(_))
        ));
        assert!(ScanRequest::new("   ").validate().is_ok());
    }

    #[test]
    fn test_request_keeps_target_verbatim() {
        let request = ScanRequest::new(" HTTP://Example.com/path ");
        assert_eq!(request.target(), " HTTP://Example.com/path ");
    }

    #[test]
    fn test_emit_without_listener() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        emit(Some(&tx), ScanEvent::Finished);
        emit(None, ScanEvent::Finished);
    }
}
