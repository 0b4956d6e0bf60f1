//! Bounded report polling
//!
//! The poller is an explicit state machine:
//!
//! ```text
//! Polling(0) --404--> Polling(1) --404--> ... --404--> Exhausted
//!     |                   |
//!     +--200--> Ready     +--other--> Aborted
//! ```
//!
//! `Polling(n)` means `n` polls have been issued so far. No more than
//! `max_attempts` polls are ever issued, and nothing sleeps after the last one.

use std::sync::Arc;

use log::debug;
use tokio_util::sync::CancellationToken;

use super::{EventSender, PollPolicy, ReportStatus, ScanEvent, emit};
use crate::client::{Report, SandboxApi};
use crate::error::{ScanError, ScanResult};

/// Where a poll loop currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Waiting on the report; `attempt` polls issued so far
    Polling { attempt: u32 },
    /// The report is available
    Ready(Report),
    /// Every poll in the budget came back 404
    Exhausted { attempts: u32 },
    /// A poll failed with something other than 404
    Aborted(ScanError),
}

impl PollState {
    pub fn start() -> Self {
        PollState::Polling { attempt: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }

    /// Apply the result of one poll. Terminal states never change.
    pub fn advance(self, status: ReportStatus, policy: &PollPolicy) -> PollState {
        let attempt = match self {
            PollState::Polling { attempt } => attempt,
            terminal => return terminal,
        };
        let issued = attempt + 1;

        match status {
            ReportStatus::Ready(report) => PollState::Ready(report),
            ReportStatus::Pending if issued < policy.max_attempts() => {
                PollState::Polling { attempt: issued }
            }
            ReportStatus::Pending => PollState::Exhausted { attempts: issued },
            ReportStatus::Failed(err) => PollState::Aborted(err),
        }
    }
}

/// Waits for a report to become available.
pub struct ReportPoller<A: ?Sized> {
    api: Arc<A>,
    policy: PollPolicy,
}

impl<A: SandboxApi + ?Sized> ReportPoller<A> {
    pub fn new(api: Arc<A>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll until the report is ready or the budget runs out.
    pub async fn wait_for_ready(&self, report_id: &str) -> ScanResult<Report> {
        self.wait_for_ready_with(report_id, &CancellationToken::new(), None)
            .await
    }

    /// Like [`wait_for_ready`](Self::wait_for_ready), observing `cancel` at
    /// every suspension point and publishing progress on `events`.
    pub async fn wait_for_ready_with(
        &self,
        report_id: &str,
        cancel: &CancellationToken,
        events: Option<&EventSender>,
    ) -> ScanResult<Report> {
        let max_attempts = self.policy.max_attempts();
        let mut state = PollState::start();

        loop {
            let attempt = match state {
                PollState::Polling { attempt } => attempt,
                PollState::Ready(report) => return Ok(report),
                PollState::Exhausted { attempts } => {
                    debug!("Gave up on report {} after {} attempts", report_id, attempts);
                    return Err(ScanError::NotFoundTimeout { attempts });
                }
                PollState::Aborted(err) => {
                    debug!("Polling for {} aborted: {}", report_id, err);
                    return Err(err);
                }
            };

            if attempt > 0 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.policy.interval()) => {}
                }
            }
            if cancel.is_cancelled() {
                debug!("Polling for {} cancelled after {} attempts", report_id, attempt);
                return Err(ScanError::Cancelled);
            }

            emit(
                events,
                ScanEvent::Polling {
                    attempt: attempt + 1,
                    max_attempts,
                },
            );

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                status = self.api.fetch_report(report_id) => status,
            };

            match status {
                ReportStatus::Pending => debug!(
                    "Report {} not ready (attempt {}/{})",
                    report_id,
                    attempt + 1,
                    max_attempts
                ),
                ReportStatus::Ready(_) => emit(
                    events,
                    ScanEvent::ReportReady {
                        attempts: attempt + 1,
                    },
                ),
                ReportStatus::Failed(_) => {}
            }

            state = PollState::Polling { attempt }.advance(status, &self.policy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::client::MockSandboxClient;

    fn report(id: &str) -> Report {
        Report(json!({"report_id": id}))
    }

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(1), max_attempts)
    }

    #[test]
    fn test_advance_transitions() {
        let policy = fast_policy(3);

        let state = PollState::start().advance(ReportStatus::Pending, &policy);
        assert_eq!(state, PollState::Polling { attempt: 1 });

        let state = state.advance(ReportStatus::Pending, &policy);
        assert_eq!(state, PollState::Polling { attempt: 2 });

        let state = state.advance(ReportStatus::Pending, &policy);
        assert_eq!(state, PollState::Exhausted { attempts: 3 });
        assert!(state.is_terminal());
    }

    #[test]
    fn test_advance_ready_and_aborted() {
        let policy = fast_policy(3);

        let ready = PollState::start().advance(ReportStatus::Ready(report("r1")), &policy);
        assert_eq!(ready, PollState::Ready(report("r1")));

        let aborted =
            PollState::start().advance(ReportStatus::Failed(ScanError::Cancelled), &policy);
        assert_eq!(aborted, PollState::Aborted(ScanError::Cancelled));
    }

    #[test]
    fn test_advance_terminal_is_sticky() {
        let policy = fast_policy(3);
        let state = PollState::Exhausted { attempts: 3 };

        assert_eq!(
            state.clone().advance(ReportStatus::Ready(report("r1")), &policy),
            state
        );
    }

    #[test]
    fn test_single_attempt_budget() {
        let policy = fast_policy(1);
        let state = PollState::start().advance(ReportStatus::Pending, &policy);
        assert_eq!(state, PollState::Exhausted { attempts: 1 });
    }

    #[tokio::test]
    async fn test_ready_on_first_poll() {
        let mock = Arc::new(MockSandboxClient::new().with_report_script(vec![
            ReportStatus::Ready(report("r1")),
        ]));
        let poller = ReportPoller::new(mock.clone(), fast_policy(62));

        let result = poller.wait_for_ready("r1").await.unwrap();

        assert_eq!(result, report("r1"));
        assert_eq!(mock.report_polls().await, 1);
    }

    #[tokio::test]
    async fn test_stops_at_first_ready() {
        let mock = Arc::new(MockSandboxClient::new().with_report_script(vec![
            ReportStatus::Pending,
            ReportStatus::Pending,
            ReportStatus::Ready(report("r1")),
            ReportStatus::Pending,
        ]));
        let poller = ReportPoller::new(mock.clone(), fast_policy(62));

        poller.wait_for_ready("r1").await.unwrap();

        assert_eq!(mock.report_polls().await, 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let mock = Arc::new(MockSandboxClient::new());
        let poller = ReportPoller::new(mock.clone(), fast_policy(5));

        let err = poller.wait_for_ready("r2").await.unwrap_err();

        assert_eq!(err, ScanError::NotFoundTimeout { attempts: 5 });
        assert_eq!(mock.report_polls().await, 5);
    }

    #[tokio::test]
    async fn test_default_budget_is_62_polls() {
        let mock = Arc::new(MockSandboxClient::new());
        let poller = ReportPoller::new(
            mock.clone(),
            PollPolicy::new(Duration::ZERO, crate::scan::DEFAULT_MAX_POLL_ATTEMPTS),
        );

        let err = poller.wait_for_ready("r2").await.unwrap_err();

        assert_eq!(err, ScanError::NotFoundTimeout { attempts: 62 });
        assert_eq!(mock.report_polls().await, 62);
    }

    #[tokio::test]
    async fn test_aborts_on_other_failure() {
        let failure = ScanError::ServerError {
            status: 500,
            message: "opensearch down".to_string(),
        };
        let mock = Arc::new(MockSandboxClient::new().with_report_script(vec![
            ReportStatus::Pending,
            ReportStatus::Failed(failure.clone()),
            ReportStatus::Ready(report("r1")),
        ]));
        let poller = ReportPoller::new(mock.clone(), fast_policy(62));

        let err = poller.wait_for_ready("r1").await.unwrap_err();

        assert_eq!(err, failure);
        assert_eq!(mock.report_polls().await, 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let mock = Arc::new(MockSandboxClient::new().with_report_script(vec![
            ReportStatus::Failed(ScanError::Transport("reset".to_string())),
        ]));
        let poller = ReportPoller::new(mock.clone(), fast_policy(62));

        let err = poller.wait_for_ready("r1").await.unwrap_err();

        assert_eq!(err, ScanError::Transport("reset".to_string()));
        assert_eq!(mock.report_polls().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_attempts_prevents_next_poll() {
        let cancel = CancellationToken::new();
        let mock = Arc::new(MockSandboxClient::new().cancel_after_polls(2, cancel.clone()));
        let poller = ReportPoller::new(mock.clone(), PollPolicy::new(Duration::from_secs(3600), 62));

        let err = poller
            .wait_for_ready_with("r1", &cancel, None)
            .await
            .unwrap_err();

        assert_eq!(err, ScanError::Cancelled);
        assert_eq!(mock.report_polls().await, 2);
    }

    #[tokio::test]
    async fn test_already_cancelled_issues_no_poll() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mock = Arc::new(MockSandboxClient::new());
        let poller = ReportPoller::new(mock.clone(), fast_policy(62));

        let err = poller
            .wait_for_ready_with("r1", &cancel, None)
            .await
            .unwrap_err();

        assert_eq!(err, ScanError::Cancelled);
        assert_eq!(mock.report_polls().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_between_polls_but_not_after_last() {
        let mock = Arc::new(MockSandboxClient::new());
        let poller = ReportPoller::new(mock.clone(), PollPolicy::new(Duration::from_secs(1), 4));

        let started = tokio::time::Instant::now();
        let err = poller.wait_for_ready("r1").await.unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err, ScanError::NotFoundTimeout { attempts: 4 });
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_publishes_poll_events() {
        let mock = Arc::new(MockSandboxClient::new().with_report_script(vec![
            ReportStatus::Pending,
            ReportStatus::Ready(report("r1")),
        ]));
        let poller = ReportPoller::new(mock, fast_policy(3));
        let (tx, mut rx) = mpsc::unbounded_channel();

        poller
            .wait_for_ready_with("r1", &CancellationToken::new(), Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                ScanEvent::Polling {
                    attempt: 1,
                    max_attempts: 3
                },
                ScanEvent::Polling {
                    attempt: 2,
                    max_attempts: 3
                },
                ScanEvent::ReportReady { attempts: 2 },
            ]
        );
    }
}
