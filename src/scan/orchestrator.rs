//! End-to-end scan runs

use std::sync::Arc;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use super::{
    ArtifactFetcher, EventSender, PollPolicy, ReportPoller, ScanEvent, ScanOutcome, ScanRequest,
    SubmissionClient, emit,
};
use crate::client::SandboxApi;
use crate::error::{ScanError, ScanResult};

/// Runs submit → poll → screenshot as one cancellable operation.
///
/// Re-running the same target always issues a new submission; concurrent
/// identical requests are not deduplicated.
pub struct ScanOrchestrator<A: ?Sized> {
    submission: SubmissionClient<A>,
    poller: ReportPoller<A>,
    artifacts: ArtifactFetcher<A>,
    fetch_screenshot: bool,
}

impl<A: SandboxApi + ?Sized> ScanOrchestrator<A> {
    pub fn new(api: Arc<A>, policy: PollPolicy) -> Self {
        Self {
            submission: SubmissionClient::new(api.clone()),
            poller: ReportPoller::new(api.clone(), policy),
            artifacts: ArtifactFetcher::new(api),
            fetch_screenshot: true,
        }
    }

    /// Skip the screenshot step entirely
    pub fn without_screenshot(mut self) -> Self {
        self.fetch_screenshot = false;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        self.poller.policy()
    }

    pub async fn run(&self, request: &ScanRequest) -> ScanResult<ScanOutcome> {
        self.run_with(request, &CancellationToken::new(), None)
            .await
    }

    /// Run one scan, honouring `cancel` and publishing progress on `events`.
    ///
    /// Cancellation only stops the local wait; the server keeps scanning.
    pub async fn run_with(
        &self,
        request: &ScanRequest,
        cancel: &CancellationToken,
        events: Option<&EventSender>,
    ) -> ScanResult<ScanOutcome> {
        request.validate()?;

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScanError::Cancelled),
            result = self.submission.submit(request) => result?,
        };
        let report_id = submitted.report_id;
        info!("Scan for {} submitted as {}", request.target(), report_id);
        emit(
            events,
            ScanEvent::Submitted {
                report_id: report_id.clone(),
            },
        );

        let report = self
            .poller
            .wait_for_ready_with(&report_id, cancel, events)
            .await?;

        let artifact = if self.fetch_screenshot {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            emit(events, ScanEvent::FetchingScreenshot);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                artifact = self.artifacts.fetch_screenshot(&report_id) => artifact,
            }
        } else {
            debug!("Skipping screenshot for {}", report_id);
            None
        };

        emit(events, ScanEvent::Finished);

        Ok(ScanOutcome {
            report_id,
            report,
            artifact,
        })
    }
}
