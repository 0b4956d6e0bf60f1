//! Mock sandbox API client for testing
//!
//! Provides a scripted implementation of [`SandboxApi`] that records every
//! call, so tests can assert on exactly what would have hit the wire.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::SandboxApi;
use super::models::Artifact;
use crate::error::{ScanError, ScanResult};
use crate::scan::ReportStatus;

/// A call made against the mock, in order of arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Submit(String),
    Report(String),
    Screenshot(String),
}

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = Arc::new(
///     MockSandboxClient::new()
///         .with_report_id("r1")
///         .with_report_script(vec![ReportStatus::Pending, ReportStatus::Ready(report)]),
/// );
/// ```
pub struct MockSandboxClient {
    /// Result of every `submit_scan`
    submit: Mutex<ScanResult<String>>,
    /// Per-poll report statuses, consumed front to back; `Pending` once empty
    report_script: Mutex<VecDeque<ReportStatus>>,
    /// Result of every `fetch_screenshot`; the data is wrapped per report id
    screenshot: Mutex<ScanResult<Option<String>>>,
    /// Cancel this token once the given number of report polls has been served
    cancel_after: Option<(usize, CancellationToken)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for MockSandboxClient {
    fn default() -> Self {
        Self {
            submit: Mutex::new(Ok("report-1".to_string())),
            report_script: Mutex::new(VecDeque::new()),
            screenshot: Mutex::new(Ok(None)),
            cancel_after: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockSandboxClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report_id(mut self, report_id: &str) -> Self {
        *self.submit.get_mut() = Ok(report_id.to_string());
        self
    }

    pub fn with_submit_error(mut self, err: ScanError) -> Self {
        *self.submit.get_mut() = Err(err);
        self
    }

    pub fn with_report_script(mut self, script: Vec<ReportStatus>) -> Self {
        *self.report_script.get_mut() = script.into();
        self
    }

    pub fn with_screenshot(mut self, data: &str) -> Self {
        *self.screenshot.get_mut() = Ok(Some(data.to_string()));
        self
    }

    pub fn with_screenshot_error(mut self, err: ScanError) -> Self {
        *self.screenshot.get_mut() = Err(err);
        self
    }

    /// Cancel `token` as soon as `polls` report polls have been answered.
    pub fn cancel_after_polls(mut self, polls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((polls, token));
        self
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn submissions(&self) -> usize {
        self.count(|c| matches!(c, RecordedCall::Submit(_))).await
    }

    pub async fn report_polls(&self) -> usize {
        self.count(|c| matches!(c, RecordedCall::Report(_))).await
    }

    pub async fn screenshot_fetches(&self) -> usize {
        self.count(|c| matches!(c, RecordedCall::Screenshot(_))).await
    }

    async fn count(&self, pred: impl Fn(&RecordedCall) -> bool) -> usize {
        self.calls.lock().await.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl SandboxApi for MockSandboxClient {
    async fn submit_scan(&self, target: &str) -> ScanResult<String> {
        self.calls
            .lock()
            .await
            .push(RecordedCall::Submit(target.to_string()));
        self.submit.lock().await.clone()
    }

    async fn fetch_report(&self, report_id: &str) -> ReportStatus {
        let polls = {
            let mut calls = self.calls.lock().await;
            calls.push(RecordedCall::Report(report_id.to_string()));
            calls
                .iter()
                .filter(|c| matches!(c, RecordedCall::Report(_)))
                .count()
        };

        let status = self
            .report_script
            .lock()
            .await
            .pop_front()
            .unwrap_or(ReportStatus::Pending);

        if let Some((after, ref token)) = self.cancel_after {
            if polls >= after {
                token.cancel();
            }
        }

        status
    }

    async fn fetch_screenshot(&self, report_id: &str) -> ScanResult<Option<Artifact>> {
        self.calls
            .lock()
            .await
            .push(RecordedCall::Screenshot(report_id.to_string()));

        let scripted = self.screenshot.lock().await.clone();
        scripted.map(|data| {
            data.map(|data| Artifact {
                report_id: report_id.to_string(),
                data,
            })
        })
    }
}
