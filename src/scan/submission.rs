//! Scan submission

use std::sync::Arc;

use log::debug;

use super::{ScanRequest, SubmissionResult};
use crate::client::SandboxApi;
use crate::error::ScanResult;

/// Submits scan requests. One network call per submission, no retries.
pub struct SubmissionClient<A: ?Sized> {
    api: Arc<A>,
}

impl<A: SandboxApi + ?Sized> SubmissionClient<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Submit `request` and return the report id the server assigned.
    pub async fn submit(&self, request: &ScanRequest) -> ScanResult<SubmissionResult> {
        request.validate()?;

        let report_id = self.api.submit_scan(request.target()).await?;
        debug!("Submitted {} as report {}", request.target(), report_id);

        Ok(SubmissionResult { report_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockSandboxClient, RecordedCall};
    use crate::error::ScanError;

    #[tokio::test]
    async fn test_submit_returns_report_id() {
        let mock = Arc::new(MockSandboxClient::new().with_report_id("r1"));
        let client = SubmissionClient::new(mock.clone());

        let result = client.submit(&ScanRequest::new("example.com")).await.unwrap();

        assert_eq!(result.report_id, "r1");
        assert_eq!(
            mock.calls().await,
            vec![RecordedCall::Submit("example.com".to_string())]
        );
    }

    #[tokio::test]
    async fn test_submit_empty_target_never_hits_api() {
        let mock = Arc::new(MockSandboxClient::new());
        let client = SubmissionClient::new(mock.clone());

        let err = client.submit(&ScanRequest::new("")).await.unwrap_err();

        assert!(matches!(err, ScanError::Validation(_)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_error_is_not_retried() {
        let mock = Arc::new(MockSandboxClient::new().with_submit_error(ScanError::ServerError {
            status: 500,
            message: "boom".to_string(),
        }));
        let client = SubmissionClient::new(mock.clone());

        let err = client.submit(&ScanRequest::new("bad")).await.unwrap_err();

        assert!(matches!(err, ScanError::ServerError { status: 500, .. }));
        assert_eq!(mock.calls().await.len(), 1);
    }
}
