//! Sandbox API client implementation

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, Response, StatusCode};

use super::SandboxApi;
use super::models::{
    Artifact, ErrorBody, Report, ReportEnvelope, ScreenshotEnvelope, SubmitRequest, SubmitResponse,
};
use crate::error::{ScanError, ScanResult};
use crate::scan::ReportStatus;

/// Header carrying the caller's API key
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the sandbox API.
///
/// Cheap to share behind an `Arc`; the underlying connection pool is safe for
/// concurrent runs.
pub struct SandboxClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for SandboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SandboxClient {
    /// Create a client for `base_url`, applying `timeout` to every request.
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> ScanResult<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("sandop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a `ServerError`.
    ///
    /// Prefers the body's `error` field, then the raw body, then the status text.
    async fn error_from_response(response: Response) -> ScanError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected status")
                    .to_string()
            });

        ScanError::ServerError {
            status: status.as_u16(),
            message,
        }
    }

    async fn get_report(&self, report_id: &str) -> ScanResult<Option<Report>> {
        let response = self
            .http
            .get(self.url(&format!("/report/{}", report_id)))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let envelope = response.json::<ReportEnvelope>().await.map_err(|e| {
                    ScanError::InvalidResponse(format!("Failed to parse report: {}", e))
                })?;
                envelope
                    .report
                    .map(Some)
                    .ok_or_else(|| ScanError::InvalidResponse("Missing field 'report'".to_string()))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::error_from_response(response).await),
        }
    }
}

#[async_trait]
impl SandboxApi for SandboxClient {
    async fn submit_scan(&self, target: &str) -> ScanResult<String> {
        debug!("POST /scan for {}", target);

        let response = self
            .http
            .post(self.url("/scan"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&SubmitRequest {
                submission_url: target,
            })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await?;
        let parsed: SubmitResponse = serde_json::from_str(&body).map_err(|e| {
            ScanError::InvalidResponse(format!(
                "Failed to parse submission response: {}. Body was: {}",
                e, body
            ))
        })?;

        parsed
            .into_report_id()
            .ok_or_else(|| ScanError::InvalidResponse("Missing field 'report_id'".to_string()))
    }

    async fn fetch_report(&self, report_id: &str) -> ReportStatus {
        match self.get_report(report_id).await {
            Ok(Some(report)) => ReportStatus::Ready(report),
            Ok(None) => ReportStatus::Pending,
            Err(e) => ReportStatus::Failed(e),
        }
    }

    async fn fetch_screenshot(&self, report_id: &str) -> ScanResult<Option<Artifact>> {
        let response = self
            .http
            .get(self.url(&format!("/screenshot/{}", report_id)))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let envelope = response.json::<ScreenshotEnvelope>().await.map_err(|e| {
            ScanError::InvalidResponse(format!("Failed to parse screenshot: {}", e))
        })?;

        Ok(envelope.into_data().map(|data| Artifact {
            report_id: report_id.to_string(),
            data,
        }))
    }
}
