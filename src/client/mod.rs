//! Sandbox API client
//!
//! [`SandboxApi`] is the transport seam used by the scan core. [`SandboxClient`]
//! implements it over HTTP; tests substitute `MockSandboxClient`.

use async_trait::async_trait;

use crate::error::ScanResult;
use crate::scan::ReportStatus;

#[cfg(test)]
pub mod mock;
pub mod models;
pub mod sandbox;

#[cfg(test)]
pub use mock::{MockSandboxClient, RecordedCall};
pub use models::{Artifact, Report};
pub use sandbox::SandboxClient;

/// Sandbox API operations used by the scan core.
///
/// Each method issues exactly one request and never retries.
#[async_trait]
pub trait SandboxApi: Send + Sync {
    /// Submit `target` for scanning and return the report id.
    ///
    /// The target is sent exactly as given.
    async fn submit_scan(&self, target: &str) -> ScanResult<String>;

    /// Fetch the report for `report_id`.
    ///
    /// 200 maps to [`ReportStatus::Ready`], 404 to [`ReportStatus::Pending`],
    /// everything else to [`ReportStatus::Failed`].
    async fn fetch_report(&self, report_id: &str) -> ReportStatus;

    /// Fetch the screenshot for `report_id`, `None` when the API has none.
    async fn fetch_screenshot(&self, report_id: &str) -> ScanResult<Option<Artifact>>;
}
