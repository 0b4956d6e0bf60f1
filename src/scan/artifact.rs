//! Best-effort screenshot retrieval

use std::sync::Arc;

use log::debug;

use crate::client::{Artifact, SandboxApi};

/// Fetches auxiliary artifacts for a finished report.
///
/// Never fails: a missing screenshot and a failed request both come back as
/// `None`. The two cases are not distinguished.
pub struct ArtifactFetcher<A: ?Sized> {
    api: Arc<A>,
}

impl<A: SandboxApi + ?Sized> ArtifactFetcher<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn fetch_screenshot(&self, report_id: &str) -> Option<Artifact> {
        match self.api.fetch_screenshot(report_id).await {
            Ok(Some(artifact)) => Some(artifact),
            Ok(None) => {
                debug!("No screenshot available for {}", report_id);
                None
            }
            Err(e) => {
                debug!("Ignoring screenshot failure for {}: {}", report_id, e);
                None
            }
        }
    }
}
