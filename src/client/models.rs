//! Sandbox API data models
//!
//! The report itself stays an opaque JSON document. Only the request and
//! response envelopes around it are typed.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured result of a completed scan.
///
/// Opaque to the scan core; display code reads well-known fields best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(pub Value);

impl Report {
    /// Borrow the raw JSON document
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// String field at the top level of the report, if present
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Length of an array field (or entry count of an object field)
    pub fn count(&self, key: &str) -> usize {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(map)) => map.len(),
            _ => 0,
        }
    }
}

/// Screenshot captured by the sandbox for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    /// Report the screenshot belongs to
    pub report_id: String,

    /// Base64 payload exactly as returned by the API (JPEG)
    pub data: String,
}

impl Artifact {
    /// Decode the base64 payload into image bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(self.data.trim())
    }

    /// Suggested file name for the decoded image.
    ///
    /// The id comes from the server, so anything outside `[A-Za-z0-9_-]` is
    /// replaced with `_`. The result never contains a separator or `..`.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .report_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() {
            "screenshot.jpg".to_string()
        } else {
            format!("{}.jpg", stem)
        }
    }
}

/// Body of `POST /scan`
#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub submission_url: &'a str,
}

/// Body of a successful `POST /scan`.
///
/// The hosted API answers `{"report_id": ..}`; the self-hosted sandbox nests
/// it as `{"scan_status": .., "data": {"report_id": ..}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    #[serde(default)]
    pub report_id: Option<String>,

    #[serde(default)]
    pub data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitData {
    #[serde(default)]
    pub report_id: Option<String>,
}

impl SubmitResponse {
    /// Report id from whichever shape the server used
    pub fn into_report_id(self) -> Option<String> {
        self.report_id
            .or_else(|| self.data.and_then(|d| d.report_id))
            .filter(|id| !id.is_empty())
    }
}

/// Body of `GET /report/{id}`
#[derive(Debug, Deserialize)]
pub(crate) struct ReportEnvelope {
    pub report: Option<Report>,
}

/// Body of `GET /screenshot/{id}`
#[derive(Debug, Deserialize)]
pub(crate) struct ScreenshotEnvelope {
    #[serde(default)]
    pub screenshot: Option<ScreenshotDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScreenshotDocument {
    #[serde(default)]
    pub screenshot: Option<String>,
}

impl ScreenshotEnvelope {
    /// Base64 payload, treating empty strings as absent
    pub fn into_data(self) -> Option<String> {
        self.screenshot
            .and_then(|doc| doc.screenshot)
            .filter(|data| !data.is_empty())
    }
}

/// Error body the API sends alongside non-success statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
