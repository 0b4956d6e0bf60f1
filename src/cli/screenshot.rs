//! Screenshot download command

use std::path::{Path, PathBuf};

use colored::Colorize;
use log::debug;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::{Artifact, SandboxApi};
use crate::error::{Error, Result};
use crate::output::{self, Formattable};

/// Where a screenshot ended up
#[derive(Debug, Tabled, Serialize)]
struct SavedScreenshot {
    #[tabled(rename = "REPORT ID")]
    report_id: String,
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "BYTES")]
    bytes: usize,
}

impl Formattable for SavedScreenshot {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(format!(
                "{} Screenshot for {} saved to {} ({} bytes)",
                "✓".green(),
                self.report_id.bold(),
                self.path.cyan(),
                self.bytes
            )),
            OutputFormat::Json => Ok(output::json::format_json(self)?),
            OutputFormat::Table => Ok(output::table::format_table(std::slice::from_ref(self))),
        }
    }
}

/// Download, decode and save the screenshot for `report_id`.
///
/// Unlike a scan run, a failed fetch here is reported to the user.
pub async fn get(opts: &GlobalOptions, report_id: &str, out: Option<PathBuf>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let artifact = ctx
        .client
        .fetch_screenshot(report_id)
        .await?
        .ok_or_else(|| Error::Other(format!("No screenshot available for report {}", report_id)))?;

    let path = out.unwrap_or_else(|| PathBuf::from(artifact.file_name()));
    let bytes = write_artifact(&artifact, &path)?;

    output::print(
        &SavedScreenshot {
            report_id: report_id.to_string(),
            path: path.display().to_string(),
            bytes,
        },
        ctx.format,
    )
}

/// Decode an artifact and write the image bytes to `path`.
///
/// Returns the number of bytes written.
pub fn write_artifact(artifact: &Artifact, path: &Path) -> Result<usize> {
    let bytes = artifact.decode()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len())
}
