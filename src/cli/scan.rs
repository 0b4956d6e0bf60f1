//! Scan submission command

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use indicatif::MultiProgress;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::cli::args::GlobalOptions;
use crate::cli::context::cancel_on_ctrl_c;
use crate::cli::progress::{SUBMITTING_MESSAGE, ScanProgress};
use crate::cli::CommandContext;
use crate::cli::screenshot::write_artifact;
use crate::client::{Artifact, SandboxApi};
use crate::error::{Error, Result};
use crate::models::{ScanRun, ScanRunReport};
use crate::output;
use crate::scan::{ScanOrchestrator, ScanRequest};

/// Options for `scan submit` beyond the target list
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub concurrency: usize,
    pub screenshot_dir: Option<PathBuf>,
    pub no_screenshot: bool,
}

/// Scan every target, print the runs in input order, and fail if any run failed.
pub async fn submit(opts: &GlobalOptions, targets: Vec<String>, submit: SubmitOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let mut orchestrator = ScanOrchestrator::new(ctx.client.clone(), ctx.poll_policy());
    if submit.no_screenshot {
        orchestrator = orchestrator.without_screenshot();
    }
    if let Some(dir) = &submit.screenshot_dir {
        std::fs::create_dir_all(dir)?;
    }

    let cancel = cancel_on_ctrl_c();
    let multi = ctx.show_progress().then(MultiProgress::new);

    debug!(
        "Scanning {} target(s), {} at a time",
        targets.len(),
        submit.concurrency
    );
    let runs = run_all(
        &orchestrator,
        targets,
        submit.concurrency,
        &cancel,
        multi.as_ref(),
        submit.screenshot_dir.as_deref(),
    )
    .await;

    output::print(&ScanRunReport(&runs), ctx.format)?;

    failure_summary(runs)
}

/// Run every target with at most `concurrency` in flight.
///
/// Results come back in input order regardless of completion order.
pub async fn run_all<A: SandboxApi + ?Sized>(
    orchestrator: &ScanOrchestrator<A>,
    targets: Vec<String>,
    concurrency: usize,
    cancel: &CancellationToken,
    multi: Option<&MultiProgress>,
    screenshot_dir: Option<&Path>,
) -> Vec<ScanRun> {
    stream::iter(targets)
        .map(|target| run_target(orchestrator, target, cancel, multi, screenshot_dir))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

async fn run_target<A: SandboxApi + ?Sized>(
    orchestrator: &ScanOrchestrator<A>,
    target: String,
    cancel: &CancellationToken,
    multi: Option<&MultiProgress>,
    screenshot_dir: Option<&Path>,
) -> ScanRun {
    let (progress, events) = ScanProgress::start(multi, &target, SUBMITTING_MESSAGE);
    let request = ScanRequest::new(target.clone());
    let result = orchestrator
        .run_with(&request, &cancel.child_token(), Some(&events))
        .await;
    progress.finish(events).await;

    let screenshot_path = match (&result, screenshot_dir) {
        (Ok(outcome), Some(dir)) => outcome
            .artifact
            .as_ref()
            .and_then(|artifact| save_screenshot(artifact, dir)),
        _ => None,
    };

    ScanRun {
        target,
        result,
        screenshot_path,
    }
}

/// A screenshot that fails to decode or write does not fail the run.
fn save_screenshot(artifact: &Artifact, dir: &Path) -> Option<PathBuf> {
    let path = dir.join(artifact.file_name());
    match write_artifact(artifact, &path) {
        Ok(_) => Some(path),
        Err(e) => {
            warn!("Could not save screenshot for {}: {}", artifact.report_id, e);
            None
        }
    }
}

/// Exit status for a batch: a lone failure keeps its own error.
fn failure_summary(mut runs: Vec<ScanRun>) -> Result<()> {
    let total = runs.len();
    let failed = runs.iter().filter(|run| !run.is_ok()).count();

    if failed == 0 {
        return Ok(());
    }
    if total == 1 {
        if let Some(Err(err)) = runs.pop().map(|run| run.result) {
            return Err(err.into());
        }
    }
    Err(Error::Other(format!("{} of {} scans failed", failed, total)))
}
