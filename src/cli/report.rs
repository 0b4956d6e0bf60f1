//! Report fetch commands

use indicatif::MultiProgress;

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::cli::context::cancel_on_ctrl_c;
use crate::cli::progress::{ScanProgress, WAITING_MESSAGE};
use crate::client::SandboxApi;
use crate::error::{Error, Result};
use crate::models::ReportView;
use crate::output;
use crate::scan::{ReportPoller, ReportStatus};

/// Fetch a report once. A 404 is reported as "not found" without retrying.
pub async fn get(opts: &GlobalOptions, report_id: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    match ctx.client.fetch_report(report_id).await {
        ReportStatus::Ready(report) => output::print(&ReportView { report_id, report: &report }, ctx.format),
        ReportStatus::Pending => Err(Error::Other(format!(
            "Report {} not found. If the scan is still running, try `sandop report wait {}`.",
            report_id, report_id
        ))),
        ReportStatus::Failed(err) => Err(err.into()),
    }
}

/// Poll for a report using the profile's poll policy.
pub async fn wait(opts: &GlobalOptions, report_id: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let poller = ReportPoller::new(ctx.client.clone(), ctx.poll_policy());

    let cancel = cancel_on_ctrl_c();
    let multi = ctx.show_progress().then(MultiProgress::new);
    let (progress, events) = ScanProgress::start(multi.as_ref(), report_id, WAITING_MESSAGE);

    let result = poller
        .wait_for_ready_with(report_id, &cancel, Some(&events))
        .await;
    progress.finish(events).await;

    let report = result?;
    output::print(&ReportView { report_id, report: &report }, ctx.format)
}
