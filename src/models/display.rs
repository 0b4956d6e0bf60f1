//! Display model implementations for pretty, table and JSON output

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::client::Report;
use crate::error::{Result, ScanError, ScanResult};
use crate::output::formatters::{format_utc_local, or_placeholder, truncate};
use crate::output::{Formattable, json, table};
use crate::scan::ScanOutcome;

/// Longest title/URL shown in table cells
const MAX_CELL_WIDTH: usize = 48;

/// Headline numbers pulled from a report.
///
/// Every field is read best-effort; missing fields show as placeholders.
#[derive(Debug, Clone, PartialEq, Tabled, Serialize)]
pub struct ReportSummary {
    #[tabled(rename = "REPORT ID")]
    pub report_id: String,

    #[tabled(rename = "URL")]
    pub submission_url: String,

    #[tabled(skip)]
    pub resolved_url: Option<String>,

    #[tabled(rename = "TITLE")]
    pub page_title: String,

    #[tabled(rename = "STATUS")]
    pub scan_status: String,

    #[tabled(skip)]
    pub submitted: Option<String>,

    #[tabled(skip)]
    pub completed: Option<String>,

    #[tabled(skip)]
    pub scan_time: Option<String>,

    #[tabled(rename = "REQUESTS")]
    pub requests: usize,

    #[tabled(rename = "DOMAINS")]
    pub domains: usize,

    #[tabled(rename = "SERVERS")]
    pub servers: usize,

    #[tabled(rename = "CERTS")]
    pub certificates: usize,

    #[tabled(rename = "COOKIES")]
    pub cookies: usize,

    #[tabled(rename = "SCRIPTS")]
    pub scripts: usize,

    #[tabled(rename = "ERRORS")]
    pub errors: usize,
}

impl ReportSummary {
    pub fn from_report(report_id: &str, report: &Report) -> Self {
        let owned = |key: &str| report.str_field(key).map(str::to_string);

        Self {
            report_id: report
                .str_field("report_id")
                .unwrap_or(report_id)
                .to_string(),
            submission_url: or_placeholder(report.str_field("submission_url")),
            resolved_url: owned("resolved_url"),
            page_title: or_placeholder(report.str_field("page_title")),
            scan_status: or_placeholder(report.str_field("scan_status")),
            submitted: owned("submission_utc"),
            completed: owned("completion_utc"),
            scan_time: owned("scan_time"),
            requests: report.count("request"),
            domains: report.count("domain"),
            servers: report.count("server"),
            certificates: report.count("certificate"),
            cookies: report.count("cookie"),
            scripts: report.count("page_scripts"),
            errors: report.count("errors"),
        }
    }

    /// Copy with long cells shortened for table output
    fn for_table(&self) -> Self {
        let mut row = self.clone();
        row.submission_url = truncate(&row.submission_url, MAX_CELL_WIDTH);
        row.page_title = truncate(&row.page_title, MAX_CELL_WIDTH);
        row
    }

    /// Multi-line human-readable rendering
    pub fn format_pretty(&self) -> String {
        let mut lines = Vec::new();

        let url_line = match self.resolved_url.as_deref() {
            Some(resolved) if resolved != self.submission_url => format!(
                "URL: {} {} {}",
                self.submission_url,
                "→".dimmed(),
                resolved
            ),
            _ => format!("URL: {}", self.submission_url),
        };
        lines.push(url_line);
        lines.push(format!("Title: {}", self.page_title));
        lines.push(format!(
            "Status: {} | Submitted: {} | Completed: {} | Scan time: {}",
            format_scan_status(&self.scan_status),
            format_utc_local(self.submitted.as_deref()),
            format_utc_local(self.completed.as_deref()),
            or_placeholder(self.scan_time.as_deref()),
        ));
        lines.push(format!(
            "Requests: {} | Domains: {} | Servers: {} | Certificates: {} | Cookies: {} | Scripts: {}",
            self.requests,
            self.domains,
            self.servers,
            self.certificates,
            self.cookies,
            self.scripts
        ));
        if self.errors > 0 {
            lines.push(format!("{} {} scan error(s) recorded", "⚠".yellow(), self.errors));
        }

        lines.join("\n")
    }
}

fn format_scan_status(status: &str) -> String {
    match status {
        "success" => "success".green().to_string(),
        "failed" => "failed".red().to_string(),
        other => other.to_string(),
    }
}

/// A single fetched report
pub struct ReportView<'a> {
    pub report_id: &'a str,
    pub report: &'a Report,
}

impl Formattable for ReportView<'_> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        let summary = ReportSummary::from_report(self.report_id, self.report);
        match format {
            OutputFormat::Json => Ok(json::format_json(self.report)?),
            OutputFormat::Table => Ok(table::format_table(&[summary.for_table()])),
            OutputFormat::Pretty => Ok(format!(
                "{}\n{}",
                format!("Report {}", summary.report_id).bold(),
                summary.format_pretty()
            )),
        }
    }
}

/// Result of scanning one target
#[derive(Debug)]
pub struct ScanRun {
    pub target: String,
    pub result: ScanResult<ScanOutcome>,
    /// Where the decoded screenshot was written, if it was
    pub screenshot_path: Option<PathBuf>,
}

impl ScanRun {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    fn screenshot_label(&self) -> String {
        match (&self.result, &self.screenshot_path) {
            (_, Some(path)) => path.display().to_string(),
            (Ok(outcome), None) if outcome.artifact.is_some() => "available".to_string(),
            _ => "none".to_string(),
        }
    }
}

/// Table row for one scan run
#[derive(Debug, Tabled)]
struct ScanRunRow {
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "REPORT ID")]
    report_id: String,
    #[tabled(rename = "RESULT")]
    result: String,
    #[tabled(rename = "TITLE")]
    title: String,
    #[tabled(rename = "REQUESTS")]
    requests: String,
    #[tabled(rename = "DOMAINS")]
    domains: String,
    #[tabled(rename = "SCREENSHOT")]
    screenshot: String,
    #[tabled(rename = "ERROR")]
    error: String,
}

impl From<&ScanRun> for ScanRunRow {
    fn from(run: &ScanRun) -> Self {
        let screenshot = run.screenshot_label();
        match &run.result {
            Ok(outcome) => {
                let summary = ReportSummary::from_report(&outcome.report_id, &outcome.report);
                Self {
                    target: truncate(&run.target, MAX_CELL_WIDTH),
                    report_id: outcome.report_id.clone(),
                    result: "ok".to_string(),
                    title: truncate(&summary.page_title, MAX_CELL_WIDTH),
                    requests: summary.requests.to_string(),
                    domains: summary.domains.to_string(),
                    screenshot,
                    error: String::new(),
                }
            }
            Err(err) => Self {
                target: truncate(&run.target, MAX_CELL_WIDTH),
                report_id: "--".to_string(),
                result: err.kind().to_string(),
                title: "--".to_string(),
                requests: "--".to_string(),
                domains: "--".to_string(),
                screenshot,
                error: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ScanRunJson<'a> {
    target: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screenshot: Option<ScreenshotJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorJson>,
}

#[derive(Debug, Serialize)]
struct ScreenshotJson {
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorJson {
    kind: &'static str,
    message: String,
}

impl From<&ScanError> for ErrorJson {
    fn from(err: &ScanError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl<'a> From<&'a ScanRun> for ScanRunJson<'a> {
    fn from(run: &'a ScanRun) -> Self {
        match &run.result {
            Ok(outcome) => Self {
                target: &run.target,
                ok: true,
                report_id: Some(&outcome.report_id),
                report: Some(&outcome.report),
                screenshot: Some(ScreenshotJson {
                    available: outcome.artifact.is_some(),
                    path: run
                        .screenshot_path
                        .as_ref()
                        .map(|p| p.display().to_string()),
                }),
                error: None,
            },
            Err(err) => Self {
                target: &run.target,
                ok: false,
                report_id: None,
                report: None,
                screenshot: None,
                error: Some(err.into()),
            },
        }
    }
}

/// All runs of one `scan submit` invocation, in input order
pub struct ScanRunReport<'a>(pub &'a [ScanRun]);

impl ScanRunReport<'_> {
    fn format_pretty(&self) -> String {
        let blocks: Vec<String> = self
            .0
            .iter()
            .map(|run| match &run.result {
                Ok(outcome) => {
                    let summary = ReportSummary::from_report(&outcome.report_id, &outcome.report);
                    format!(
                        "{} {} {} {}\n{}\nScreenshot: {}",
                        "✓".green(),
                        run.target.bold(),
                        "→".dimmed(),
                        outcome.report_id,
                        summary.format_pretty(),
                        run.screenshot_label()
                    )
                }
                Err(ScanError::NotFoundTimeout { .. }) => format!(
                    "{} {}\n{}",
                    "✗".red(),
                    run.target.bold(),
                    "Report not available yet. The scan may still be running; try `sandop report get` later."
                ),
                Err(err) => format!("{} {}\n{}", "✗".red(), run.target.bold(), err),
            })
            .collect();

        blocks.join("\n\n")
    }
}

impl Formattable for ScanRunReport<'_> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => {
                let runs: Vec<ScanRunJson> = self.0.iter().map(ScanRunJson::from).collect();
                Ok(json::format_json(&runs)?)
            }
            OutputFormat::Table => {
                let rows: Vec<ScanRunRow> = self.0.iter().map(ScanRunRow::from).collect();
                Ok(table::format_table(&rows))
            }
            OutputFormat::Pretty => Ok(self.format_pretty()),
        }
    }
}
