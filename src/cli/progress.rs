//! Spinners driven by scan events

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::scan::{EventSender, ScanEvent};

const TICK: Duration = Duration::from_millis(120);

/// Initial spinner text for a new scan
pub const SUBMITTING_MESSAGE: &str = "submitting";

/// Initial spinner text when polling an existing report
pub const WAITING_MESSAGE: &str = "waiting for report";

/// One spinner following the events of one run.
///
/// Hidden when no [`MultiProgress`] is supplied, so callers can treat
/// quiet and interactive modes the same way.
pub struct ScanProgress {
    bar: ProgressBar,
    consumer: JoinHandle<()>,
}

impl ScanProgress {
    /// Start a spinner labelled `label` showing `message` until the first
    /// event arrives, and return the sender the run should publish on.
    pub fn start(
        multi: Option<&MultiProgress>,
        label: &str,
        message: &'static str,
    ) -> (Self, EventSender) {
        let bar = match multi {
            Some(multi) => {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.enable_steady_tick(TICK);
                bar
            }
            None => ProgressBar::hidden(),
        };
        bar.set_prefix(label.to_string());
        bar.set_message(message);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let follower = bar.clone();
        let consumer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                follower.set_message(describe(&event));
            }
        });

        (Self { bar, consumer }, tx)
    }

    /// Stop following: drops the sender, drains remaining events, clears the line.
    pub async fn finish(self, events: EventSender) {
        drop(events);
        let _ = self.consumer.await;
        self.bar.finish_and_clear();
    }
}

/// Spinner text for an event
pub fn describe(event: &ScanEvent) -> String {
    match event {
        ScanEvent::Submitted { report_id } => format!("submitted as {}", report_id),
        ScanEvent::Polling {
            attempt,
            max_attempts,
        } => format!("waiting for report ({}/{})", attempt, max_attempts),
        ScanEvent::ReportReady { attempts } => format!("report ready after {} poll(s)", attempts),
        ScanEvent::FetchingScreenshot => "fetching screenshot".to_string(),
        ScanEvent::Finished => "done".to_string(),
    }
}
