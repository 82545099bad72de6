//! Progress bar for interactive runs

use ferrosync_engine::format_bytes;
use ferrosync_types::{CopyOutcome, ProgressCallback, RunSummary, SpaceEstimate};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::cell::Cell;
use std::path::Path;
use std::time::Duration;

/// Byte-based progress bar driven by engine events
///
/// The bar length is the byte total of the estimate pass. Large files move the bar while
/// they are being written, everything else moves it once copied.
pub struct BarProgress {
    bar: ProgressBar,
    bytes_done: Cell<u64>,
    files_copied: Cell<u64>,
    files_skipped: Cell<u64>,
}

impl BarProgress {
    /// Create a bar drawing to stderr
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(0),
            ProgressDrawTarget::stderr(),
        ))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        Self {
            bar,
            bytes_done: Cell::new(0),
            files_copied: Cell::new(0),
            files_skipped: Cell::new(0),
        }
    }

    fn refresh_message(&self, current: Option<&Path>) {
        let mut message = format!(
            "{} copied, {} unchanged",
            self.files_copied.get(),
            self.files_skipped.get()
        );
        if let Some(name) = current.and_then(Path::file_name) {
            message.push_str(&format!(" - {}", name.to_string_lossy()));
        }
        self.bar.set_message(message);
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for BarProgress {
    fn on_start(&self, estimate: &SpaceEstimate) {
        self.bar.set_length(estimate.required_bytes);
        self.bar.set_position(0);
        self.bar.enable_steady_tick(Duration::from_millis(100));
        self.refresh_message(None);
    }

    fn on_outcome(&self, path: &Path, outcome: &CopyOutcome) {
        match outcome {
            CopyOutcome::Copied { bytes, .. } => {
                self.bytes_done.set(self.bytes_done.get() + bytes);
                self.files_copied.set(self.files_copied.get() + 1);
                self.bar.set_position(self.bytes_done.get());
                self.refresh_message(Some(path));
            }
            CopyOutcome::SkippedUnchanged => {
                self.files_skipped.set(self.files_skipped.get() + 1);
                self.refresh_message(None);
            }
            CopyOutcome::Failed { detail } => {
                self.bar
                    .println(format!("failed: {}: {}", path.display(), detail));
            }
            _ => {}
        }
    }

    fn on_transfer(&self, path: &Path, bytes_done: u64, total_bytes: u64) {
        self.bar.set_position(self.bytes_done.get() + bytes_done);
        self.bar.set_message(format!(
            "{} ({} of {})",
            path.display(),
            format_bytes(bytes_done),
            format_bytes(total_bytes)
        ));
    }

    fn on_complete(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}
