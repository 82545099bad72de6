//! Progress tracking for sync runs
//!
//! The [`ProgressReporter`] owns the [`RunSummary`] of one run. The copy pass feeds it
//! every outcome; it keeps the counters, writes periodic status lines to the log and
//! forwards events to an optional [`ProgressCallback`].

use crate::engine::SyncOptions;
use ferrosync_types::{CopyOutcome, ProgressCallback, RunSummary, SpaceEstimate};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Accumulates outcomes of one run
pub struct ProgressReporter<'a> {
    summary: RunSummary,
    expected_files: u64,
    progress_every_files: u64,
    skipped_progress_every: u64,
    large_file_threshold: u64,
    large_file_progress_interval: u64,
    next_transfer_mark: u64,
    start_time: Instant,
    callback: Option<&'a dyn ProgressCallback>,
}

impl<'a> ProgressReporter<'a> {
    /// Create a reporter for a copy pass planned by `estimate`
    ///
    /// `summary` and `start_time` are taken when the run begins, so the final elapsed
    /// time covers validation and the estimate pass as well.
    pub fn new(
        options: &SyncOptions,
        estimate: &SpaceEstimate,
        summary: RunSummary,
        start_time: Instant,
        callback: Option<&'a dyn ProgressCallback>,
    ) -> Self {
        if let Some(callback) = callback {
            callback.on_start(estimate);
        }

        Self {
            summary,
            expected_files: estimate.files_to_copy,
            progress_every_files: options.progress_every_files.max(1),
            skipped_progress_every: options.skipped_progress_every.max(1),
            large_file_threshold: options.large_file_threshold,
            large_file_progress_interval: options.large_file_progress_interval.max(1),
            next_transfer_mark: 0,
            start_time,
            callback,
        }
    }

    /// Count an entry reached by the walk
    pub fn entry_visited(&mut self) {
        self.summary.entries_visited += 1;
    }

    /// Count a destination directory the run had to create
    pub fn directory_created(&mut self, path: &Path) {
        debug!("Created directory {}", path.display());
        self.summary.directories_created += 1;
    }

    /// Record the outcome for the entry at relative `path`
    pub fn record(&mut self, path: &Path, outcome: &CopyOutcome) {
        match outcome {
            CopyOutcome::Copied { bytes, duration } => {
                debug!(
                    "Copied {} ({} in {:?})",
                    path.display(),
                    format_bytes(*bytes),
                    duration
                );
            }
            CopyOutcome::SkippedUnchanged => debug!("Unchanged: {}", path.display()),
            CopyOutcome::SkippedSymlink => warn!("Skipping symbolic link: {}", path.display()),
            CopyOutcome::SkippedSpecial => warn!("Skipping special file: {}", path.display()),
            CopyOutcome::SkippedPermission { detail } => {
                warn!("Permission denied: {}: {}", path.display(), detail);
            }
            CopyOutcome::Failed { detail } => {
                error!("Failed to copy {}: {}", path.display(), detail);
            }
        }

        self.summary.record(path, outcome);

        match outcome {
            CopyOutcome::Copied { .. }
                if self.summary.files_copied % self.progress_every_files == 0 =>
            {
                info!(
                    "Progress: {}/{} files copied ({})",
                    self.summary.files_copied,
                    self.expected_files,
                    format_bytes(self.summary.bytes_copied)
                );
            }
            CopyOutcome::SkippedUnchanged
                if self.summary.skipped_unchanged % self.skipped_progress_every == 0 =>
            {
                info!(
                    "Skipped {} unchanged files so far",
                    self.summary.skipped_unchanged
                );
            }
            _ => {}
        }

        if let Some(callback) = self.callback {
            callback.on_outcome(path, outcome);
        }
    }

    /// Whether a file of `size` bytes gets in-flight progress signals
    pub fn is_large(&self, size: u64) -> bool {
        size > self.large_file_threshold
    }

    /// A copy of a large file is about to start
    pub fn large_file_started(&mut self, path: &Path, size: u64) {
        info!("Copying large file: {} ({})", path.display(), format_bytes(size));
        self.next_transfer_mark = self.large_file_progress_interval;
    }

    /// Running byte count of the current copy
    ///
    /// Only large files produce signals, one per progress interval.
    pub fn transfer_progress(&mut self, path: &Path, bytes_done: u64, total_bytes: u64) {
        if !self.is_large(total_bytes) || bytes_done < self.next_transfer_mark {
            return;
        }

        info!(
            "{}: {} of {} copied",
            path.display(),
            format_bytes(bytes_done),
            format_bytes(total_bytes)
        );
        while self.next_transfer_mark <= bytes_done {
            self.next_transfer_mark += self.large_file_progress_interval;
        }

        if let Some(callback) = self.callback {
            callback.on_transfer(path, bytes_done, total_bytes);
        }
    }

    /// Close the run and log the final summary
    pub fn finish(mut self, estimate: &SpaceEstimate) -> RunSummary {
        self.summary.elapsed = self.start_time.elapsed();
        self.summary.required_bytes = estimate.required_bytes;
        self.summary.available_bytes = estimate.available_bytes;

        let summary = self.summary;
        info!(
            "Sync finished in {}: {} files copied ({}), {} unchanged, {} symlinks skipped, \
             {} special files skipped, {} permission errors, {} failed",
            format_duration(summary.elapsed),
            summary.files_copied,
            format_bytes(summary.bytes_copied),
            summary.skipped_unchanged,
            summary.skipped_symlink,
            summary.skipped_special,
            summary.skipped_permission,
            summary.failed
        );
        for failure in &summary.failures {
            error!("  failed: {}: {}", failure.path.display(), failure.detail);
        }
        for path in &summary.permission_denied {
            warn!("  permission denied: {}", path.display());
        }

        if let Some(callback) = self.callback {
            callback.on_complete(&summary);
        }

        summary
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format bytes per second as human-readable string
pub fn format_rate(bytes_per_sec: f64) -> String {
    const UNITS: &[&str] = &["B/s", "KB/s", "MB/s", "GB/s", "TB/s"];
    let mut size = bytes_per_sec;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, UNITS[unit_index])
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else if total_seconds > 0 {
        format!("{}s", seconds)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
