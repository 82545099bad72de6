//! Metadata based change detection
//!
//! An entry is copied when no regular file exists at its destination path, when the
//! source is strictly newer than the destination, or when the sizes differ. File contents
//! are never read.

use ferrosync_types::{CopyDecision, CopyReason, FileEntry, FileKind, StatFailurePolicy};
use filetime::FileTime;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Decides whether a source entry has to be copied
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    policy: StatFailurePolicy,
    mtime_tolerance: Duration,
}

impl ChangeDetector {
    /// Create a detector with the given stat failure policy and modification time tolerance
    pub fn new(policy: StatFailurePolicy, mtime_tolerance: Duration) -> Self {
        Self {
            policy,
            mtime_tolerance,
        }
    }

    /// Decide what to do with `entry`, mirrored at `destination`
    ///
    /// Only regular files are ever compared. Links, directories and special files are
    /// reported as [`CopyDecision::UnsupportedKind`] without touching the destination.
    pub fn decide(&self, entry: &FileEntry, destination: &Path) -> CopyDecision {
        if entry.kind != FileKind::File {
            return CopyDecision::UnsupportedKind;
        }

        match fs::metadata(destination) {
            Ok(metadata) if !metadata.is_file() => CopyDecision::NeedsCopy(CopyReason::NotAFile),
            Ok(metadata) => self.compare(entry, &metadata),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                CopyDecision::NeedsCopy(CopyReason::Missing)
            }
            Err(e) => {
                debug!(
                    "Cannot stat destination {}: {} (policy: {:?})",
                    destination.display(),
                    e,
                    self.policy
                );
                match self.policy {
                    StatFailurePolicy::Copy => {
                        CopyDecision::NeedsCopy(CopyReason::DestinationUnreadable)
                    }
                    StatFailurePolicy::Skip => CopyDecision::Unchanged,
                }
            }
        }
    }

    fn compare(&self, entry: &FileEntry, destination: &Metadata) -> CopyDecision {
        let source_mtime = FileTime::from_system_time(entry.modified);
        let destination_mtime = FileTime::from_last_modification_time(destination);

        if is_newer(source_mtime, destination_mtime, self.mtime_tolerance) {
            CopyDecision::NeedsCopy(CopyReason::Newer)
        } else if entry.size != destination.len() {
            CopyDecision::NeedsCopy(CopyReason::SizeDiffers)
        } else {
            CopyDecision::Unchanged
        }
    }
}

fn as_nanos(time: FileTime) -> i128 {
    i128::from(time.unix_seconds()) * 1_000_000_000 + i128::from(time.nanoseconds())
}

/// Whether `source` is later than `destination` by more than `tolerance`
fn is_newer(source: FileTime, destination: FileTime, tolerance: Duration) -> bool {
    as_nanos(source) - as_nanos(destination)
        > i128::try_from(tolerance.as_nanos()).unwrap_or(i128::MAX)
}
