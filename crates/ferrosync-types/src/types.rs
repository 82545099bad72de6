//! Core data types for ferrosync
//!
//! This module provides the values that flow through one sync run: entries discovered
//! by the walk, the per-entry decision and outcome, the pre-flight space estimate and
//! the aggregate [`RunSummary`].

use chrono::{DateTime, Local};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fs::{FileType, Metadata};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Unique identifier for a sync run
pub type RunId = uuid::Uuid;

/// Kind of filesystem object found during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FileKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (never followed)
    Symlink,
    /// FIFO, socket, device node or anything else
    Other,
}

impl FileKind {
    /// Classify a file type obtained without following links
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// A filesystem object discovered during a tree walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the tree root; the join key between source and destination
    pub relative_path: PathBuf,
    /// Absolute path under the source root
    pub source_path: PathBuf,
    /// Kind of object
    pub kind: FileKind,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Build an entry from `symlink_metadata` of `source_path`
    pub fn from_metadata(
        relative_path: impl Into<PathBuf>,
        source_path: impl Into<PathBuf>,
        metadata: &Metadata,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            source_path: source_path.into(),
            kind: FileKind::from_file_type(metadata.file_type()),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Path of this entry mirrored under `destination_root`
    pub fn destination_path(&self, destination_root: &Path) -> PathBuf {
        destination_root.join(&self.relative_path)
    }
}

/// Why an entry has to be copied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CopyReason {
    /// Nothing exists at the destination path
    Missing,
    /// Source modification time is strictly newer
    Newer,
    /// Sizes differ
    SizeDiffers,
    /// Destination metadata could not be read
    DestinationUnreadable,
    /// Something other than a regular file occupies the destination path
    NotAFile,
}

/// Verdict of the change detector for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDecision {
    /// The entry must be copied
    NeedsCopy(CopyReason),
    /// The destination already matches
    Unchanged,
    /// The entry is never copied (links, directories, special files)
    UnsupportedKind,
}

impl CopyDecision {
    /// Whether the entry has to be copied
    pub fn needs_copy(self) -> bool {
        matches!(self, Self::NeedsCopy(_))
    }
}

/// What to do when destination metadata exists but cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StatFailurePolicy {
    /// Re-copy the entry
    #[default]
    Copy,
    /// Treat the entry as unchanged
    Skip,
}

/// Result of acting on one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Bytes were written to the destination
    Copied {
        /// Bytes copied
        bytes: u64,
        /// Time spent copying
        duration: Duration,
    },
    /// The destination already matched
    SkippedUnchanged,
    /// Symbolic link, not followed
    SkippedSymlink,
    /// FIFO, socket or device node
    SkippedSpecial,
    /// Permission denied while reading or writing
    SkippedPermission {
        /// Underlying error
        detail: String,
    },
    /// Any other I/O failure
    Failed {
        /// Underlying error
        detail: String,
    },
}

/// Discriminant of [`CopyOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutcomeKind {
    /// See [`CopyOutcome::Copied`]
    Copied,
    /// See [`CopyOutcome::SkippedUnchanged`]
    SkippedUnchanged,
    /// See [`CopyOutcome::SkippedSymlink`]
    SkippedSymlink,
    /// See [`CopyOutcome::SkippedSpecial`]
    SkippedSpecial,
    /// See [`CopyOutcome::SkippedPermission`]
    SkippedPermission,
    /// See [`CopyOutcome::Failed`]
    Failed,
}

impl CopyOutcome {
    /// Get the outcome kind
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Copied { .. } => OutcomeKind::Copied,
            Self::SkippedUnchanged => OutcomeKind::SkippedUnchanged,
            Self::SkippedSymlink => OutcomeKind::SkippedSymlink,
            Self::SkippedSpecial => OutcomeKind::SkippedSpecial,
            Self::SkippedPermission { .. } => OutcomeKind::SkippedPermission,
            Self::Failed { .. } => OutcomeKind::Failed,
        }
    }

    /// Classify an I/O error raised while acting on an entry
    pub fn from_io_error(error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            Self::SkippedPermission {
                detail: error.to_string(),
            }
        } else {
            Self::Failed {
                detail: error.to_string(),
            }
        }
    }
}

/// A failed entry kept for the final report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntryFailure {
    /// Path relative to the source root
    pub path: PathBuf,
    /// Underlying error
    pub detail: String,
}

/// Aggregate counters for one sync run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// Run identifier
    pub run_id: RunId,
    /// Wall-clock start of the run
    pub started_at: DateTime<Local>,
    /// Entries visited by the copy pass, directories included
    pub entries_visited: u64,
    /// Destination directories that had to be created
    pub directories_created: u64,
    /// Files copied
    pub files_copied: u64,
    /// Bytes copied
    pub bytes_copied: u64,
    /// Files whose destination already matched
    pub skipped_unchanged: u64,
    /// Symbolic links skipped
    pub skipped_symlink: u64,
    /// Special files skipped
    pub skipped_special: u64,
    /// Entries skipped on permission errors
    pub skipped_permission: u64,
    /// Entries that failed with other I/O errors
    pub failed: u64,
    /// Details of failed entries
    pub failures: Vec<EntryFailure>,
    /// Entries skipped on permission errors
    pub permission_denied: Vec<PathBuf>,
    /// Total wall time of the run
    pub elapsed: Duration,
    /// Bytes the estimator said had to be copied
    pub required_bytes: u64,
    /// Bytes available at the destination when the run started
    pub available_bytes: u64,
}

impl RunSummary {
    /// Create an empty summary stamped with a fresh run id and the current time
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            started_at: Local::now(),
            entries_visited: 0,
            directories_created: 0,
            files_copied: 0,
            bytes_copied: 0,
            skipped_unchanged: 0,
            skipped_symlink: 0,
            skipped_special: 0,
            skipped_permission: 0,
            failed: 0,
            failures: Vec::new(),
            permission_denied: Vec::new(),
            elapsed: Duration::ZERO,
            required_bytes: 0,
            available_bytes: 0,
        }
    }

    /// Count one outcome for `path`
    pub fn record(&mut self, path: &Path, outcome: &CopyOutcome) {
        match outcome {
            CopyOutcome::Copied { bytes, .. } => {
                self.files_copied += 1;
                self.bytes_copied += bytes;
            }
            CopyOutcome::SkippedUnchanged => self.skipped_unchanged += 1,
            CopyOutcome::SkippedSymlink => self.skipped_symlink += 1,
            CopyOutcome::SkippedSpecial => self.skipped_special += 1,
            CopyOutcome::SkippedPermission { .. } => {
                self.skipped_permission += 1;
                self.permission_denied.push(path.to_path_buf());
            }
            CopyOutcome::Failed { detail } => {
                self.failed += 1;
                self.failures.push(EntryFailure {
                    path: path.to_path_buf(),
                    detail: detail.clone(),
                });
            }
        }
    }

    /// Number of entries recorded with the given outcome kind
    pub fn count(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::Copied => self.files_copied,
            OutcomeKind::SkippedUnchanged => self.skipped_unchanged,
            OutcomeKind::SkippedSymlink => self.skipped_symlink,
            OutcomeKind::SkippedSpecial => self.skipped_special,
            OutcomeKind::SkippedPermission => self.skipped_permission,
            OutcomeKind::Failed => self.failed,
        }
    }

    /// Entries that hit a permission or I/O error
    pub fn problem_count(&self) -> u64 {
        self.skipped_permission + self.failed
    }

    /// True when no entry hit a permission or I/O error
    pub fn is_clean(&self) -> bool {
        self.problem_count() == 0
    }

    /// Relative paths of failed entries
    pub fn failed_paths(&self) -> impl Iterator<Item = &Path> {
        self.failures.iter().map(|failure| failure.path.as_path())
    }

    /// Average copy throughput in bytes per second
    pub fn transfer_rate(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_copied as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry the estimator found to need copying
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimateEntry {
    /// Path relative to the source root
    pub relative_path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Result of the read-only pre-flight pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpaceEstimate {
    /// Sum of sizes of files that need copying
    pub required_bytes: u64,
    /// Bytes available to the current user at the destination
    pub available_bytes: u64,
    /// Number of files that need copying
    pub files_to_copy: u64,
    /// Per-entry listing, only filled when requested
    pub entries: Vec<EstimateEntry>,
}

impl SpaceEstimate {
    /// Whether the pending copies fit on the destination
    pub fn fits(&self) -> bool {
        self.required_bytes <= self.available_bytes
    }

    /// Bytes missing on the destination, zero when the copies fit
    pub fn shortfall(&self) -> u64 {
        self.required_bytes.saturating_sub(self.available_bytes)
    }
}
