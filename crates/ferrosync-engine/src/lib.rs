//! Incremental backup engine for ferrosync
//!
//! This crate copies a source tree onto a destination tree, writing only files that are
//! new or changed:
//!
//! - **Path validation**: the source must be listable and the destination writable
//! - **Change detection**: existence, modification time and size; contents are never hashed
//! - **Space accounting**: a read-only pass sums pending bytes and checks free space first
//! - **Fail-forward copying**: one unreadable file never stops the rest of the backup
//! - **Progress reporting**: periodic status lines and a final [`RunSummary`]
//!
//! Everything runs synchronously on the calling thread.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrosync_engine::{run_once, SyncRequest};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = run_once(&SyncRequest::new("/home/me/documents", "/mnt/backup"))?;
//! println!(
//!     "Copied {} files, {} unchanged, {} failed",
//!     summary.files_copied, summary.skipped_unchanged, summary.failed
//! );
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod copier;
pub mod detect;
pub mod engine;
pub mod progress;
pub mod space;
pub mod validate;
pub mod walker;

pub use copier::{FileCopier, StreamCopier};
pub use detect::ChangeDetector;
pub use engine::{SyncEngine, SyncOptions, SyncRequest};
pub use progress::{format_bytes, format_duration, format_rate, ProgressReporter};
pub use space::{SpaceEstimator, SpaceProbe, SystemSpaceProbe};
pub use validate::PathValidator;

use ferrosync_types::{Result, RunSummary, SpaceEstimate};

/// Run one complete sync with the default engine
pub fn run_once(request: &SyncRequest) -> Result<RunSummary> {
    SyncEngine::new().run(request)
}

/// Compute what [`run_once`] would copy, without writing to the destination
pub fn estimate(request: &SyncRequest, list_entries: bool) -> Result<SpaceEstimate> {
    SyncEngine::new().estimate(request, list_entries)
}
