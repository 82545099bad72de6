//! Core traits for ferrosync operations

use crate::{CopyOutcome, RunSummary, SpaceEstimate};
use std::path::Path;

/// Observer notified while a sync run is in progress
///
/// All methods have empty defaults so an observer only implements what it displays.
/// Calls arrive on the thread running the sync, in walk order.
pub trait ProgressCallback {
    /// The estimate pass finished and copying is about to begin
    fn on_start(&self, _estimate: &SpaceEstimate) {}

    /// An entry was classified
    fn on_outcome(&self, _path: &Path, _outcome: &CopyOutcome) {}

    /// A large file copy made progress
    fn on_transfer(&self, _path: &Path, _bytes_done: u64, _total_bytes: u64) {}

    /// The walk finished
    fn on_complete(&self, _summary: &RunSummary) {}
}
