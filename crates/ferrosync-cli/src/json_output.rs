//! JSON output structures for ferrosync CLI

use ferrosync_types::{RunSummary, SpaceEstimate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete JSON output for a backup run
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReportJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Counters of the run
    pub summary: RunSummary,
    /// Whether every entry was handled without problems
    pub clean: bool,
    /// Overall result
    pub result: OperationResult,
}

/// Complete JSON output for a dry run
#[derive(Debug, Serialize, Deserialize)]
pub struct EstimateReportJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// What the run would copy
    pub estimate: SpaceEstimate,
    /// Whether the pending bytes fit into the free space
    pub fits: bool,
    /// Bytes missing on the destination, zero when it fits
    pub shortfall_bytes: u64,
}

/// JSON output for a run that stopped before copying anything
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorReportJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Overall result
    pub result: OperationResult,
}

/// Operation metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// ferrosync version
    pub version: String,
    /// Operation type
    pub operation: String,
    /// Timestamp when the report was produced
    pub timestamp: String,
    /// Source path
    pub source_path: String,
    /// Destination path
    pub destination_path: String,
}

/// Overall operation result
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the operation ran to completion
    pub success: bool,
    /// Result message
    pub message: String,
}

impl OperationMetadata {
    /// Metadata for `operation` between two roots, stamped now
    pub fn new(operation: &str, source: &Path, destination: &Path) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            operation: operation.to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            source_path: source.display().to_string(),
            destination_path: destination.display().to_string(),
        }
    }
}

impl RunReportJson {
    /// Create a report from a finished run
    pub fn new(source: &Path, destination: &Path, summary: RunSummary) -> Self {
        let clean = summary.is_clean();
        let message = if clean {
            format!(
                "Backup completed: {} files copied, {} unchanged",
                summary.files_copied, summary.skipped_unchanged
            )
        } else {
            format!(
                "Backup completed with {} problem entries",
                summary.problem_count()
            )
        };

        Self {
            metadata: OperationMetadata::new("run", source, destination),
            summary,
            clean,
            // Per-entry problems do not abort a run
            result: OperationResult {
                success: true,
                message,
            },
        }
    }
}

impl EstimateReportJson {
    /// Create a report from an estimate pass
    pub fn new(source: &Path, destination: &Path, estimate: SpaceEstimate) -> Self {
        Self {
            metadata: OperationMetadata::new("estimate", source, destination),
            fits: estimate.fits(),
            shortfall_bytes: estimate.shortfall(),
            estimate,
        }
    }
}

impl ErrorReportJson {
    /// Create a report for a fatal error
    pub fn new(operation: &str, source: &Path, destination: &Path, message: String) -> Self {
        Self {
            metadata: OperationMetadata::new(operation, source, destination),
            result: OperationResult {
                success: false,
                message,
            },
        }
    }
}
