//! Core data model and error handling for ferrosync
//!
//! This crate provides the shared types used throughout the ferrosync workspace:
//!
//! - **Error handling**: run-level errors that abort a sync before anything is written
//! - **Data model**: walked entries, copy decisions, per-entry outcomes and run summaries
//! - **Traits**: progress observers for front ends
//! - **Configuration**: validated newtypes shared by the loader, the engine and the scheduler
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_types::{CopyOutcome, RunSummary};
//! use std::path::Path;
//!
//! let mut summary = RunSummary::new();
//! summary.record(Path::new("notes.txt"), &CopyOutcome::SkippedUnchanged);
//! assert_eq!(summary.skipped_unchanged, 1);
//! assert!(summary.is_clean());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{BufferSize, DailyTime};
pub use error::{Error, ErrorKind, ValidationReason, ValidationSide};
pub use result::Result;
pub use traits::*;
pub use types::*;
