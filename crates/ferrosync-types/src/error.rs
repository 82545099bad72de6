//! Error types and handling for ferrosync
//!
//! Only run-level failures are modelled here. Problems with individual files never
//! become an [`Error`]: the copy engine turns them into [`crate::CopyOutcome`] values
//! so that one bad file cannot stop a backup.

use std::fmt;
use std::path::PathBuf;

/// Which side of a sync a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValidationSide {
    /// The tree being backed up
    Source,
    /// The tree receiving the backup
    Destination,
}

impl fmt::Display for ValidationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// Why a root path was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValidationReason {
    /// The path does not exist
    Missing,
    /// The path exists but is not a directory
    NotADirectory,
    /// The directory cannot be listed (source) or written (destination)
    PermissionDenied,
    /// The destination lies inside the source tree
    Nested,
    /// Any other I/O failure while probing the path
    Io(String),
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("not found"),
            Self::NotADirectory => f.write_str("not a directory"),
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::Nested => f.write_str("located inside the source tree"),
            Self::Io(message) => write!(f, "I/O error: {}", message),
        }
    }
}

/// Main error type for ferrosync operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// A root path failed pre-flight validation
    #[error("Invalid {side} '{}': {reason}", .path.display())]
    Validation {
        /// Side that failed
        side: ValidationSide,
        /// Root path that was probed
        path: PathBuf,
        /// Why it failed
        reason: ValidationReason,
    },

    /// The destination cannot hold the bytes that need copying
    #[error(
        "Insufficient space on '{}': need {required} bytes, have {available} bytes",
        .path.display()
    )]
    InsufficientSpace {
        /// Bytes the pending copies require
        required: u64,
        /// Bytes available to the current user
        available: u64,
        /// Destination root
        path: PathBuf,
    },

    /// Free space could not be queried
    #[error("Failed to query free space on '{}': {message}", .path.display())]
    SpaceQuery {
        /// Path that was queried
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Root path validation
    Validation,
    /// Destination space checks
    Space,
    /// Configuration errors
    Config,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InsufficientSpace { .. } | Self::SpaceQuery { .. } => ErrorKind::Space,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Whether the error aborts a run before anything is written
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Space)
    }

    /// Create a new validation error
    pub fn validation<P: Into<PathBuf>>(
        side: ValidationSide,
        path: P,
        reason: ValidationReason,
    ) -> Self {
        Self::Validation {
            side,
            path: path.into(),
            reason,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
