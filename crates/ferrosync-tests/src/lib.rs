//! ferrosync integration test suite
//!
//! Shared fixtures for the end-to-end scenarios in `tests/`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Tree builders and injectable engine collaborators used across the test files.
pub mod test_utils;
