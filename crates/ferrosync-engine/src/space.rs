//! Pre-flight space accounting
//!
//! The estimator walks the source once, asks the [`ChangeDetector`] about every regular
//! file and sums the sizes of the files that need copying. The result is compared against
//! the space available to the current user at the destination before any byte is written.

use crate::detect::ChangeDetector;
use crate::progress::format_bytes;
use crate::walker::{relative_path, source_walker};
use ferrosync_types::{EstimateEntry, Error, FileEntry, Result, SpaceEstimate};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Source of free space figures for a destination
///
/// Implementations report the space usable by the calling user, not the raw free block
/// count of the filesystem.
pub trait SpaceProbe {
    /// Bytes available to the caller on the filesystem holding `path`
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// [`SpaceProbe`] backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpaceProbe;

impl SpaceProbe for SystemSpaceProbe {
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        available_to_caller(path)
    }
}

/// `f_bavail * f_frsize`: blocks reserved for root are excluded
#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
fn available_to_caller(path: &Path) -> io::Result<u64> {
    let stats = nix::sys::statvfs::statvfs(path).map_err(io::Error::from)?;
    Ok((stats.blocks_available() as u64).saturating_mul(stats.fragment_size() as u64))
}

#[cfg(windows)]
#[allow(unsafe_code)]
fn available_to_caller(path: &Path) -> io::Result<u64> {
    use windows::core::HSTRING;
    use windows::Win32::Storage::FileSystem::GetDiskFreeSpaceExW;

    let directory = HSTRING::from(path);
    let mut free_bytes_available: u64 = 0;

    // SAFETY: `directory` is a valid NUL terminated wide string for the duration of the
    // call and the out pointer refers to a live local.
    unsafe {
        GetDiskFreeSpaceExW(
            &directory,
            Some(&mut free_bytes_available as *mut u64),
            None,
            None,
        )
    }
    .map_err(io::Error::from)?;

    Ok(free_bytes_available)
}

#[cfg(not(any(unix, windows)))]
fn available_to_caller(_path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "free space query is not supported on this platform",
    ))
}

/// Read-only pass computing how many bytes a sync would write
pub struct SpaceEstimator<'a> {
    detector: &'a ChangeDetector,
    probe: &'a dyn SpaceProbe,
}

impl<'a> SpaceEstimator<'a> {
    /// Create an estimator using `detector` for copy decisions and `probe` for free space
    pub fn new(detector: &'a ChangeDetector, probe: &'a dyn SpaceProbe) -> Self {
        Self { detector, probe }
    }

    /// Walk `source` against `destination` and query free space
    ///
    /// When `collect_entries` is set every file that needs copying is listed in the
    /// result. Entries that cannot be inspected contribute nothing; the copy pass
    /// classifies them.
    pub fn scan(
        &self,
        source: &Path,
        destination: &Path,
        collect_entries: bool,
    ) -> Result<SpaceEstimate> {
        let mut estimate = SpaceEstimate::default();

        for item in source_walker(source) {
            let dir_entry = match item {
                Ok(dir_entry) => dir_entry,
                Err(e) => {
                    warn!("Skipping unreadable entry during estimate: {}", e);
                    continue;
                }
            };

            if !dir_entry.file_type().is_file() {
                continue;
            }

            let metadata = match dir_entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(
                        "Cannot stat {} during estimate: {}",
                        dir_entry.path().display(),
                        e
                    );
                    continue;
                }
            };

            let entry = FileEntry::from_metadata(
                relative_path(source, dir_entry.path()),
                dir_entry.path(),
                &metadata,
            );

            let decision = self
                .detector
                .decide(&entry, &entry.destination_path(destination));
            if decision.needs_copy() {
                debug!("Pending: {} ({:?})", entry.relative_path.display(), decision);
                estimate.required_bytes += entry.size;
                estimate.files_to_copy += 1;
                if collect_entries {
                    estimate.entries.push(EstimateEntry {
                        relative_path: entry.relative_path,
                        size: entry.size,
                    });
                }
            }
        }

        estimate.available_bytes =
            self.probe
                .available_bytes(destination)
                .map_err(|e| Error::SpaceQuery {
                    path: destination.to_path_buf(),
                    message: e.to_string(),
                })?;

        info!(
            "Backing up {} files ({}), {} available",
            estimate.files_to_copy,
            format_bytes(estimate.required_bytes),
            format_bytes(estimate.available_bytes)
        );

        Ok(estimate)
    }

    /// Fail with [`Error::InsufficientSpace`] when `estimate` does not fit
    pub fn ensure_fits(estimate: &SpaceEstimate, destination: &Path) -> Result<()> {
        if estimate.fits() {
            return Ok(());
        }

        Err(Error::InsufficientSpace {
            required: estimate.required_bytes,
            available: estimate.available_bytes,
            path: destination.to_path_buf(),
        })
    }
}
