//! Unified test utilities for ferrosync tests
//!
//! Scratch source/destination trees plus engine collaborators that simulate a small disk,
//! unreadable files or failing media without touching real permissions.

use ferrosync_engine::{FileCopier, SpaceProbe, StreamCopier, SyncOptions};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Common file sizes for scenarios
pub struct CommonFileSizes;

impl CommonFileSizes {
    /// 10 KB
    pub const SMALL: usize = 10 * 1024;
    /// 10 MB
    pub const MEDIUM: usize = 10 * 1024 * 1024;
    /// 1 GB
    pub const GIGABYTE: u64 = 1024 * 1024 * 1024;
}

/// A source tree and an empty destination tree in one temporary directory
pub struct SyncFixture {
    _temp_dir: TempDir,
    source: PathBuf,
    destination: PathBuf,
}

impl SyncFixture {
    /// Create `src/` and `dst/` below a fresh temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        fs::create_dir(&source).expect("Failed to create source");
        fs::create_dir(&destination).expect("Failed to create destination");
        Self {
            _temp_dir: temp_dir,
            source,
            destination,
        }
    }

    /// Source root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination root
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Write `size` bytes of patterned data at `relative` below the source
    pub fn write_source(&self, relative: &str, size: usize) -> PathBuf {
        let path = self.source.join(relative);
        write_patterned(&path, size);
        path
    }

    /// Write `size` bytes of patterned data at `relative` below the destination
    pub fn write_destination(&self, relative: &str, size: usize) -> PathBuf {
        let path = self.destination.join(relative);
        write_patterned(&path, size);
        path
    }

    /// Paths of all regular files below the destination, relative and sorted
    pub fn destination_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_files(&self.destination, &self.destination, &mut files);
        files.sort();
        files
    }
}

impl Default for SyncFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_patterned(path: &Path, size: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    let data: Vec<u8> = (0..size).map(|i| ((i * 7 + 13) % 256) as u8).collect();
    fs::write(path, data).expect("Failed to write test file");
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).expect("Failed to read directory") {
        let entry = entry.expect("Failed to read directory entry");
        let file_type = entry.file_type().expect("Failed to read file type");
        if file_type.is_dir() {
            collect_files(root, &entry.path(), files);
        } else {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("Entry outside root")
                .to_path_buf();
            files.push(relative);
        }
    }
}

/// Set the modification time of `path` relative to now
pub fn set_mtime_offset(path: &Path, offset_secs: i64) {
    let now = SystemTime::now();
    let shifted = if offset_secs >= 0 {
        now + Duration::from_secs(offset_secs.unsigned_abs())
    } else {
        now - Duration::from_secs(offset_secs.unsigned_abs())
    };
    filetime::set_file_mtime(path, FileTime::from_system_time(shifted))
        .expect("Failed to set mtime");
}

/// Modification time of `path`
pub fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).expect("Failed to stat"))
}

/// [`SpaceProbe`] reporting a fixed number of free bytes
#[derive(Debug, Clone, Copy)]
pub struct FixedSpace(pub u64);

impl SpaceProbe for FixedSpace {
    fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.0)
    }
}

/// [`FileCopier`] that refuses files whose name starts with a prefix
///
/// Refused files fail with `PermissionDenied`; all others are copied normally.
#[derive(Debug, Clone)]
pub struct DenyingCopier {
    prefix: String,
}

impl DenyingCopier {
    /// Deny every file named `prefix*`
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }
}

impl FileCopier for DenyingCopier {
    fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        options: &SyncOptions,
        on_progress: &mut dyn FnMut(u64),
    ) -> io::Result<u64> {
        let denied = source
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&self.prefix));
        if denied {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Permission denied: {}", source.display()),
            ));
        }
        StreamCopier.copy_file(source, destination, options, on_progress)
    }
}

/// [`FileCopier`] whose copies of `prefix*` files fail with a generic I/O error
///
/// Stands in for a bad sector or a vanished network share; other files are copied normally.
#[derive(Debug, Clone)]
pub struct FailingCopier {
    prefix: String,
}

impl FailingCopier {
    /// Fail every file named `prefix*`
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }
}

impl FileCopier for FailingCopier {
    fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        options: &SyncOptions,
        on_progress: &mut dyn FnMut(u64),
    ) -> io::Result<u64> {
        let failing = source
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&self.prefix));
        if failing {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Input/output error reading {}", source.display()),
            ));
        }
        StreamCopier.copy_file(source, destination, options, on_progress)
    }
}
