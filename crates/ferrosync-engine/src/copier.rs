//! Byte streaming for single files

use crate::engine::SyncOptions;
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Copies the contents and metadata of one regular file
///
/// Errors are returned untouched so the copy pass can tell permission problems from other
/// failures.
pub trait FileCopier {
    /// Copy `source` over `destination`, returning the number of bytes written
    ///
    /// `on_progress` receives the running byte count after every chunk.
    fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        options: &SyncOptions,
        on_progress: &mut dyn FnMut(u64),
    ) -> io::Result<u64>;
}

/// Buffered read/write loop that preserves timestamps and, optionally, permissions
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamCopier;

impl FileCopier for StreamCopier {
    fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        options: &SyncOptions,
        on_progress: &mut dyn FnMut(u64),
    ) -> io::Result<u64> {
        let mut reader = File::open(source)?;
        let metadata = reader.metadata()?;

        make_writable(destination)?;
        let mut writer = File::create(destination)?;

        let bytes = match stream(
            &mut reader,
            &mut writer,
            options.buffer_size.get(),
            on_progress,
        ) {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(writer);
                if let Err(remove_error) = fs::remove_file(destination) {
                    debug!(
                        "Failed to remove partial file {}: {}",
                        destination.display(),
                        remove_error
                    );
                }
                return Err(e);
            }
        };
        drop(writer);

        filetime::set_file_times(
            destination,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )?;

        if options.preserve_permissions {
            if let Err(e) = fs::set_permissions(destination, metadata.permissions()) {
                warn!(
                    "Failed to copy permissions to {}: {}",
                    destination.display(),
                    e
                );
            }
        }

        Ok(bytes)
    }
}

fn stream(
    reader: &mut impl Read,
    writer: &mut impl Write,
    buffer_size: usize,
    on_progress: &mut dyn FnMut(u64),
) -> io::Result<u64> {
    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..read])?;
        total += read as u64;
        on_progress(total);
    }

    writer.flush()?;
    Ok(total)
}

/// Clear the read-only flag of an existing destination so it can be replaced
fn make_writable(destination: &Path) -> io::Result<()> {
    let Ok(metadata) = fs::metadata(destination) else {
        return Ok(());
    };

    let mut permissions = metadata.permissions();
    if !metadata.is_file() || !permissions.readonly() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
    }

    debug!("Clearing read-only flag on {}", destination.display());
    fs::set_permissions(destination, permissions)
}
