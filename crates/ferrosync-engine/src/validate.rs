//! Pre-flight validation of the source and destination roots

use ferrosync_types::{Error, Result, ValidationReason, ValidationSide};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Prefix of the file created to prove the destination is writable
pub const PROBE_PREFIX: &str = ".ferrosync-probe-";

/// Checks that a sync can start at all
///
/// Every failure is fatal for the run and is reported before either tree is modified.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathValidator;

impl PathValidator {
    /// Confirm the source can be listed and a file can be created in the destination
    pub fn validate(source: &Path, destination: &Path) -> Result<()> {
        Self::validate_source(source)?;
        Self::validate_directory(ValidationSide::Destination, destination)?;
        Self::reject_nested(source, destination)?;
        Self::probe_writable(destination)?;

        info!("Destination directory is writable: {}", destination.display());
        Ok(())
    }

    /// Same checks as [`PathValidator::validate`] without the write probe
    pub fn validate_readonly(source: &Path, destination: &Path) -> Result<()> {
        Self::validate_source(source)?;
        Self::validate_directory(ValidationSide::Destination, destination)?;
        Self::reject_nested(source, destination)
    }

    fn validate_source(source: &Path) -> Result<()> {
        Self::validate_directory(ValidationSide::Source, source)?;

        fs::read_dir(source)
            .map_err(|e| Error::validation(ValidationSide::Source, source, reason_for(&e)))?;

        info!("Source directory is readable: {}", source.display());
        Ok(())
    }

    fn validate_directory(side: ValidationSide, path: &Path) -> Result<()> {
        let metadata =
            fs::metadata(path).map_err(|e| Error::validation(side, path, reason_for(&e)))?;

        if metadata.is_dir() {
            Ok(())
        } else {
            Err(Error::validation(side, path, ValidationReason::NotADirectory))
        }
    }

    fn reject_nested(source: &Path, destination: &Path) -> Result<()> {
        let source = fs::canonicalize(source)
            .map_err(|e| Error::validation(ValidationSide::Source, source, reason_for(&e)))?;
        let canonical_destination = fs::canonicalize(destination).map_err(|e| {
            Error::validation(ValidationSide::Destination, destination, reason_for(&e))
        })?;

        if canonical_destination.starts_with(&source) {
            return Err(Error::validation(
                ValidationSide::Destination,
                destination,
                ValidationReason::Nested,
            ));
        }

        Ok(())
    }

    fn probe_writable(destination: &Path) -> Result<()> {
        let probe = destination.join(format!("{}{}", PROBE_PREFIX, uuid::Uuid::new_v4().simple()));

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&probe)
            .map_err(|e| {
                Error::validation(ValidationSide::Destination, destination, reason_for(&e))
            })?;

        if let Err(e) = fs::remove_file(&probe) {
            warn!("Failed to remove probe file {}: {}", probe.display(), e);
        } else {
            debug!("Removed probe file {}", probe.display());
        }

        Ok(())
    }
}

fn reason_for(error: &io::Error) -> ValidationReason {
    match error.kind() {
        io::ErrorKind::NotFound => ValidationReason::Missing,
        io::ErrorKind::PermissionDenied => ValidationReason::PermissionDenied,
        _ => ValidationReason::Io(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrosync_types::ErrorKind;
    use tempfile::TempDir;

    fn validation_failure(result: Result<()>) -> (ValidationSide, ValidationReason) {
        match result {
            Err(Error::Validation { side, reason, .. }) => (side, reason),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_roots() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();

        PathValidator::validate(source.path(), destination.path()).unwrap();

        // The probe file is gone again
        assert_eq!(fs::read_dir(destination.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let result = PathValidator::validate(&temp_dir.path().join("absent"), temp_dir.path());

        assert_eq!(
            validation_failure(result),
            (ValidationSide::Source, ValidationReason::Missing)
        );
    }

    #[test]
    fn test_missing_destination() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        let result =
            PathValidator::validate(source.path(), &destination.path().join("not-mounted"));

        assert_eq!(
            validation_failure(result),
            (ValidationSide::Destination, ValidationReason::Missing)
        );
    }

    #[test]
    fn test_source_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, b"data").unwrap();
        let destination = TempDir::new().unwrap();

        let error = PathValidator::validate(&file, destination.path()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert!(error.is_fatal());
        assert_eq!(
            validation_failure(Err(error)),
            (ValidationSide::Source, ValidationReason::NotADirectory)
        );
    }

    #[test]
    fn test_destination_is_a_file() {
        let source = TempDir::new().unwrap();
        let file = source.path().join("file.txt");
        fs::write(&file, b"data").unwrap();
        let other = TempDir::new().unwrap();

        let result = PathValidator::validate(other.path(), &file);
        assert_eq!(
            validation_failure(result),
            (ValidationSide::Destination, ValidationReason::NotADirectory)
        );
    }

    #[test]
    fn test_destination_inside_source() {
        let source = TempDir::new().unwrap();
        let nested = source.path().join("backup");
        fs::create_dir(&nested).unwrap();

        assert_eq!(
            validation_failure(PathValidator::validate(source.path(), &nested)),
            (ValidationSide::Destination, ValidationReason::Nested)
        );
        assert_eq!(
            validation_failure(PathValidator::validate_readonly(source.path(), source.path())),
            (ValidationSide::Destination, ValidationReason::Nested)
        );
    }

    #[test]
    fn test_sibling_with_common_prefix_is_not_nested() {
        let parent = TempDir::new().unwrap();
        let source = parent.path().join("data");
        let destination = parent.path().join("data-backup");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();

        PathValidator::validate(&source, &destination).unwrap();
    }

    #[test]
    fn test_readonly_validation_leaves_destination_untouched() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();

        PathValidator::validate_readonly(source.path(), destination.path()).unwrap();
        assert_eq!(fs::read_dir(destination.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_destination() {
        use std::os::unix::fs::PermissionsExt;

        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        fs::set_permissions(destination.path(), fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind the superuser
        let writable = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination.path().join("check"))
            .is_ok();
        if !writable {
            assert_eq!(
                validation_failure(PathValidator::validate(source.path(), destination.path())),
                (ValidationSide::Destination, ValidationReason::PermissionDenied)
            );
        }

        fs::set_permissions(destination.path(), fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_source() {
        use std::os::unix::fs::PermissionsExt;

        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        fs::set_permissions(source.path(), fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(source.path()).is_err() {
            assert_eq!(
                validation_failure(PathValidator::validate(source.path(), destination.path())),
                (ValidationSide::Source, ValidationReason::PermissionDenied)
            );
        }

        fs::set_permissions(source.path(), fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_reason_for_io_errors() {
        let error = io::Error::new(io::ErrorKind::Other, "device gone");
        assert_eq!(
            reason_for(&error),
            ValidationReason::Io("device gone".to_string())
        );
    }
}
