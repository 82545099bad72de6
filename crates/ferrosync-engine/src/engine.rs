//! Main synchronization engine

use crate::{
    copier::{FileCopier, StreamCopier},
    detect::ChangeDetector,
    progress::{format_bytes, ProgressReporter},
    space::{SpaceEstimator, SpaceProbe, SystemSpaceProbe},
    validate::PathValidator,
    walker::{relative_path, source_walker, walk_error_outcome},
};
use ferrosync_config::SyncConfig;
use ferrosync_types::{
    BufferSize, CopyDecision, CopyOutcome, FileEntry, FileKind, ProgressCallback, Result,
    RunSummary, SpaceEstimate, StatFailurePolicy,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Synchronization request
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Source directory path
    pub source: PathBuf,
    /// Destination directory path
    pub destination: PathBuf,
    /// Sync options
    pub options: SyncOptions,
}

impl SyncRequest {
    /// Create a new sync request
    pub fn new<S: AsRef<Path>, D: AsRef<Path>>(source: S, destination: D) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
            options: SyncOptions::default(),
        }
    }

    /// Set sync options
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }
}

/// Synchronization options
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Copy buffer size
    pub buffer_size: BufferSize,
    /// Files larger than this get in-flight progress signals
    pub large_file_threshold: u64,
    /// Bytes between in-flight progress signals
    pub large_file_progress_interval: u64,
    /// Status line after this many copied files
    pub progress_every_files: u64,
    /// Status line after this many unchanged files
    pub skipped_progress_every: u64,
    /// Preserve file permissions
    pub preserve_permissions: bool,
    /// Slack allowed when comparing modification times
    pub mtime_tolerance: Duration,
    /// Fallback when destination metadata cannot be read
    pub stat_failure_policy: StatFailurePolicy,
}

impl SyncOptions {
    /// Options from the `sync` configuration section
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            buffer_size: config.buffer_size,
            large_file_threshold: config.large_file_threshold,
            large_file_progress_interval: config.large_file_progress_interval,
            progress_every_files: config.progress_every_files,
            skipped_progress_every: config.skipped_progress_every,
            preserve_permissions: config.preserve_permissions,
            mtime_tolerance: config.mtime_tolerance(),
            stat_failure_policy: config.stat_failure_policy,
        }
    }

    fn detector(&self) -> ChangeDetector {
        ChangeDetector::new(self.stat_failure_policy, self.mtime_tolerance)
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

/// Main synchronization engine
///
/// One call to [`SyncEngine::run`] is one complete backup: validation, the read-only
/// estimate pass and, when everything fits, the copy pass.
pub struct SyncEngine {
    space_probe: Box<dyn SpaceProbe>,
    copier: Box<dyn FileCopier>,
    progress: Option<Box<dyn ProgressCallback>>,
}

impl SyncEngine {
    /// Create an engine using the operating system for free space and file copies
    pub fn new() -> Self {
        Self {
            space_probe: Box::new(SystemSpaceProbe),
            copier: Box::new(StreamCopier),
            progress: None,
        }
    }

    /// Replace the free space source
    pub fn with_space_probe(mut self, probe: impl SpaceProbe + 'static) -> Self {
        self.space_probe = Box::new(probe);
        self
    }

    /// Replace the file copier
    pub fn with_copier(mut self, copier: impl FileCopier + 'static) -> Self {
        self.copier = Box::new(copier);
        self
    }

    /// Attach a progress observer
    pub fn with_progress(mut self, callback: impl ProgressCallback + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Perform one synchronization
    ///
    /// Fails only when validation or the space check fails, before anything is written.
    /// Problems with individual entries end up in the returned summary.
    pub fn run(&self, request: &SyncRequest) -> Result<RunSummary> {
        let start_time = Instant::now();
        let summary = RunSummary::new();
        info!(
            "Starting sync: {} -> {}",
            request.source.display(),
            request.destination.display()
        );

        PathValidator::validate(&request.source, &request.destination)?;

        let detector = request.options.detector();
        let estimator = SpaceEstimator::new(&detector, self.space_probe.as_ref());
        let estimate = estimator.scan(&request.source, &request.destination, false)?;
        SpaceEstimator::ensure_fits(&estimate, &request.destination)?;

        let mut reporter = ProgressReporter::new(
            &request.options,
            &estimate,
            summary,
            start_time,
            self.progress.as_deref(),
        );
        self.copy_tree(request, &detector, &mut reporter);

        let summary = reporter.finish(&estimate);
        info!(
            "Run {} completed: {} files, {} transferred",
            summary.run_id,
            summary.files_copied,
            format_bytes(summary.bytes_copied)
        );
        Ok(summary)
    }

    /// Report what a run would copy without writing anything
    ///
    /// With `list_entries` every pending file is included in the result.
    pub fn estimate(&self, request: &SyncRequest, list_entries: bool) -> Result<SpaceEstimate> {
        PathValidator::validate_readonly(&request.source, &request.destination)?;

        let detector = request.options.detector();
        SpaceEstimator::new(&detector, self.space_probe.as_ref()).scan(
            &request.source,
            &request.destination,
            list_entries,
        )
    }

    /// Copy pass: every entry below the source root is visited exactly once
    fn copy_tree(
        &self,
        request: &SyncRequest,
        detector: &ChangeDetector,
        reporter: &mut ProgressReporter<'_>,
    ) {
        let source = &request.source;

        for item in source_walker(source) {
            reporter.entry_visited();

            let dir_entry = match item {
                Ok(dir_entry) => dir_entry,
                Err(e) => {
                    // An unlistable directory ends its own subtree only
                    let path = e
                        .path()
                        .map_or_else(|| source.clone(), |path| relative_path(source, path));
                    reporter.record(&path, &walk_error_outcome(&e));
                    continue;
                }
            };

            let relative = relative_path(source, dir_entry.path());
            let metadata = match dir_entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    reporter.record(&relative, &walk_error_outcome(&e));
                    continue;
                }
            };
            let entry = FileEntry::from_metadata(relative, dir_entry.path(), &metadata);
            let destination = entry.destination_path(&request.destination);

            match entry.kind {
                FileKind::Directory => Self::mirror_directory(&entry, &destination, reporter),
                FileKind::Symlink => {
                    reporter.record(&entry.relative_path, &CopyOutcome::SkippedSymlink);
                }
                FileKind::Other => {
                    reporter.record(&entry.relative_path, &CopyOutcome::SkippedSpecial);
                }
                FileKind::File => {
                    let outcome = match detector.decide(&entry, &destination) {
                        CopyDecision::NeedsCopy(reason) => {
                            debug!("Copying {} ({:?})", entry.relative_path.display(), reason);
                            self.copy_entry(&entry, &destination, &request.options, reporter)
                        }
                        CopyDecision::Unchanged => CopyOutcome::SkippedUnchanged,
                        CopyDecision::UnsupportedKind => CopyOutcome::SkippedSpecial,
                    };
                    reporter.record(&entry.relative_path, &outcome);
                }
            }
        }
    }

    fn mirror_directory(entry: &FileEntry, destination: &Path, reporter: &mut ProgressReporter<'_>) {
        if destination.is_dir() {
            return;
        }

        match fs::create_dir_all(destination) {
            Ok(()) => reporter.directory_created(&entry.relative_path),
            // Files below still get their own outcome when they fail to open
            Err(e) => reporter.record(
                &entry.relative_path,
                &CopyOutcome::Failed {
                    detail: format!(
                        "Failed to create directory '{}': {}",
                        destination.display(),
                        e
                    ),
                },
            ),
        }
    }

    fn copy_entry(
        &self,
        entry: &FileEntry,
        destination: &Path,
        options: &SyncOptions,
        reporter: &mut ProgressReporter<'_>,
    ) -> CopyOutcome {
        let started = Instant::now();
        if reporter.is_large(entry.size) {
            reporter.large_file_started(&entry.relative_path, entry.size);
        }

        let result = self.copier.copy_file(
            &entry.source_path,
            destination,
            options,
            &mut |bytes_done| {
                reporter.transfer_progress(&entry.relative_path, bytes_done, entry.size);
            },
        );

        match result {
            Ok(bytes) => CopyOutcome::Copied {
                bytes,
                duration: started.elapsed(),
            },
            Err(e) => CopyOutcome::from_io_error(&e),
        }
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}
