//! Integration tests for ferrosync
//!
//! These tests run complete backups through the public engine API on real temporary
//! trees, with free space and unreadable files simulated where needed.

use ferrosync_engine::{SyncEngine, SyncOptions, SyncRequest};
use ferrosync_tests::test_utils::{
    mtime, set_mtime_offset, CommonFileSizes, DenyingCopier, FailingCopier, FixedSpace,
    SyncFixture,
};
use ferrosync_types::{Error, ErrorKind, ValidationReason, ValidationSide};
use proptest::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;

fn engine() -> SyncEngine {
    SyncEngine::new().with_space_probe(FixedSpace(CommonFileSizes::GIGABYTE))
}

fn request(fixture: &SyncFixture) -> SyncRequest {
    SyncRequest::new(fixture.source(), fixture.destination())
}

#[cfg(unix)]
#[test]
fn test_reference_scenario() {
    let fixture = SyncFixture::new();
    fixture.write_source("a.txt", CommonFileSizes::SMALL);
    fixture.write_source("b/c.txt", CommonFileSizes::MEDIUM);
    std::os::unix::fs::symlink(
        fixture.source().join("a.txt"),
        fixture.source().join("b").join("link"),
    )
    .unwrap();

    let first = engine().run(&request(&fixture)).unwrap();

    assert_eq!(first.files_copied, 2);
    assert_eq!(first.skipped_symlink, 1);
    assert_eq!(first.skipped_unchanged, 0);
    assert_eq!(first.directories_created, 1);
    assert_eq!(first.entries_visited, 4);
    assert_eq!(
        first.bytes_copied,
        (CommonFileSizes::SMALL + CommonFileSizes::MEDIUM) as u64
    );
    assert!(fixture.destination().join("b").is_dir());
    assert!(fs::symlink_metadata(fixture.destination().join("b").join("link")).is_err());
    assert_eq!(
        fixture.destination_files(),
        vec![PathBuf::from("a.txt"), PathBuf::from("b").join("c.txt")]
    );

    let second = engine().run(&request(&fixture)).unwrap();

    assert_eq!(second.files_copied, 0);
    assert_eq!(second.skipped_unchanged, 2);
    assert_eq!(second.skipped_symlink, 1);
    assert_eq!(second.directories_created, 0);
    assert_eq!(second.bytes_copied, 0);
}

#[test]
fn test_second_run_copies_nothing() {
    let fixture = SyncFixture::new();
    fixture.write_source("one.txt", 100);
    fixture.write_source("nested/two.txt", 200);
    fixture.write_source("nested/deeper/three.txt", 0);

    let first = engine().run(&request(&fixture)).unwrap();
    assert_eq!(first.files_copied, 3);
    assert_eq!(first.directories_created, 2);

    let second = engine().run(&request(&fixture)).unwrap();
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.skipped_unchanged, 3);
    assert!(second.is_clean());
}

#[test]
fn test_copied_files_keep_source_mtime() {
    let fixture = SyncFixture::new();
    let source = fixture.write_source("dated.txt", 64);
    set_mtime_offset(&source, -86_400);

    engine().run(&request(&fixture)).unwrap();

    let destination = fixture.destination().join("dated.txt");
    assert_eq!(mtime(&destination), mtime(&source));
    assert_eq!(fs::read(&destination).unwrap(), fs::read(&source).unwrap());
}

#[rstest]
#[case::source_newer(100, 100, 3_600, true)]
#[case::size_differs(150, 100, -3_600, true)]
#[case::destination_newer_same_size(100, 100, -3_600, false)]
fn test_incremental_decision(
    #[case] source_size: usize,
    #[case] destination_size: usize,
    #[case] source_offset_secs: i64,
    #[case] expect_copy: bool,
) {
    let fixture = SyncFixture::new();
    let source = fixture.write_source("file.txt", source_size);
    let destination = fixture.write_destination("file.txt", destination_size);
    set_mtime_offset(&destination, 0);
    set_mtime_offset(&source, source_offset_secs);

    let summary = engine().run(&request(&fixture)).unwrap();

    if expect_copy {
        assert_eq!(summary.files_copied, 1);
        assert_eq!(fs::read(&destination).unwrap(), fs::read(&source).unwrap());
    } else {
        assert_eq!(summary.skipped_unchanged, 1);
        assert_eq!(fs::metadata(&destination).unwrap().len(), destination_size as u64);
    }
}

#[test]
fn test_only_changed_file_is_recopied() {
    let fixture = SyncFixture::new();
    fixture.write_source("keep.txt", 100);
    let changed = fixture.write_source("change.txt", 100);
    engine().run(&request(&fixture)).unwrap();

    fs::write(&changed, b"new contents").unwrap();
    set_mtime_offset(&changed, 60);

    let summary = engine().run(&request(&fixture)).unwrap();
    assert_eq!(summary.files_copied, 1);
    assert_eq!(summary.skipped_unchanged, 1);
    assert_eq!(
        fs::read(fixture.destination().join("change.txt")).unwrap(),
        b"new contents"
    );
}

#[test]
fn test_destination_extras_are_left_alone() {
    let fixture = SyncFixture::new();
    fixture.write_source("a.txt", 10);
    fixture.write_destination("only-in-backup.txt", 10);

    engine().run(&request(&fixture)).unwrap();

    assert!(fixture.destination().join("only-in-backup.txt").exists());
}

#[test]
fn test_permission_failures_do_not_stop_the_run() {
    let fixture = SyncFixture::new();
    for name in ["locked-1.txt", "locked-2.txt", "ok-1.txt", "ok-2.txt", "sub/ok-3.txt"] {
        fixture.write_source(name, 32);
    }

    let summary = engine()
        .with_copier(DenyingCopier::new("locked-"))
        .run(&request(&fixture))
        .unwrap();

    assert_eq!(summary.skipped_permission, 2);
    assert_eq!(summary.files_copied, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        summary.permission_denied,
        vec![PathBuf::from("locked-1.txt"), PathBuf::from("locked-2.txt")]
    );
    assert_eq!(
        fixture.destination_files(),
        vec![
            PathBuf::from("ok-1.txt"),
            PathBuf::from("ok-2.txt"),
            PathBuf::from("sub").join("ok-3.txt"),
        ]
    );
}

#[test]
fn test_copy_failure_is_recorded_and_walk_continues() {
    let fixture = SyncFixture::new();
    fixture.write_source("a-first.txt", 16);
    fixture.write_source("bad-sector.bin", 16);
    fixture.write_source("z/last.txt", 16);

    let summary = engine()
        .with_copier(FailingCopier::new("bad-"))
        .run(&request(&fixture))
        .unwrap();

    assert_eq!(summary.files_copied, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped_permission, 0);
    assert!(summary.permission_denied.is_empty());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].path, PathBuf::from("bad-sector.bin"));
    assert!(summary.failures[0].detail.contains("Input/output error"));
    assert!(!summary.is_clean());
    assert_eq!(
        fixture.destination_files(),
        vec![PathBuf::from("a-first.txt"), PathBuf::from("z").join("last.txt")]
    );
}

#[cfg(unix)]
#[test]
fn test_unlistable_directory_ends_only_its_subtree() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = SyncFixture::new();
    fixture.write_source("a.txt", 8);
    fixture.write_source("locked/hidden.txt", 8);
    fixture.write_source("z.txt", 8);
    let locked = fixture.source().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    let unlistable = fs::read_dir(&locked).is_err();

    let summary = engine().run(&request(&fixture));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let summary = summary.unwrap();
    let copied = fixture.destination_files();
    assert!(copied.contains(&PathBuf::from("a.txt")));
    assert!(copied.contains(&PathBuf::from("z.txt")));

    // Permission bits do not bind the superuser
    if unlistable {
        assert_eq!(summary.files_copied, 2);
        assert_eq!(summary.skipped_permission, 1);
        assert_eq!(summary.permission_denied, vec![PathBuf::from("locked")]);
        assert_eq!(summary.failed, 0);
        assert!(!copied.contains(&PathBuf::from("locked").join("hidden.txt")));
    }
}

#[test]
fn test_insufficient_space_writes_nothing() {
    let fixture = SyncFixture::new();
    fixture.write_source("a.txt", 4096);
    fixture.write_source("dir/b.txt", 4096);

    let result = SyncEngine::new()
        .with_space_probe(FixedSpace(8191))
        .run(&request(&fixture));

    match result {
        Err(Error::InsufficientSpace {
            required,
            available,
            ..
        }) => {
            assert_eq!(required, 8192);
            assert_eq!(available, 8191);
        }
        other => panic!("expected insufficient space, got {:?}", other),
    }
    assert_eq!(fs::read_dir(fixture.destination()).unwrap().count(), 0);
}

#[test]
fn test_space_check_counts_only_pending_bytes() {
    let fixture = SyncFixture::new();
    fixture.write_source("big.bin", 10_000);
    engine().run(&request(&fixture)).unwrap();
    fixture.write_source("small.txt", 100);

    let summary = SyncEngine::new()
        .with_space_probe(FixedSpace(100))
        .run(&request(&fixture))
        .unwrap();

    assert_eq!(summary.files_copied, 1);
    assert_eq!(summary.required_bytes, 100);
}

#[test]
fn test_estimate_does_not_touch_destination() {
    let fixture = SyncFixture::new();
    fixture.write_source("a.txt", 300);
    fixture.write_source("dir/b.txt", 700);

    let estimate = engine().estimate(&request(&fixture), true).unwrap();

    assert_eq!(estimate.files_to_copy, 2);
    assert_eq!(estimate.required_bytes, 1000);
    assert_eq!(estimate.available_bytes, CommonFileSizes::GIGABYTE);
    assert!(estimate.fits());
    let listed: Vec<_> = estimate
        .entries
        .iter()
        .map(|entry| (entry.relative_path.clone(), entry.size))
        .collect();
    assert_eq!(
        listed,
        vec![
            (PathBuf::from("a.txt"), 300),
            (PathBuf::from("dir").join("b.txt"), 700),
        ]
    );
    assert_eq!(fs::read_dir(fixture.destination()).unwrap().count(), 0);
}

#[test]
fn test_estimate_reports_shortfall_without_failing() {
    let fixture = SyncFixture::new();
    fixture.write_source("a.txt", 500);

    let estimate = SyncEngine::new()
        .with_space_probe(FixedSpace(200))
        .estimate(&request(&fixture), false)
        .unwrap();

    assert!(!estimate.fits());
    assert_eq!(estimate.shortfall(), 300);
    assert!(estimate.entries.is_empty());
}

#[test]
fn test_missing_source_is_fatal() {
    let fixture = SyncFixture::new();
    let request = SyncRequest::new(fixture.source().join("absent"), fixture.destination());

    let error = engine().run(&request).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(error.is_fatal());
    assert!(matches!(
        error,
        Error::Validation {
            side: ValidationSide::Source,
            reason: ValidationReason::Missing,
            ..
        }
    ));
}

#[test]
fn test_destination_inside_source_is_rejected() {
    let fixture = SyncFixture::new();
    fixture.write_source("a.txt", 10);
    let nested = fixture.source().join("backup");
    fs::create_dir(&nested).unwrap();

    let error = engine()
        .run(&SyncRequest::new(fixture.source(), &nested))
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Validation {
            side: ValidationSide::Destination,
            reason: ValidationReason::Nested,
            ..
        }
    ));
    assert_eq!(fs::read_dir(&nested).unwrap().count(), 0);
}

#[test]
fn test_destination_file_is_rejected() {
    let fixture = SyncFixture::new();
    let not_a_dir = fixture.write_destination("file.txt", 1);

    let error = engine()
        .estimate(&SyncRequest::new(fixture.source(), &not_a_dir), false)
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Validation {
            side: ValidationSide::Destination,
            reason: ValidationReason::NotADirectory,
            ..
        }
    ));
}

#[test]
fn test_options_from_config_drive_the_run() {
    let fixture = SyncFixture::new();
    let source = fixture.write_source("fat.txt", 10);
    let destination = fixture.write_destination("fat.txt", 10);
    set_mtime_offset(&destination, 0);
    set_mtime_offset(&source, 1);

    let mut config = ferrosync_config::Config::default();
    config.sync.mtime_tolerance_ms = 2_000;
    let request = request(&fixture).with_options(SyncOptions::from_config(&config.sync));

    let summary = engine().run(&request).unwrap();
    assert_eq!(summary.skipped_unchanged, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn test_any_tree_is_idempotent(sizes in proptest::collection::vec(0usize..4096, 1..8)) {
        let fixture = SyncFixture::new();
        for (index, size) in sizes.iter().enumerate() {
            fixture.write_source(&format!("d{}/f{}.bin", index % 3, index), *size);
        }

        let first = engine().run(&request(&fixture)).unwrap();
        prop_assert_eq!(first.files_copied, sizes.len() as u64);
        prop_assert_eq!(first.bytes_copied, sizes.iter().sum::<usize>() as u64);

        let second = engine().run(&request(&fixture)).unwrap();
        prop_assert_eq!(second.files_copied, 0);
        prop_assert_eq!(second.skipped_unchanged, sizes.len() as u64);
    }
}
