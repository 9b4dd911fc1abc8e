//! Integration tests for offsite-core.
//!
//! These tests verify end-to-end archive workflows with real filesystem
//! operations, including extraction with the standard tar/gzip readers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use flate2::read::GzDecoder;
use offsite_core::archive::ArchiveRequest;
use offsite_core::archive::archive_file_name;
use offsite_core::archive::build_archive;
use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn request(source: &Path, dest: &Path, prefix: &str) -> ArchiveRequest {
    ArchiveRequest {
        source_dir: source.to_path_buf(),
        dest_dir: dest.to_path_buf(),
        name_prefix: prefix.to_string(),
    }
}

/// Builds the nightly fixture: `a.txt` (3 bytes), `sub/b.txt` (0 bytes),
/// and symlink `link -> a.txt`.
fn nightly_fixture(root: &Path) -> PathBuf {
    let source = root.join("nightly-data");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("a.txt"), "abc").unwrap();
    fs::create_dir(source.join("sub")).unwrap();
    fs::write(source.join("sub/b.txt"), "").unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink("a.txt", source.join("link")).unwrap();
    source
}

#[test]
fn test_naming_matches_documented_pattern() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    assert_eq!(archive_file_name("nightly", date), "nightly_20240305.tar.gz");
}

#[cfg(unix)]
#[test]
fn test_nightly_scenario_entry_inventory() {
    let temp = TempDir::new().unwrap();
    let source = nightly_fixture(temp.path());
    let dest = TempDir::new().unwrap();

    let outcome = build_archive(&request(&source, dest.path(), "nightly")).unwrap();

    // Root dir + sub dir + two files + one symlink.
    assert_eq!(outcome.report.directories_added, 2);
    assert_eq!(outcome.report.files_added, 2);
    assert_eq!(outcome.report.symlinks_added, 1);
    assert_eq!(outcome.report.bytes_read, 3);

    let file = File::open(&outcome.archive_path).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut paths = Vec::new();
    for entry in archive.entries().unwrap() {
        let entry = entry.unwrap();
        paths.push(entry.path().unwrap().to_path_buf());
    }
    paths.sort();

    assert_eq!(
        paths,
        vec![
            PathBuf::from("nightly-data"),
            PathBuf::from("nightly-data/a.txt"),
            PathBuf::from("nightly-data/link"),
            PathBuf::from("nightly-data/sub"),
            PathBuf::from("nightly-data/sub/b.txt"),
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_round_trip_reproduces_content_and_symlink() {
    let temp = TempDir::new().unwrap();
    let source = nightly_fixture(temp.path());
    let dest = TempDir::new().unwrap();

    let outcome = build_archive(&request(&source, dest.path(), "nightly")).unwrap();

    let extract = TempDir::new().unwrap();
    let file = File::open(&outcome.archive_path).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(extract.path()).unwrap();

    // The top-level entry is the source directory's own base name.
    let top = extract.path().join("nightly-data");
    assert!(top.is_dir());

    assert_eq!(fs::read_to_string(top.join("a.txt")).unwrap(), "abc");
    assert_eq!(fs::read(top.join("sub/b.txt")).unwrap(), Vec::<u8>::new());

    let link = top.join("link");
    let link_meta = fs::symlink_metadata(&link).unwrap();
    assert!(link_meta.file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("a.txt"));
    // The link resolves next to its target after extraction.
    assert_eq!(fs::read_to_string(&link).unwrap(), "abc");
}

#[cfg(unix)]
#[test]
fn test_round_trip_preserves_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let source = temp.path().join("data");
    fs::create_dir(&source).unwrap();
    let script = source.join("run.sh");
    fs::write(&script, "#!/bin/sh\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let dest = TempDir::new().unwrap();

    let outcome = build_archive(&request(&source, dest.path(), "modes")).unwrap();

    let extract = TempDir::new().unwrap();
    let file = File::open(&outcome.archive_path).unwrap();
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.unpack(extract.path()).unwrap();

    let mode = fs::metadata(extract.path().join("data/run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn test_archive_size_matches_report() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("data");
    fs::create_dir(&source).unwrap();
    fs::write(source.join("payload.bin"), vec![0x5au8; 128 * 1024]).unwrap();
    let dest = TempDir::new().unwrap();

    let outcome = build_archive(&request(&source, dest.path(), "sized")).unwrap();

    let on_disk = fs::metadata(&outcome.archive_path).unwrap().len();
    assert_eq!(outcome.report.bytes_compressed, on_disk);
    assert_eq!(outcome.report.bytes_read, 128 * 1024);
    // Constant payload compresses well.
    assert!(outcome.report.compression_ratio() > 1.0);
}

#[test]
fn test_failed_build_leaves_destination_empty() {
    let dest = TempDir::new().unwrap();
    let result = build_archive(&request(
        Path::new("/nonexistent/source/tree"),
        dest.path(),
        "gone",
    ));
    assert!(result.is_err());
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
}
