//! Streaming tar+gzip archive creation.
//!
//! An archive build is atomic from the caller's perspective: either a
//! complete, finalized, durable archive exists at the returned path, or no
//! file exists at all. The writer stack is `File` → gzip encoder → tar
//! builder, closed innermost-first on the success path so both format
//! trailers are flushed before the file is synced to storage.

pub mod report;
pub mod walker;

pub use report::ArchiveReport;
pub use walker::EntryKind;
pub use walker::SourceEntry;
pub use walker::SourceWalker;

use crate::BackupError;
use crate::Result;
use chrono::NaiveDate;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use tar::Builder;
use tar::EntryType;
use tar::Header;

/// Parameters for one archive build.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    /// Directory tree to archive. Must exist at request time.
    pub source_dir: PathBuf,

    /// Directory the archive file is written into. Assumed writable.
    pub dest_dir: PathBuf,

    /// Archive filename prefix; must be filesystem-safe.
    pub name_prefix: String,
}

/// Successful archive build.
#[derive(Debug)]
pub struct ArchiveOutcome {
    /// Full path of the finished archive.
    pub archive_path: PathBuf,

    /// Build statistics.
    pub report: ArchiveReport,
}

/// Deterministic archive filename for a prefix and calendar date.
///
/// Two builds with the same prefix on the same day produce the same name;
/// the second build overwrites the first.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use offsite_core::archive::archive_file_name;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(archive_file_name("nightly", date), "nightly_20240305.tar.gz");
/// ```
#[must_use]
pub fn archive_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.tar.gz", date.format("%Y%m%d"))
}

/// Builds a gzip-compressed tar archive of the requested source tree.
///
/// The filename is derived from the prefix and the local calendar date. On
/// any failure the partially written file is removed before the error is
/// returned.
///
/// # Errors
///
/// Returns [`BackupError::SourceMissing`] when the source directory does not
/// exist, and [`BackupError::Io`] for traversal, write, or finalization
/// failures.
pub fn build_archive(request: &ArchiveRequest) -> Result<ArchiveOutcome> {
    if !request.source_dir.exists() {
        return Err(BackupError::SourceMissing {
            path: request.source_dir.clone(),
        });
    }

    let name = archive_file_name(&request.name_prefix, chrono::Local::now().date_naive());
    let archive_path = request.dest_dir.join(name);

    let file = File::create(&archive_path)?;
    // From here on the file exists; every failure must remove it again.
    match write_archive(file, &request.source_dir) {
        Ok(report) => {
            tracing::info!(
                path = %archive_path.display(),
                entries = report.total_entries(),
                bytes = report.bytes_compressed,
                "archive created"
            );
            Ok(ArchiveOutcome {
                archive_path,
                report,
            })
        }
        Err(e) => {
            let _ = std::fs::remove_file(&archive_path);
            Err(e)
        }
    }
}

/// Streams the source tree into `file` and makes the result durable.
fn write_archive(file: File, source_dir: &Path) -> Result<ArchiveReport> {
    let start = std::time::Instant::now();
    let mut report = ArchiveReport::new();

    let encoder = GzEncoder::new(CountingWriter::new(file), Compression::default());
    let mut builder = Builder::new(encoder);

    append_tree(&mut builder, source_dir, &mut report)?;

    // Close order matters: tar trailer, then gzip trailer, then fsync.
    let encoder = builder.into_inner()?;
    let counting = encoder.finish()?;
    report.bytes_compressed = counting.total_bytes();
    let file = counting.into_inner();
    file.sync_all()?;

    report.duration = start.elapsed();
    Ok(report)
}

/// Walks the source tree and appends every entry to the archive.
fn append_tree<W: Write>(
    builder: &mut Builder<W>,
    source_dir: &Path,
    report: &mut ArchiveReport,
) -> Result<()> {
    let walker = SourceWalker::new(source_dir);
    for entry in walker.walk() {
        let entry = entry?;
        match &entry.kind {
            EntryKind::File => append_file(builder, &entry, report)?,
            EntryKind::Directory => append_directory(builder, &entry, report)?,
            EntryKind::Symlink { target } => append_symlink(builder, &entry, target, report)?,
            EntryKind::Other => append_special(builder, &entry, report)?,
        }
    }
    Ok(())
}

/// Appends a regular file: header followed by its full content.
fn append_file<W: Write>(
    builder: &mut Builder<W>,
    entry: &SourceEntry,
    report: &mut ArchiveReport,
) -> Result<()> {
    let mut file = File::open(&entry.path)?;
    let metadata = file.metadata()?;

    let mut header = Header::new_gnu();
    header.set_size(metadata.len());
    set_header_metadata(&mut header, &metadata);
    header.set_cksum();

    builder.append_data(&mut header, &entry.archive_path, &mut file)?;

    report.files_added += 1;
    report.bytes_read += metadata.len();
    Ok(())
}

/// Appends a directory entry; directories carry no body.
fn append_directory<W: Write>(
    builder: &mut Builder<W>,
    entry: &SourceEntry,
    report: &mut ArchiveReport,
) -> Result<()> {
    let metadata = std::fs::metadata(&entry.path)?;

    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_size(0);
    set_header_metadata(&mut header, &metadata);
    header.set_cksum();

    builder.append_data(&mut header, &entry.archive_path, std::io::empty())?;

    report.directories_added += 1;
    Ok(())
}

/// Appends a symlink with its target recorded verbatim; the target is not
/// validated.
fn append_symlink<W: Write>(
    builder: &mut Builder<W>,
    entry: &SourceEntry,
    target: &Path,
    report: &mut ArchiveReport,
) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Symlink);
    header.set_size(0);
    header.set_cksum();

    builder.append_link(&mut header, &entry.archive_path, target)?;

    report.symlinks_added += 1;
    Ok(())
}

/// Appends any other node type (fifo, socket, device) header-only.
fn append_special<W: Write>(
    builder: &mut Builder<W>,
    entry: &SourceEntry,
    report: &mut ArchiveReport,
) -> Result<()> {
    let metadata = std::fs::symlink_metadata(&entry.path)?;

    let mut header = Header::new_gnu();
    header.set_entry_type(special_entry_type(&metadata.file_type()));
    header.set_size(0);
    set_header_metadata(&mut header, &metadata);
    header.set_cksum();

    builder.append_data(&mut header, &entry.archive_path, std::io::empty())?;

    report.specials_added += 1;
    Ok(())
}

#[cfg(unix)]
fn special_entry_type(file_type: &std::fs::FileType) -> EntryType {
    use std::os::unix::fs::FileTypeExt;
    if file_type.is_char_device() {
        EntryType::Char
    } else if file_type.is_block_device() {
        EntryType::Block
    } else {
        EntryType::Fifo
    }
}

#[cfg(not(unix))]
fn special_entry_type(_file_type: &std::fs::FileType) -> EntryType {
    EntryType::Fifo
}

/// Copies mode, ownership, and modification time into the tar header.
#[cfg(unix)]
fn set_header_metadata(header: &mut Header, metadata: &std::fs::Metadata) {
    use std::os::unix::fs::MetadataExt;
    header.set_mode(metadata.mode());
    header.set_uid(u64::from(metadata.uid()));
    header.set_gid(u64::from(metadata.gid()));
    // mtime can predate the epoch, clamp to 0
    #[allow(clippy::cast_sign_loss)]
    let mtime = metadata.mtime().max(0) as u64;
    header.set_mtime(mtime);
}

#[cfg(not(unix))]
fn set_header_metadata(header: &mut Header, metadata: &std::fs::Metadata) {
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    header.set_mode(mode);

    if let Ok(modified) = metadata.modified() {
        if let Ok(duration) = modified.duration_since(std::time::UNIX_EPOCH) {
            header.set_mtime(duration.as_secs());
        }
    }
}

/// Wrapper writer that tracks bytes written to the underlying file.
struct CountingWriter<W> {
    inner: W,
    bytes_written: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    fn total_bytes(&self) -> u64 {
        self.bytes_written
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.bytes_written += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
