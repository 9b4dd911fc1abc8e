//! Source-tree traversal for archive creation.
//!
//! Entries are yielded in directory-tree order with their archive paths
//! computed relative to the *parent* of the source directory, so the archive
//! extracts under the source directory's own base name.

use crate::BackupError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Kind of filesystem node encountered during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with streamable content.
    File,

    /// Directory.
    Directory,

    /// Symbolic link with its recorded target.
    Symlink {
        /// Target path exactly as stored in the link; it is not required to
        /// resolve.
        target: PathBuf,
    },

    /// Any other node type (fifo, socket, device); archived header-only.
    Other,
}

/// One filesystem node ready to be appended to the archive.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Full filesystem path of the node.
    pub path: PathBuf,

    /// Path recorded in the archive, relative to the parent of the source
    /// directory.
    pub archive_path: PathBuf,

    /// Node classification.
    pub kind: EntryKind,

    /// Size in bytes for regular files, 0 otherwise.
    pub size: u64,
}

/// Walks a source directory in tree order, yielding archive-ready entries.
///
/// Symlinks are never followed; they are described as links with their
/// targets captured verbatim.
///
/// # Examples
///
/// ```no_run
/// use offsite_core::archive::SourceWalker;
/// use std::path::Path;
///
/// let walker = SourceWalker::new(Path::new("/var/www"));
/// for entry in walker.walk() {
///     let entry = entry?;
///     println!("{}", entry.archive_path.display());
/// }
/// # Ok::<(), offsite_core::BackupError>(())
/// ```
pub struct SourceWalker {
    root: PathBuf,
    base: PathBuf,
}

impl SourceWalker {
    /// Creates a walker over `source_dir`.
    ///
    /// The path is normalized first (trailing separators and `.` components
    /// removed) so the relative paths inside the archive stay stable.
    #[must_use]
    pub fn new(source_dir: &Path) -> Self {
        let root: PathBuf = source_dir.components().collect();
        let base = root
            .parent()
            .map_or_else(|| root.clone(), Path::to_path_buf);
        Self { root, base }
    }

    /// Returns an iterator over the tree in traversal order, root first.
    pub fn walk(&self) -> impl Iterator<Item = Result<SourceEntry>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .map(move |entry| match entry {
                Ok(entry) => self.build_entry(&entry),
                Err(e) => Err(BackupError::Io(std::io::Error::other(format!(
                    "walking source tree: {e}"
                )))),
            })
    }

    fn build_entry(&self, entry: &walkdir::DirEntry) -> Result<SourceEntry> {
        let path = entry.path().to_path_buf();
        let metadata = entry.metadata().map_err(|e| {
            BackupError::Io(std::io::Error::other(format!(
                "cannot read metadata for {}: {e}",
                path.display()
            )))
        })?;

        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            let target = std::fs::read_link(&path).map_err(|e| {
                BackupError::Io(std::io::Error::other(format!(
                    "cannot read symlink target for {}: {e}",
                    path.display()
                )))
            })?;
            EntryKind::Symlink { target }
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        let archive_path = path
            .strip_prefix(&self.base)
            .map(Path::to_path_buf)
            .map_err(|e| {
                BackupError::Io(std::io::Error::other(format!(
                    "computing relative path for {}: {e}",
                    path.display()
                )))
            })?;

        let size = if kind == EntryKind::File {
            metadata.len()
        } else {
            0
        };

        Ok(SourceEntry {
            path,
            archive_path,
            kind,
            size,
        })
    }
}
