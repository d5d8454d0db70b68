//! File system service consumed by the file store.
//!
//! [`FileSystem`] is the seam between document state and the host: reads,
//! writes, metadata and the open/save dialogs. [`LocalFileSystem`] is the
//! production backend; [`MemoryFileSystem`] keeps everything in memory and
//! records writes.

mod local;
mod memory;
pub mod watch;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

pub type Result<T> = std::result::Result<T, FsError>;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Classifies an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.to_path_buf()),
            _ => FsError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub readonly: bool,
}

impl FileMetadata {
    pub fn from_std(path: &Path, meta: &std::fs::Metadata) -> Self {
        Self {
            name: file_name(path),
            size: meta.len(),
            modified: meta.modified().ok(),
            readonly: meta.permissions().readonly(),
        }
    }
}

pub trait FileSystem {
    fn read_file(&self, path: &Path) -> Result<String>;

    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Asks the user for a file to open. `None` means the dialog was cancelled.
    fn show_open_dialog(&self) -> Option<PathBuf>;

    /// Asks the user where to save. `None` means the dialog was cancelled.
    fn show_save_dialog(&self, suggested_name: &str) -> Option<PathBuf>;

    /// Whether the dialogs above can appear at all. When they cannot, the
    /// caller asks for a path itself.
    fn dialogs_available(&self) -> bool {
        true
    }

    /// Directory that relative paths typed by the user are resolved against.
    fn base_dir(&self) -> Option<PathBuf> {
        None
    }
}

/// Final path component as a display string, or empty when there is none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
