use std::path::{Path, PathBuf};

use super::{FileMetadata, FileSystem, FsError, Result};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "txt"];

/// Disk-backed file system with native open/save dialogs.
#[derive(Debug, Default, Clone)]
pub struct LocalFileSystem {
    /// Directory the dialogs start in.
    start_dir: Option<PathBuf>,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: Some(dir.into()),
        }
    }

    fn dialog(&self) -> rfd::FileDialog {
        let dialog = rfd::FileDialog::new().add_filter("Markdown", MARKDOWN_EXTENSIONS);
        match self.start_dir {
            Some(ref dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }
}

impl FileSystem for LocalFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| FsError::from_io(path, e))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content).map_err(|e| FsError::from_io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = std::fs::metadata(path).map_err(|e| FsError::from_io(path, e))?;
        Ok(FileMetadata::from_std(path, &meta))
    }

    fn show_open_dialog(&self) -> Option<PathBuf> {
        self.dialog().pick_file()
    }

    fn show_save_dialog(&self, suggested_name: &str) -> Option<PathBuf> {
        self.dialog().set_file_name(suggested_name).save_file()
    }

    fn dialogs_available(&self) -> bool {
        if cfg!(any(windows, target_os = "macos")) {
            // Remote sessions have no desktop to show a dialog on.
            std::env::var_os("SSH_CONNECTION").is_none()
        } else {
            std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
        }
    }

    fn base_dir(&self) -> Option<PathBuf> {
        self.start_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
    }
}
