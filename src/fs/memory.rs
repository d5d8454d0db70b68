use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use super::{file_name, FileMetadata, FileSystem, FsError, Result};

#[derive(Debug, Clone)]
struct MemFile {
    content: String,
    readonly: bool,
    modified: SystemTime,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<PathBuf, MemFile>,
    writes: Vec<(PathBuf, String)>,
    open_answers: VecDeque<Option<PathBuf>>,
    save_answers: VecDeque<Option<PathBuf>>,
    save_prompts: Vec<String>,
    failing_writes: bool,
    /// Set for sessions without a desktop; holds the working directory.
    headless_dir: Option<PathBuf>,
}

/// In-memory file system. Clones share state, so a handle kept outside the
/// file store can inspect the write log after the store took ownership.
///
/// Dialogs answer from queues filled with [`MemoryFileSystem::answer_open`]
/// and [`MemoryFileSystem::answer_save`]; an empty queue acts as "cancelled".
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: &str) {
        self.inner.borrow_mut().files.insert(
            path.into(),
            MemFile {
                content: content.to_string(),
                readonly: false,
                modified: SystemTime::now(),
            },
        );
    }

    pub fn set_readonly(&self, path: &Path, readonly: bool) {
        if let Some(file) = self.inner.borrow_mut().files.get_mut(path) {
            file.readonly = readonly;
        }
    }

    /// Makes every subsequent write fail with an I/O error (disk full).
    pub fn fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().failing_writes = fail;
    }

    /// Acts like a terminal-only session: no dialogs, and relative paths
    /// resolve against `dir`.
    pub fn make_headless(&self, dir: impl Into<PathBuf>) {
        self.inner.borrow_mut().headless_dir = Some(dir.into());
    }

    pub fn answer_open(&self, answer: Option<PathBuf>) {
        self.inner.borrow_mut().open_answers.push_back(answer);
    }

    pub fn answer_save(&self, answer: Option<PathBuf>) {
        self.inner.borrow_mut().save_answers.push_back(answer);
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.inner.borrow().writes.clone()
    }

    /// Suggested names passed to the save dialog, in order.
    pub fn save_prompts(&self) -> Vec<String> {
        self.inner.borrow().save_prompts.clone()
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.inner.borrow().files.get(path).map(|f| f.content.clone())
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        self.inner
            .borrow()
            .files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing_writes {
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, "no space left on device"),
            });
        }
        if inner.files.get(path).is_some_and(|f| f.readonly) {
            return Err(FsError::PermissionDenied(path.to_path_buf()));
        }
        inner.files.insert(
            path.to_path_buf(),
            MemFile {
                content: content.to_string(),
                readonly: false,
                modified: SystemTime::now(),
            },
        );
        inner.writes.push((path.to_path_buf(), content.to_string()));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.borrow().files.contains_key(path)
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let inner = self.inner.borrow();
        let file = inner
            .files
            .get(path)
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))?;
        Ok(FileMetadata {
            name: file_name(path),
            size: file.content.len() as u64,
            modified: Some(file.modified),
            readonly: file.readonly,
        })
    }

    fn show_open_dialog(&self) -> Option<PathBuf> {
        self.inner.borrow_mut().open_answers.pop_front().flatten()
    }

    fn show_save_dialog(&self, suggested_name: &str) -> Option<PathBuf> {
        let mut inner = self.inner.borrow_mut();
        inner.save_prompts.push(suggested_name.to_string());
        inner.save_answers.pop_front().flatten()
    }

    fn dialogs_available(&self) -> bool {
        self.inner.borrow().headless_dir.is_none()
    }

    fn base_dir(&self) -> Option<PathBuf> {
        self.inner.borrow().headless_dir.clone()
    }
}
