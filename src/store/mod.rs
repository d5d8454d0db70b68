//! The file store: single source of truth for the open document.
//!
//! Tracks the document's text against the last persisted text, derives the
//! [`SaveStatus`] from that comparison, and owns the debounced autosave.
//! I/O failures are captured here as an `Error` status plus a readable
//! message; nothing is retried automatically.

mod debounce;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::fs::{file_name, FileMetadata, FileSystem, FsError};

pub use debounce::Debouncer;

/// Name offered in the save dialog for a document that has never been saved.
pub const UNTITLED_NAME: &str = "Untitled.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Unsaved,
    Saving,
    Error,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Saved => "Saved",
            SaveStatus::Unsaved => "Unsaved",
            SaveStatus::Saving => "Saving\u{2026}",
            SaveStatus::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// `None` for an untitled document.
    pub path: Option<PathBuf>,
    pub content: String,
    /// Text as last read from or written to disk.
    pub original_content: String,
    pub metadata: Option<FileMetadata>,
}

impl Document {
    pub fn is_dirty(&self) -> bool {
        self.content != self.original_content
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// The save dialog was dismissed; nothing was written.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened(PathBuf),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosavePolicy {
    pub enabled: bool,
    pub delay: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_millis(1000),
        }
    }
}

pub struct FileStore {
    fs: Box<dyn FileSystem>,
    doc: Document,
    status: SaveStatus,
    error_message: Option<String>,
    last_saved_at: Option<SystemTime>,
    autosave: AutosavePolicy,
    debounce: Debouncer,
}

impl FileStore {
    /// Starts with an empty untitled document.
    pub fn new(fs: Box<dyn FileSystem>) -> Self {
        Self {
            fs,
            doc: Document::default(),
            status: SaveStatus::Saved,
            error_message: None,
            last_saved_at: None,
            autosave: AutosavePolicy::default(),
            debounce: Debouncer::new(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn content(&self) -> &str {
        &self.doc.content
    }

    pub fn path(&self) -> Option<&Path> {
        self.doc.path.as_deref()
    }

    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.doc.metadata.as_ref()
    }

    pub fn is_readonly(&self) -> bool {
        self.doc.metadata.as_ref().is_some_and(|m| m.readonly)
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.doc.is_dirty()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn last_saved_at(&self) -> Option<SystemTime> {
        self.last_saved_at
    }

    pub fn autosave_pending(&self) -> bool {
        self.debounce.is_armed()
    }

    /// File name for display, or "Untitled".
    pub fn display_name(&self) -> String {
        match self.doc.path {
            Some(ref p) => file_name(p),
            None => "Untitled".to_string(),
        }
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn dialogs_available(&self) -> bool {
        self.fs.dialogs_available()
    }

    /// Where a save without a dialog should go by default: the document's own
    /// path, or `Untitled.md` in the base directory.
    pub fn suggested_save_path(&self) -> PathBuf {
        match self.doc.path {
            Some(ref p) => p.clone(),
            None => self.resolve_path(UNTITLED_NAME),
        }
    }

    /// Turns a typed path into one the file system can use: a leading `~/`
    /// is the home directory and relative paths join the base directory.
    pub fn resolve_path(&self, input: &str) -> PathBuf {
        let input = input.trim();
        let path = match input.strip_prefix("~/") {
            Some(rest) => match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(rest),
                None => PathBuf::from(input),
            },
            None => PathBuf::from(input),
        };
        match self.fs.base_dir() {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }

    // ─── Autosave ────────────────────────────────────────────────────────

    /// Applies new autosave settings. Disabling drops any pending save; a new
    /// delay applies from the next edit.
    pub fn set_autosave(&mut self, policy: AutosavePolicy) {
        self.autosave = policy;
        if !policy.enabled {
            self.debounce.cancel();
        }
    }

    pub fn autosave(&self) -> AutosavePolicy {
        self.autosave
    }

    /// Writes the document if the autosave deadline has passed. Returns the
    /// result when a write was attempted.
    pub fn poll_autosave(&mut self, now: Instant) -> Option<Result<SaveOutcome, FsError>> {
        if !self.debounce.fire_if_due(now) {
            return None;
        }
        let path = self.doc.path.clone()?;
        if !self.doc.is_dirty() {
            return None;
        }
        tracing::debug!(path = %path.display(), "autosave fired");
        Some(self.write_to(&path))
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Replaces the document text. Re-arms the autosave when the result is
    /// dirty and has somewhere to go.
    pub fn update_content(&mut self, text: String, now: Instant) {
        if text == self.doc.content {
            return;
        }
        self.doc.content = text;

        if self.doc.is_dirty() {
            if self.status != SaveStatus::Saving {
                self.status = SaveStatus::Unsaved;
            }
            if self.autosave.enabled && self.doc.path.is_some() {
                self.debounce.arm(now, self.autosave.delay);
            }
        } else {
            self.status = SaveStatus::Saved;
            self.debounce.cancel();
        }
    }

    /// Loads `path`. On failure the current document is left untouched.
    pub fn open_file(&mut self, path: &Path) -> Result<(), FsError> {
        let loaded = self
            .fs
            .read_file(path)
            .and_then(|text| Ok((text, self.fs.metadata(path)?)));
        match loaded {
            Ok((text, metadata)) => {
                if self.doc.is_dirty() {
                    tracing::warn!(
                        previous = %self.display_name(),
                        "discarding unsaved changes on open"
                    );
                }
                self.doc = Document {
                    path: Some(path.to_path_buf()),
                    original_content: text.clone(),
                    content: text,
                    metadata: Some(metadata),
                };
                self.status = SaveStatus::Saved;
                self.error_message = None;
                self.last_saved_at = None;
                self.debounce.cancel();
                tracing::info!(path = %path.display(), "opened file");
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "open failed");
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Asks for a file via the open dialog, then opens it.
    pub fn open_with_dialog(&mut self) -> Result<OpenOutcome, FsError> {
        match self.fs.show_open_dialog() {
            Some(path) => {
                self.open_file(&path)?;
                Ok(OpenOutcome::Opened(path))
            }
            None => Ok(OpenOutcome::Cancelled),
        }
    }

    /// Saves to `target`, else to the document's own path, else via the
    /// save dialog.
    pub fn save_file(&mut self, target: Option<&Path>) -> Result<SaveOutcome, FsError> {
        let path = match target.map(Path::to_path_buf).or_else(|| self.doc.path.clone()) {
            Some(p) => p,
            None => return self.save_file_as(),
        };
        self.write_to(&path)
    }

    /// Prompts for a destination. Cancelling leaves everything as it was.
    pub fn save_file_as(&mut self) -> Result<SaveOutcome, FsError> {
        let suggested = match self.doc.path {
            Some(ref p) => file_name(p),
            None => UNTITLED_NAME.to_string(),
        };
        match self.fs.show_save_dialog(&suggested) {
            Some(path) => self.write_to(&path),
            None => {
                tracing::debug!("save dialog cancelled");
                Ok(SaveOutcome::Cancelled)
            }
        }
    }

    /// Resets to an empty untitled document. Unsaved content is discarded.
    pub fn create_new_file(&mut self) {
        if self.doc.is_dirty() {
            tracing::warn!(previous = %self.display_name(), "discarding unsaved changes");
        }
        self.doc = Document::default();
        self.status = SaveStatus::Saved;
        self.error_message = None;
        self.last_saved_at = None;
        self.debounce.cancel();
    }

    /// Starts a new document backed by a fresh `Untitled*.md` file in `dir`.
    /// The empty file is written right away so autosave has a target.
    pub fn create_new_file_in(&mut self, dir: &Path) -> Result<PathBuf, FsError> {
        self.create_new_file();
        let path = self.unique_untitled_path(dir);
        match self.fs.write_file(&path, "") {
            Ok(()) => {
                self.doc.path = Some(path.clone());
                self.doc.metadata = self.fs.metadata(&path).ok();
                tracing::info!(path = %path.display(), "created new document");
                Ok(path)
            }
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "could not create new document");
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Re-reads the file after an external change. Returns `false` without
    /// touching anything when the document has unsaved edits.
    pub fn reload_from_disk(&mut self) -> Result<bool, FsError> {
        let Some(path) = self.doc.path.clone() else {
            return Ok(false);
        };
        if self.doc.is_dirty() {
            tracing::info!(path = %path.display(), "external change ignored, document is dirty");
            return Ok(false);
        }
        self.open_file(&path)?;
        Ok(true)
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn write_to(&mut self, path: &Path) -> Result<SaveOutcome, FsError> {
        self.status = SaveStatus::Saving;
        // Whatever was pending is covered by this write.
        self.debounce.cancel();

        match self.fs.write_file(path, &self.doc.content) {
            Ok(()) => {
                self.doc.original_content = self.doc.content.clone();
                self.doc.path = Some(path.to_path_buf());
                self.doc.metadata = self.fs.metadata(path).ok();
                self.last_saved_at = Some(SystemTime::now());
                self.status = SaveStatus::Saved;
                self.error_message = None;
                tracing::info!(path = %path.display(), bytes = self.doc.content.len(), "saved");
                Ok(SaveOutcome::Saved(path.to_path_buf()))
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "save failed");
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn fail(&mut self, err: &FsError) {
        self.status = SaveStatus::Error;
        self.error_message = Some(err.to_string());
    }

    fn unique_untitled_path(&self, dir: &Path) -> PathBuf {
        let first = dir.join(UNTITLED_NAME);
        if !self.fs.exists(&first) {
            return first;
        }
        (2..)
            .map(|n| dir.join(format!("Untitled {n}.md")))
            .find(|p| !self.fs.exists(p))
            .unwrap_or(first)
    }
}

#[cfg(test)]
mod tests;
