//! Document commands: save, save as, open, new, export and quit.

use std::path::PathBuf;

use super::*;

impl<'a> App<'a> {
    pub(super) fn save(&mut self) {
        if self.store.path().is_none() && !self.store.dialogs_available() {
            self.start_prompt(PromptKind::SaveAs);
            return;
        }
        let before = self.store.path().map(Path::to_path_buf);
        let result = self.store.save_file(None);
        self.finish_save(before, result);
    }

    pub(super) fn save_as(&mut self) {
        if !self.store.dialogs_available() {
            self.start_prompt(PromptKind::SaveAs);
            return;
        }
        let before = self.store.path().map(Path::to_path_buf);
        let result = self.store.save_file_as();
        self.finish_save(before, result);
    }

    pub(super) fn finish_save(
        &mut self,
        before: Option<PathBuf>,
        result: Result<SaveOutcome, crate::fs::FsError>,
    ) {
        match result {
            Ok(SaveOutcome::Saved(path)) => {
                if before.as_deref() != Some(path.as_path()) {
                    self.watch_current();
                }
                self.acknowledge_own_write();
                self.set_status(&format!("Saved {}", crate::fs::file_name(&path)));
            }
            Ok(SaveOutcome::Cancelled) => self.set_status("Save cancelled"),
            Err(e) => self.set_status(&format!("Error saving: {e}")),
        }
    }

    pub(super) fn open(&mut self, confirmed: bool) {
        if !self.settle_unsaved(PendingDiscard::Open, confirmed) {
            return;
        }
        if !self.store.dialogs_available() {
            self.start_prompt(PromptKind::Open);
            return;
        }
        match self.store.open_with_dialog() {
            Ok(OpenOutcome::Opened(path)) => {
                self.load_document();
                self.set_status(&format!("Opened {}", crate::fs::file_name(&path)));
            }
            Ok(OpenOutcome::Cancelled) => {}
            Err(e) => self.set_status(&format!("Error opening: {e}")),
        }
    }

    pub(super) fn new_document(&mut self, confirmed: bool) {
        if !self.settle_unsaved(PendingDiscard::New, confirmed) {
            return;
        }
        self.store.create_new_file();
        self.load_document();
        self.set_status("New document");
    }

    /// Writes `<stem>.html` next to the document.
    pub(super) fn export_html(&mut self) {
        let Some(source) = self.store.path().map(Path::to_path_buf) else {
            self.set_status("Save the document before exporting");
            return;
        };
        let target = markdown::html::export_path(&source);
        let title = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let html = markdown::render_document(&title, self.store.content());
        match self.store.file_system().write_file(&target, &html) {
            Ok(()) => {
                tracing::info!(path = %target.display(), "exported html");
                self.set_status(&format!("Exported {}", crate::fs::file_name(&target)));
            }
            Err(e) => {
                tracing::error!(path = %target.display(), error = %e, "html export failed");
                self.set_status(&format!("Export failed: {e}"));
            }
        }
    }

    /// Quits, saving first when the document has somewhere to go.
    pub(super) fn quit(&mut self, confirmed: bool) {
        if self.settle_unsaved(PendingDiscard::Quit, confirmed) {
            self.should_quit = true;
        }
    }

    /// Gets unsaved edits out of the way before the document is replaced.
    /// Saves when a path exists; otherwise, or when that save fails, the same
    /// key must be pressed again to discard. Returns true when the caller may
    /// proceed.
    fn settle_unsaved(&mut self, action: PendingDiscard, confirmed: bool) -> bool {
        if !self.store.has_unsaved_changes() || confirmed {
            return true;
        }
        if self.store.path().is_some() {
            self.save();
            if !self.store.has_unsaved_changes() {
                return true;
            }
        }
        self.pending_discard = Some(action);
        let prompt = format!("press {} again to discard", action.key_label());
        let message = match self.store.error_message() {
            Some(err) if self.store.status() == SaveStatus::Error => format!("{err}; {prompt}"),
            _ => format!("Unsaved changes: {prompt}"),
        };
        self.set_status(&message);
        false
    }
}
