use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::components::editor::{EditResult, EditorView};
use crate::components::header::{self, Focus};
use crate::components::{preview, status};
use crate::fs::watch::{FileChange, FileWatcher};
use crate::markdown;
use crate::settings::{SettingKey, SettingsStore};
use crate::store::{AutosavePolicy, FileStore, OpenOutcome, SaveOutcome, SaveStatus};
use crate::sync::{ScrollCommand, ScrollOrigin, ScrollSync};
use crate::theme::Palette;

use prompt::{PathPrompt, PromptKind};

/// How long status bar messages stay visible before auto-clearing.
const STATUS_DURATION: Duration = Duration::from_secs(3);

/// Lines to scroll per mouse wheel tick.
const SCROLL_LINES: u16 = 3;

/// Narrower terminals show one pane at a time.
pub const SPLIT_MIN_WIDTH: u16 = 80;

/// Document-replacing actions that wait for a second keypress when the
/// current edits cannot be saved first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingDiscard {
    Open,
    New,
    Quit,
}

impl PendingDiscard {
    fn key_label(self) -> &'static str {
        match self {
            PendingDiscard::Open => "Ctrl+O",
            PendingDiscard::New => "Ctrl+N",
            PendingDiscard::Quit => "Ctrl+Q",
        }
    }
}

pub struct App<'a> {
    // --- Core state ---
    pub focus: Focus,
    pub store: FileStore,
    pub settings: SettingsStore,
    pub editor: EditorView<'a>,
    pub preview: preview::PreviewState,
    pub should_quit: bool,

    // --- Scroll sync ---
    sync: ScrollSync,

    // --- External edits ---
    watcher: Option<FileWatcher>,

    // --- Status bar ---
    pub status_message: String,
    pub status_time: Option<Instant>,

    // --- Overlays ---
    pub show_help: bool,
    /// Selected row of the settings panel (F2) while it is open.
    pub settings_panel: Option<usize>,
    /// Path being typed for save-as or open when there is no dialog.
    path_prompt: Option<PathPrompt>,

    palette: Palette,
    pending_discard: Option<PendingDiscard>,

    // --- Layout from last render (mouse hit-testing, pane availability) ---
    split: bool,
    editor_area: Rect,
    preview_area: Rect,
}

impl<'a> App<'a> {
    pub fn new(store: FileStore, settings: SettingsStore) -> Self {
        let palette = Palette::for_theme(settings.settings().theme);
        let mut editor = EditorView::new(store.content(), palette, settings.settings().tab_size);
        editor.set_readonly(store.is_readonly());

        let mut app = Self {
            focus: Focus::Editor,
            store,
            settings,
            editor,
            preview: preview::PreviewState::new(),
            should_quit: false,
            sync: ScrollSync::new(),
            watcher: None,
            status_message: "F1: help | F2: settings | Tab: switch pane | Ctrl+Q: quit"
                .to_string(),
            status_time: Some(Instant::now()),
            show_help: false,
            settings_panel: None,
            path_prompt: None,
            palette,
            pending_discard: None,
            split: true,
            editor_area: Rect::default(),
            preview_area: Rect::default(),
        };
        app.apply_settings();
        app
    }

    /// Starts reporting external edits to the open file. Off by default so
    /// tests stay free of OS watchers.
    pub fn enable_file_watcher(&mut self) {
        match FileWatcher::new() {
            Ok(watcher) => {
                self.watcher = Some(watcher);
                self.watch_current();
            }
            Err(e) => tracing::warn!(error = %e, "file watcher unavailable"),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// True when the pane is drawn, so it can follow a scroll-sync command.
    pub fn pane_visible(&self, pane: Focus) -> bool {
        self.split || self.focus == pane
    }

    // ─── Tick / timers ───────────────────────────────────────────────────

    /// Called every 100ms from the main loop.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Runs every deadline check against `now`: autosave, external edits,
    /// scroll sync and status expiry.
    pub fn tick_at(&mut self, now: Instant) {
        self.poll_autosave(now);
        self.poll_watcher();
        self.sync_scroll(now);

        if let Some(time) = self.status_time {
            if now.saturating_duration_since(time) >= STATUS_DURATION {
                self.status_message.clear();
                self.status_time = None;
            }
        }
    }

    fn poll_autosave(&mut self, now: Instant) {
        match self.store.poll_autosave(now) {
            Some(Ok(SaveOutcome::Saved(_))) => self.acknowledge_own_write(),
            Some(Ok(SaveOutcome::Cancelled)) | None => {}
            Some(Err(e)) => self.set_status(&format!("Autosave failed: {e}")),
        }
    }

    fn poll_watcher(&mut self) {
        let Some(change) = self.watcher.as_mut().and_then(FileWatcher::poll) else {
            return;
        };
        match change {
            FileChange::Modified(path) => {
                tracing::info!(path = %path.display(), "file changed on disk");
                match self.store.reload_from_disk() {
                    Ok(true) => {
                        self.load_document();
                        self.set_status("Reloaded: file changed on disk");
                    }
                    Ok(false) => self.set_status("File changed on disk; keeping your edits"),
                    Err(e) => self.set_status(&format!("Reload failed: {e}")),
                }
            }
            FileChange::Removed(path) => {
                tracing::warn!(path = %path.display(), "open file removed from disk");
                self.set_status("File was removed from disk");
            }
        }
    }

    /// Feeds each pane's scroll report through the coordinator. Programmatic
    /// scrolls are reported like user ones; the editor is polled again last
    /// so the echo of a preview-driven scroll lands inside the lock window.
    fn sync_scroll(&mut self, now: Instant) {
        self.sync.tick(now);
        for origin in [ScrollOrigin::Editor, ScrollOrigin::Preview, ScrollOrigin::Editor] {
            self.report_scroll(origin, now);
        }
    }

    fn report_scroll(&mut self, origin: ScrollOrigin, now: Instant) {
        let (reported, target) = match origin {
            ScrollOrigin::Editor => (self.editor.poll_scroll(), Focus::Preview),
            ScrollOrigin::Preview => (self.preview.poll_scroll(), Focus::Editor),
        };
        let Some(percentage) = reported else {
            return;
        };
        let enabled = self.settings.settings().sync_scroll;
        let available = self.pane_visible(target);
        if let Some(cmd) = self.sync.on_scroll(origin, percentage, now, enabled, available) {
            self.apply_scroll(cmd);
        }
    }

    fn apply_scroll(&mut self, cmd: ScrollCommand) {
        match cmd.target {
            ScrollOrigin::Editor => self.editor.scroll_to_percentage(cmd.percentage),
            ScrollOrigin::Preview => self.preview.scroll_to_percentage(cmd.percentage),
        }
    }

    // ─── Event dispatch ──────────────────────────────────────────────────

    /// Top-level event handler. Dispatches to key, mouse, or paste handlers.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Paste(text) => self.handle_paste(text),
            _ => {}
        }
    }

    /// Shows a temporary message in the status bar.
    pub fn set_status(&mut self, msg: &str) {
        self.status_message = msg.to_string();
        self.status_time = Some(Instant::now());
    }

    // ─── Document plumbing ───────────────────────────────────────────────

    /// Pushes the editor buffer into the store after an edit.
    fn record_edit(&mut self, result: EditResult) {
        match result {
            EditResult::Changed => {
                self.store.update_content(self.editor.content(), Instant::now());
            }
            EditResult::Rejected => self.set_status("Document is read-only"),
            EditResult::Unchanged => {}
        }
    }

    /// Reloads the editor and preview from the store's document.
    fn load_document(&mut self) {
        self.editor.set_content(self.store.content());
        self.editor.set_readonly(self.store.is_readonly());
        self.preview.reset();
        self.watch_current();
    }

    fn watch_current(&mut self) {
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        match self.store.path() {
            Some(path) => {
                if let Err(e) = watcher.watch(path) {
                    tracing::warn!(path = %path.display(), error = %e, "cannot watch file");
                }
            }
            None => watcher.unwatch(),
        }
    }

    fn acknowledge_own_write(&mut self) {
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.acknowledge_write();
        }
    }

    /// Re-applies theme, tab size and autosave after a settings change.
    fn apply_settings(&mut self) {
        let s = self.settings.settings();
        self.palette = Palette::for_theme(s.theme);
        self.editor.apply_theme(self.palette);
        self.editor.set_tab_size(s.tab_size);
        self.store.set_autosave(AutosavePolicy {
            enabled: s.autosave_enabled,
            delay: Duration::from_millis(s.autosave_delay_ms),
        });
    }
}

mod commands;
mod input;
mod prompt;
mod render;
mod settings_panel;
