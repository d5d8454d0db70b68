//! Input handling: global keybindings, per-pane keys, mouse wheel and paste.

use super::*;

impl<'a> App<'a> {
    /// Bracketed paste goes straight into the editor buffer.
    pub(super) fn handle_paste(&mut self, text: String) {
        if self.path_prompt.is_some() {
            self.paste_into_prompt(&text);
            return;
        }
        if self.show_help || self.settings_panel.is_some() || self.focus != Focus::Editor {
            return;
        }
        let result = self.editor.insert_str(&text);
        self.record_edit(result);
    }

    // ─── Key handling ────────────────────────────────────────────────────

    /// Main key handler. Overlays first, then Esc-as-back, then global
    /// keybindings, then the focused pane.
    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        // Help modal: any key dismisses it (swallows the keypress)
        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.settings_panel.is_some() {
            self.handle_settings_key(key);
            return;
        }

        if self.path_prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        // A discard confirmation only survives until the next key.
        let armed = self.pending_discard.take();

        if key.code == KeyCode::Esc && key.modifiers.is_empty() {
            self.focus = Focus::Editor;
            return;
        }

        let ctrl_shift = KeyModifiers::CONTROL | KeyModifiers::SHIFT;
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
                self.quit(armed == Some(PendingDiscard::Quit));
                return;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                self.save();
                return;
            }
            (m, KeyCode::Char('s' | 'S')) if m == ctrl_shift => {
                self.save_as();
                return;
            }
            (KeyModifiers::ALT, KeyCode::Char('s')) => {
                self.save_as();
                return;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('o')) => {
                self.open(armed == Some(PendingDiscard::Open));
                return;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('n')) => {
                self.new_document(armed == Some(PendingDiscard::New));
                return;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('e')) => {
                self.export_html();
                return;
            }
            (_, KeyCode::F(1)) => {
                self.show_help = true;
                return;
            }
            (_, KeyCode::F(2)) => {
                self.settings_panel = Some(0);
                return;
            }
            (_, KeyCode::Tab) => {
                self.focus = match self.focus {
                    Focus::Editor => Focus::Preview,
                    Focus::Preview => Focus::Editor,
                };
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Editor => {
                let result = self.editor.input(key);
                self.record_edit(result);
            }
            Focus::Preview => self.handle_preview_key(key),
        }
    }

    fn handle_preview_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.preview.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.preview.scroll_down(1),
            KeyCode::PageUp => self.preview.page_up(),
            KeyCode::PageDown | KeyCode::Char(' ') => self.preview.page_down(),
            KeyCode::Home | KeyCode::Char('g') => self.preview.scroll_to_top(),
            KeyCode::End | KeyCode::Char('G') => self.preview.scroll_to_bottom(),
            _ => {}
        }
    }

    // ─── Mouse handling ──────────────────────────────────────────────────

    /// Wheel scrolls the pane under the pointer; a click focuses it.
    pub(super) fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.show_help || self.settings_panel.is_some() {
            return;
        }
        let Some(pane) = self.pane_at(mouse.column, mouse.row) else {
            return;
        };
        match mouse.kind {
            MouseEventKind::ScrollUp => match pane {
                Focus::Editor => self.editor.scroll_by(-(SCROLL_LINES as isize)),
                Focus::Preview => self.preview.scroll_up(SCROLL_LINES),
            },
            MouseEventKind::ScrollDown => match pane {
                Focus::Editor => self.editor.scroll_by(SCROLL_LINES as isize),
                Focus::Preview => self.preview.scroll_down(SCROLL_LINES),
            },
            MouseEventKind::Down(_) => self.focus = pane,
            _ => {}
        }
    }

    fn pane_at(&self, column: u16, row: u16) -> Option<Focus> {
        let pos = Position::new(column, row);
        if self.split {
            if self.editor_area.contains(pos) {
                Some(Focus::Editor)
            } else if self.preview_area.contains(pos) {
                Some(Focus::Preview)
            } else {
                None
            }
        } else {
            let area = match self.focus {
                Focus::Editor => self.editor_area,
                Focus::Preview => self.preview_area,
            };
            area.contains(pos).then_some(self.focus)
        }
    }
}
