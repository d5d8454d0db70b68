//! Editor pane: a tui-textarea widget plus the bookkeeping the app needs
//! around it. Keeps the document's line ending and trailing newline so text
//! goes back out exactly as it came in, tracks the viewport's top row for
//! scroll sync, and enforces read-only mode.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_textarea::{CursorMove, Input, Scrolling, TextArea};

use crate::sync;
use crate::theme::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// What a key did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditResult {
    Changed,
    Unchanged,
    /// An edit was attempted on a read-only document.
    Rejected,
}

pub struct EditorView<'a> {
    textarea: TextArea<'a>,
    line_ending: LineEnding,
    trailing_newline: bool,
    readonly: bool,
    palette: Palette,
    tab_size: u8,
    /// Mirrors tui-textarea's viewport top row.
    scroll_top: usize,
    viewport_height: usize,
    last_reported_top: Option<usize>,
}

fn configure_textarea(textarea: &mut TextArea, palette: &Palette, tab_size: u8) {
    textarea.set_cursor_line_style(Style::default());
    textarea.set_line_number_style(palette.line_number_style());
    textarea.set_style(palette.base_style());
    textarea.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD));
    textarea.set_selection_style(palette.selection_style());
    textarea.set_tab_length(tab_size);
    textarea.set_hard_tab_indent(false);
}

impl<'a> EditorView<'a> {
    pub fn new(content: &str, palette: Palette, tab_size: u8) -> Self {
        let mut view = Self {
            textarea: TextArea::default(),
            line_ending: LineEnding::Lf,
            trailing_newline: false,
            readonly: false,
            palette,
            tab_size,
            scroll_top: 0,
            viewport_height: 0,
            last_reported_top: None,
        };
        view.set_content(content);
        view
    }

    /// Replaces the buffer. Undo history and scroll position are reset.
    pub fn set_content(&mut self, content: &str) {
        self.line_ending = LineEnding::detect(content);
        self.trailing_newline = content.ends_with('\n');

        let mut lines: Vec<String> = content.lines().map(String::from).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        let mut textarea = TextArea::new(lines);
        configure_textarea(&mut textarea, &self.palette, self.tab_size);
        self.textarea = textarea;
        self.scroll_top = 0;
        self.last_reported_top = None;
    }

    /// Buffer text with the original line ending and trailing newline.
    pub fn content(&self) -> String {
        let eol = self.line_ending.as_str();
        let mut text = self.textarea.lines().join(eol);
        if self.trailing_newline {
            text.push_str(eol);
        }
        text
    }

    pub fn lines(&self) -> &[String] {
        self.textarea.lines()
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn apply_theme(&mut self, palette: Palette) {
        self.palette = palette;
        configure_textarea(&mut self.textarea, &self.palette, self.tab_size);
    }

    pub fn set_tab_size(&mut self, tab_size: u8) {
        self.tab_size = tab_size;
        self.textarea.set_tab_length(tab_size);
    }

    /// Cursor as (row, col), zero-based.
    pub fn cursor(&self) -> (usize, usize) {
        self.textarea.cursor()
    }

    pub fn word_count(&self) -> usize {
        self.textarea
            .lines()
            .iter()
            .map(|line| line.split_whitespace().count())
            .sum()
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Handles a key aimed at the editor.
    ///
    /// tui-textarea's own bindings are non-standard (Ctrl+U undo, Ctrl+A line
    /// start), so the common ones are remapped first:
    /// Ctrl+Z undo, Ctrl+Y redo, Ctrl+A select all, Ctrl+Backspace / Ctrl+H
    /// delete word, Ctrl+Delete / Ctrl+D delete next word.
    pub fn input(&mut self, key: KeyEvent) -> EditResult {
        match (key.modifiers, key.code) {
            // tui-textarea pages with Ctrl+V / Alt+V too.
            (KeyModifiers::NONE, KeyCode::PageDown) | (KeyModifiers::CONTROL, KeyCode::Char('v')) => {
                self.page(true);
                return EditResult::Unchanged;
            }
            (KeyModifiers::NONE, KeyCode::PageUp) | (KeyModifiers::ALT, KeyCode::Char('v')) => {
                self.page(false);
                return EditResult::Unchanged;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('a')) => {
                self.textarea.select_all();
                return EditResult::Unchanged;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
                self.textarea.cancel_selection();
                self.textarea.move_cursor(CursorMove::Head);
                return EditResult::Unchanged;
            }
            _ => {}
        }

        if self.readonly && !is_navigation(&key) {
            return EditResult::Rejected;
        }

        let changed = match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('z')) => self.textarea.undo(),
            (KeyModifiers::CONTROL, KeyCode::Char('y')) => self.textarea.redo(),
            (m, KeyCode::Char('Z'))
                if m.contains(KeyModifiers::CONTROL) && m.contains(KeyModifiers::SHIFT) =>
            {
                self.textarea.redo()
            }
            (KeyModifiers::CONTROL, KeyCode::Backspace)
            | (KeyModifiers::CONTROL, KeyCode::Char('h')) => self.textarea.delete_word(),
            (KeyModifiers::CONTROL, KeyCode::Delete)
            | (KeyModifiers::CONTROL, KeyCode::Char('d')) => self.textarea.delete_next_word(),
            _ => self.textarea.input(Input::from(key)),
        };
        self.follow_cursor();

        if changed {
            EditResult::Changed
        } else {
            EditResult::Unchanged
        }
    }

    /// Inserts pasted text at the cursor.
    pub fn insert_str(&mut self, text: &str) -> EditResult {
        if self.readonly {
            return EditResult::Rejected;
        }
        // Pasted CRLF would otherwise leave stray \r in the buffer.
        let normalized = text.replace("\r\n", "\n");
        let changed = self.textarea.insert_str(normalized);
        self.follow_cursor();
        if changed {
            EditResult::Changed
        } else {
            EditResult::Unchanged
        }
    }

    // ─── Scrolling ───────────────────────────────────────────────────────

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    fn max_scroll_top(&self) -> usize {
        self.textarea.lines().len().saturating_sub(self.viewport_height)
    }

    pub fn scroll_by(&mut self, rows: isize) {
        let target = (self.scroll_top as isize + rows).clamp(0, self.max_scroll_top() as isize);
        self.scroll_to_row(target as usize);
    }

    fn page(&mut self, down: bool) {
        let step = self.viewport_height.saturating_sub(2).max(1) as isize;
        self.scroll_by(if down { step } else { -step });
    }

    fn scroll_to_row(&mut self, target: usize) {
        // Before the first render tui-textarea has no viewport to scroll.
        if self.viewport_height == 0 {
            return;
        }
        let target = target.min(self.max_scroll_top());
        let delta = target as i64 - self.scroll_top as i64;
        if delta != 0 {
            let rows = delta.clamp(i16::MIN as i64, i16::MAX as i64) as i16;
            self.textarea.scroll(Scrolling::Delta { rows, cols: 0 });
            self.scroll_top = target;
        }
    }

    pub fn scroll_percentage(&self) -> f64 {
        sync::scroll_percentage(
            self.scroll_top,
            self.textarea.lines().len(),
            self.viewport_height,
        )
    }

    pub fn scroll_to_percentage(&mut self, percentage: f64) {
        let target = sync::scroll_top_for_percentage(
            percentage,
            self.textarea.lines().len(),
            self.viewport_height,
        );
        self.scroll_to_row(target);
    }

    /// Returns the scroll percentage if the viewport moved since the last call.
    pub fn poll_scroll(&mut self) -> Option<f64> {
        if self.viewport_height == 0 || self.last_reported_top == Some(self.scroll_top) {
            return None;
        }
        let first_report = self.last_reported_top.is_none();
        self.last_reported_top = Some(self.scroll_top);
        // The initial position is a baseline, not a user scroll.
        (!first_report).then(|| self.scroll_percentage())
    }

    /// Same viewport rule tui-textarea applies when it renders.
    fn follow_cursor(&mut self) {
        if self.viewport_height == 0 {
            return;
        }
        let row = self.textarea.cursor().0;
        if row < self.scroll_top {
            self.scroll_top = row;
        } else if self.scroll_top + self.viewport_height <= row {
            self.scroll_top = row + 1 - self.viewport_height;
        }
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.viewport_height = area.height as usize;
        self.follow_cursor();
        frame.render_widget(&self.textarea, area);

        // Tilde markers for rows past the end of the buffer
        let total_lines = self.textarea.lines().len();
        let gutter_width = total_lines.to_string().len() + 1;
        let visible = total_lines.saturating_sub(self.scroll_top);
        let tilde_style = self.palette.dim_style();
        for row in visible..self.viewport_height {
            let tilde_area = Rect {
                x: area.x,
                y: area.y + row as u16,
                width: area.width,
                height: 1,
            };
            let tilde = Paragraph::new(Line::from(vec![
                Span::styled(" ".repeat(gutter_width), tilde_style),
                Span::styled("~", tilde_style),
            ]));
            frame.render_widget(tilde, tilde_area);
        }
    }
}

/// Keys that move the cursor or select without changing text.
fn is_navigation(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Up
        | KeyCode::Down
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End => true,
        // Emacs-style motion: Ctrl+F/B/P/N/E, Alt+F/B.
        KeyCode::Char(c) if key.modifiers == KeyModifiers::CONTROL => {
            matches!(c, 'f' | 'b' | 'p' | 'n' | 'e')
        }
        KeyCode::Char(c) if key.modifiers == KeyModifiers::ALT => matches!(c, 'f' | 'b'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ThemeId;
    use ratatui::{backend::TestBackend, Terminal};

    fn view(content: &str) -> EditorView<'static> {
        EditorView::new(content, Palette::for_theme(ThemeId::Dark), 2)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn render(view: &mut EditorView, width: u16, height: u16) {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| view.render(f, Rect::new(0, 0, width, height)))
            .unwrap();
    }

    #[test]
    fn content_round_trips_line_endings() {
        for original in ["", "\n", "a", "a\n", "a\n\nb\n\n", "x\r\ny\r\n", "x\r\ny"] {
            assert_eq!(view(original).content(), original, "round trip of {original:?}");
        }
    }

    #[test]
    fn crlf_is_kept_for_new_lines() {
        let mut v = view("one\r\ntwo\r\n");
        v.input(key(KeyCode::End));
        v.input(key(KeyCode::Enter));
        v.input(key(KeyCode::Char('x')));
        assert_eq!(v.content(), "one\r\nx\r\ntwo\r\n");
    }

    #[test]
    fn typing_reports_change() {
        let mut v = view("");
        assert_eq!(v.input(key(KeyCode::Char('h'))), EditResult::Changed);
        assert_eq!(v.input(key(KeyCode::Left)), EditResult::Unchanged);
        assert_eq!(v.content(), "h");
    }

    #[test]
    fn undo_and_redo_use_standard_keys() {
        let mut v = view("");
        v.input(key(KeyCode::Char('a')));
        assert_eq!(v.input(ctrl('z')), EditResult::Changed);
        assert_eq!(v.content(), "");
        assert_eq!(v.input(ctrl('y')), EditResult::Changed);
        assert_eq!(v.content(), "a");
    }

    #[test]
    fn readonly_rejects_edits_but_allows_navigation() {
        let mut v = view("locked\n");
        v.set_readonly(true);
        assert_eq!(v.input(key(KeyCode::Char('x'))), EditResult::Rejected);
        assert_eq!(v.input(key(KeyCode::Enter)), EditResult::Rejected);
        assert_eq!(v.input(key(KeyCode::Backspace)), EditResult::Rejected);
        assert_eq!(v.input(ctrl('z')), EditResult::Rejected);
        assert_eq!(v.insert_str("pasted"), EditResult::Rejected);
        assert_eq!(v.input(key(KeyCode::Right)), EditResult::Unchanged);
        assert_eq!(v.cursor(), (0, 1));
        assert_eq!(v.content(), "locked\n");
    }

    #[test]
    fn paste_normalizes_crlf() {
        let mut v = view("");
        v.insert_str("a\r\nb");
        assert_eq!(v.lines(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn scroll_percentage_follows_viewport() {
        let content: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let mut v = view(&content);
        render(&mut v, 40, 10);
        assert_eq!(v.scroll_percentage(), 0.0);

        v.scroll_to_percentage(1.0);
        assert_eq!(v.scroll_top(), 40);
        assert_eq!(v.scroll_percentage(), 1.0);

        v.scroll_to_percentage(0.5);
        assert_eq!(v.scroll_top(), 20);

        // Rendering keeps the programmatic position.
        render(&mut v, 40, 10);
        assert_eq!(v.scroll_top(), 20);
    }

    #[test]
    fn short_document_never_scrolls() {
        let mut v = view("one\ntwo\n");
        render(&mut v, 40, 10);
        v.scroll_to_percentage(0.8);
        assert_eq!(v.scroll_top(), 0);
        assert_eq!(v.scroll_percentage(), 0.0);
    }

    #[test]
    fn poll_scroll_reports_each_move_once() {
        let content: String = (0..50).map(|i| format!("{i}\n")).collect();
        let mut v = view(&content);
        render(&mut v, 40, 10);
        assert_eq!(v.poll_scroll(), None);

        v.input(key(KeyCode::PageDown));
        let p = v.poll_scroll().unwrap();
        assert!(p > 0.0);
        assert_eq!(v.poll_scroll(), None);
    }

    #[test]
    fn cursor_past_viewport_scrolls() {
        let content: String = (0..30).map(|i| format!("{i}\n")).collect();
        let mut v = view(&content);
        render(&mut v, 40, 10);
        for _ in 0..15 {
            v.input(key(KeyCode::Down));
        }
        assert_eq!(v.scroll_top(), 6);
    }

    #[test]
    fn word_count_counts_words() {
        assert_eq!(view("one two\nthree\n").word_count(), 3);
    }
}
