//! Inline path prompt on the status line, used for save-as and open when no
//! native dialog can be shown (SSH, bare console).

use unicode_width::UnicodeWidthStr;

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptKind {
    SaveAs,
    Open,
}

impl PromptKind {
    fn label(self) -> &'static str {
        match self {
            PromptKind::SaveAs => "Save as: ",
            PromptKind::Open => "Open: ",
        }
    }
}

/// Text being typed into the prompt. `cursor` is a byte offset that always
/// sits on a char boundary.
#[derive(Debug, Clone)]
pub(crate) struct PathPrompt {
    pub(crate) kind: PromptKind,
    pub(crate) buf: String,
    pub(crate) cursor: usize,
}

impl PathPrompt {
    fn prev_boundary(&self) -> usize {
        self.buf[..self.cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.buf[self.cursor..]
            .chars()
            .next()
            .map_or(self.cursor, |c| self.cursor + c.len_utf8())
    }

    fn insert_str(&mut self, text: &str) {
        self.buf.insert_str(self.cursor, text);
        self.cursor += text.len();
    }
}

impl<'a> App<'a> {
    // ─── Path prompt ─────────────────────────────────────────────────────

    /// Opens the prompt, pre-filled with the current path (save) or the
    /// base directory (open), cursor at the end.
    pub(super) fn start_prompt(&mut self, kind: PromptKind) {
        let initial = match kind {
            PromptKind::SaveAs => self.store.suggested_save_path(),
            PromptKind::Open => match self.store.path().and_then(Path::parent) {
                Some(dir) => dir.to_path_buf(),
                None => self.store.resolve_path(""),
            },
        };
        let mut buf = initial.to_string_lossy().into_owned();
        if kind == PromptKind::Open && !buf.is_empty() && !buf.ends_with(std::path::MAIN_SEPARATOR) {
            buf.push(std::path::MAIN_SEPARATOR);
        }
        self.path_prompt = Some(PathPrompt {
            kind,
            cursor: buf.len(),
            buf,
        });
    }

    /// Enter confirms, Esc cancels, everything else edits the path.
    pub(super) fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.path_prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                let kind = prompt.kind;
                self.path_prompt = None;
                self.set_status(match kind {
                    PromptKind::SaveAs => "Save cancelled",
                    PromptKind::Open => "Open cancelled",
                });
            }
            KeyCode::Enter => self.confirm_prompt(),
            KeyCode::Backspace => {
                if prompt.cursor > 0 {
                    let start = prompt.prev_boundary();
                    prompt.buf.replace_range(start..prompt.cursor, "");
                    prompt.cursor = start;
                }
            }
            KeyCode::Delete => {
                let end = prompt.next_boundary();
                prompt.buf.replace_range(prompt.cursor..end, "");
            }
            KeyCode::Left => prompt.cursor = prompt.prev_boundary(),
            KeyCode::Right => prompt.cursor = prompt.next_boundary(),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.buf.len(),
            // Ctrl+U clears the line, as in a shell
            KeyCode::Char('u') if key.modifiers == KeyModifiers::CONTROL => {
                prompt.buf.clear();
                prompt.cursor = 0;
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                prompt.insert_str(ch.encode_utf8(&mut [0; 4]));
            }
            _ => {}
        }
    }

    /// Pasted text goes into the prompt, newlines dropped.
    pub(super) fn paste_into_prompt(&mut self, text: &str) {
        if let Some(prompt) = self.path_prompt.as_mut() {
            let line: String = text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
            prompt.insert_str(&line);
        }
    }

    fn confirm_prompt(&mut self) {
        let Some(prompt) = self.path_prompt.take() else {
            return;
        };
        if prompt.buf.trim().is_empty() {
            self.set_status("No path given");
            return;
        }
        let path = self.store.resolve_path(&prompt.buf);
        match prompt.kind {
            PromptKind::SaveAs => {
                let before = self.store.path().map(Path::to_path_buf);
                let result = self.store.save_file(Some(&path));
                self.finish_save(before, result);
            }
            PromptKind::Open => match self.store.open_file(&path) {
                Ok(()) => {
                    self.load_document();
                    self.set_status(&format!("Opened {}", crate::fs::file_name(&path)));
                }
                Err(e) => self.set_status(&format!("Error opening: {e}")),
            },
        }
    }

    /// Draws the prompt over the status line and places the cursor in it.
    pub(super) fn render_prompt(&self, frame: &mut Frame, area: Rect) {
        let Some(ref prompt) = self.path_prompt else {
            return;
        };
        let bar = self.palette.bar_style();
        let label = prompt.kind.label();
        let line = Line::from(vec![
            Span::styled(format!("  {label}"), bar.fg(self.palette.link)),
            Span::styled(prompt.buf.clone(), bar),
        ]);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(line).style(bar), area);

        let before_cursor = &prompt.buf[..prompt.cursor];
        let offset = 2 + label.width() + before_cursor.width();
        let x = area.x.saturating_add(offset.min(u16::MAX as usize) as u16);
        frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
    }
}
