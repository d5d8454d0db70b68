//! UI rendering: frame layout, split or single pane content, and the help
//! modal.

use super::*;

impl<'a> App<'a> {
    /// Runs one frame of the main loop: draw + tick.
    pub fn render_frame<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
    ) -> std::io::Result<()> {
        terminal.draw(|frame| self.render(frame))?;
        self.tick();
        Ok(())
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn render(&mut self, frame: &mut Frame) {
        let full = frame.area();
        let palette = self.palette;

        frame.render_widget(Paragraph::new("").style(palette.base_style()), full);

        let chunks = Layout::vertical([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Divider
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Divider
            Constraint::Length(1), // Status
        ])
        .split(full);

        let filename = self.store.display_name();
        header::render(
            frame,
            chunks[0],
            header::HeaderInfo {
                filename: &filename,
                dirty: self.store.has_unsaved_changes(),
                readonly: self.store.is_readonly(),
                focus: self.focus,
            },
            &palette,
        );

        for divider in [chunks[1], chunks[3]] {
            let line = Paragraph::new("\u{2500}".repeat(divider.width as usize))
                .style(palette.border_style());
            frame.render_widget(line, divider);
        }

        self.render_content(frame, chunks[2]);

        let (line, col) = self.editor.cursor();
        status::render(
            frame,
            chunks[4],
            status::StatusInfo {
                line: line + 1,
                col: col + 1,
                message: &self.status_message,
                word_count: self.editor.word_count(),
                save_status: self.store.status(),
                error: self.store.error_message(),
            },
            &palette,
        );

        self.render_prompt(frame, chunks[4]);

        // Overlays last so they sit on top
        if self.settings_panel.is_some() {
            self.render_settings(frame);
        }
        if self.show_help {
            self.render_help(frame);
        }
    }

    /// Editor left and preview right when there is room; otherwise only the
    /// focused pane.
    fn render_content(&mut self, frame: &mut Frame, area: Rect) {
        self.split = area.width >= SPLIT_MIN_WIDTH;

        if self.split {
            let panes = Layout::horizontal([
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .split(area);
            self.editor_area = panes[0];
            self.preview_area = panes[2];

            let rule = vec![Line::from("\u{2502}"); panes[1].height as usize];
            frame.render_widget(
                Paragraph::new(rule).style(self.palette.border_style()),
                panes[1],
            );
            self.editor.render(frame, self.editor_area);
            self.render_preview(frame, self.preview_area);
        } else {
            self.editor_area = area;
            self.preview_area = area;
            match self.focus {
                Focus::Editor => self.editor.render(frame, area),
                Focus::Preview => self.render_preview(frame, area),
            }
        }
    }

    fn render_preview(&mut self, frame: &mut Frame, area: Rect) {
        // Small left margin so text does not touch the divider
        let inner = Rect {
            x: area.x.saturating_add(1).min(area.right()),
            width: area.width.saturating_sub(1),
            ..area
        };
        preview::render(frame, inner, self.store.content(), &mut self.preview, &self.palette);
    }

    /// Centered modal listing the keybindings. Dismissed by any key.
    fn render_help(&self, frame: &mut Frame) {
        let area = frame.area();
        let width = 46u16.min(area.width.saturating_sub(4));
        let height = 24u16.min(area.height.saturating_sub(2));
        let x = area.width.saturating_sub(width) / 2;
        let y = area.height.saturating_sub(height) / 2;
        let help_area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, help_area);

        let key_style = Style::default().fg(self.palette.link);
        let entry = |keys: &'static str, action: &'static str| {
            Line::from(vec![Span::styled(keys, key_style), Span::raw(action)])
        };

        // Must match the handlers in input.rs
        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default()
                    .fg(self.palette.heading)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            entry("  Tab              ", "Switch pane"),
            entry("  Ctrl+S           ", "Save"),
            entry("  Ctrl+Shift+S     ", "Save as (also Alt+S)"),
            entry("  Ctrl+O           ", "Open"),
            entry("  Ctrl+N           ", "New document"),
            entry("  Ctrl+E           ", "Export HTML"),
            entry("  Ctrl+Q           ", "Save & quit"),
            entry("  Esc              ", "Back to editor"),
            entry("  F1               ", "This help"),
            entry("  F2               ", "Settings"),
            Line::from(""),
            entry("  Ctrl+Z / Ctrl+Y  ", "Undo / Redo"),
            entry("  Ctrl+A           ", "Select all"),
            entry("  Ctrl+L           ", "Go to line start"),
            entry("  Ctrl+H           ", "Delete word before"),
            entry("  Ctrl+D           ", "Delete word after"),
            entry("  PgUp / PgDn      ", "Scroll a page"),
            Line::from(""),
            entry("  j / k, Space     ", "Scroll preview"),
            entry("  g / G            ", "Preview top / bottom"),
            entry("  Mouse wheel      ", "Scroll pane under pointer"),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.palette.border_style())
            .style(self.palette.bar_style());

        let paragraph = Paragraph::new(help_text)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, help_area);
    }
}
