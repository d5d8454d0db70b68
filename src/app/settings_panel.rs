//! Settings overlay (F2): one row per setting, adjusted in place and
//! persisted on every change.

use super::*;

impl<'a> App<'a> {
    pub(super) fn handle_settings_key(&mut self, key: KeyEvent) {
        let Some(selected) = self.settings_panel else {
            return;
        };
        let count = SettingKey::ALL.len();
        let setting = SettingKey::ALL[selected.min(count - 1)];

        match key.code {
            KeyCode::Esc | KeyCode::F(2) | KeyCode::Char('q') => self.settings_panel = None,
            KeyCode::Up | KeyCode::Char('k') => {
                self.settings_panel = Some((selected + count - 1) % count);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.settings_panel = Some((selected + 1) % count);
            }
            KeyCode::Left | KeyCode::Char('h') => self.adjust_setting(setting, false),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
                self.adjust_setting(setting, true)
            }
            KeyCode::Char('r') => {
                if let Err(e) = self.settings.reset_to_defaults() {
                    self.set_status(&format!("Settings not saved: {e}"));
                } else {
                    self.set_status("Settings reset to defaults");
                }
                self.apply_settings();
            }
            _ => {}
        }
    }

    fn adjust_setting(&mut self, key: SettingKey, forward: bool) {
        // The in-memory value is kept even when persisting fails.
        if let Err(e) = self.settings.adjust(key, forward) {
            self.set_status(&format!("Settings not saved: {e}"));
        }
        self.apply_settings();
    }

    pub(super) fn render_settings(&self, frame: &mut Frame) {
        let Some(selected) = self.settings_panel else {
            return;
        };
        let area = frame.area();
        let width = 48u16.min(area.width.saturating_sub(4));
        let height = (SettingKey::ALL.len() as u16 + 6).min(area.height.saturating_sub(2));
        let x = area.width.saturating_sub(width) / 2;
        let y = area.height.saturating_sub(height) / 2;
        let panel_area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, panel_area);

        let palette = &self.palette;
        let current = self.settings.settings();
        let mut lines = vec![
            Line::from(Span::styled("Settings", palette.heading_style())),
            Line::from(""),
        ];
        for (i, key) in SettingKey::ALL.into_iter().enumerate() {
            let marker = if i == selected { "> " } else { "  " };
            let row_style = if i == selected {
                palette.selection_style()
            } else {
                Style::default().fg(palette.fg)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{marker}{:<22}", key.label()), row_style),
                Span::styled(current.get(key).to_string(), row_style.fg(palette.link)),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "\u{2191}\u{2193} select  \u{2190}\u{2192} change  r reset  Esc close",
            palette.dim_style(),
        )));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border_style())
            .style(palette.bar_style());

        frame.render_widget(Paragraph::new(lines).block(block), panel_area);
    }
}
