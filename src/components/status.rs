use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::store::SaveStatus;
use crate::theme::Palette;

pub struct StatusInfo<'a> {
    pub line: usize,
    pub col: usize,
    /// Transient message; empty when none.
    pub message: &'a str,
    pub word_count: usize,
    pub save_status: SaveStatus,
    /// Last I/O error, shown while the status is `Error` and no message is up.
    pub error: Option<&'a str>,
}

pub fn render(frame: &mut Frame, area: Rect, info: StatusInfo, palette: &Palette) {
    let bar = palette.bar_style();
    frame.render_widget(Paragraph::new("").style(bar), area);

    let chunks = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Fill(2),
        Constraint::Fill(1),
    ])
    .split(area);

    let left = Paragraph::new(Line::from(Span::styled(
        format!("  Ln {}, Col {}", info.line, info.col),
        bar,
    )));
    frame.render_widget(left, chunks[0]);

    let center = if !info.message.is_empty() {
        Some(Span::styled(info.message.to_string(), bar))
    } else if info.save_status == SaveStatus::Error {
        info.error
            .map(|e| Span::styled(e.to_string(), bar.fg(palette.error)))
    } else {
        None
    };
    if let Some(span) = center {
        frame.render_widget(
            Paragraph::new(Line::from(span)).alignment(Alignment::Center),
            chunks[1],
        );
    }

    let indicator_color = match info.save_status {
        SaveStatus::Saved => palette.success,
        SaveStatus::Unsaved => palette.warning,
        SaveStatus::Saving => palette.dim,
        SaveStatus::Error => palette.error,
    };
    let right = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} words | ", info.word_count), bar),
        Span::styled(info.save_status.label(), bar.fg(indicator_color)),
        Span::styled("  ", bar),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(right, chunks[2]);
}
