use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::Palette;

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Preview,
}

pub struct HeaderInfo<'a> {
    pub filename: &'a str,
    pub dirty: bool,
    pub readonly: bool,
    pub focus: Focus,
}

pub fn render(frame: &mut Frame, area: Rect, info: HeaderInfo, palette: &Palette) {
    let bar = palette.bar_style();

    let mut left_spans = vec![Span::styled(format!("  {}", info.filename), bar)];
    if info.dirty {
        left_spans.push(Span::styled(" \u{2022}", bar.fg(palette.warning)));
    }
    if info.readonly {
        left_spans.push(Span::styled(" [read-only]", bar.fg(palette.dim)));
    }

    let mut right_spans: Vec<Span> = Vec::new();
    for (label, pane) in [("EDITOR", Focus::Editor), ("PREVIEW", Focus::Preview)] {
        let style = if pane == info.focus {
            Style::default()
                .fg(Color::White)
                .bg(palette.active_tab)
                .add_modifier(Modifier::BOLD)
        } else {
            bar.fg(palette.inactive_tab)
        };
        right_spans.push(Span::styled(format!(" {label} "), style));
    }

    let chunks = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(right_spans.iter().map(|s| s.width() as u16).sum()),
    ])
    .split(area);

    frame.render_widget(Paragraph::new("").style(bar), area);
    frame.render_widget(Paragraph::new(Line::from(left_spans)), chunks[0]);
    frame.render_widget(Paragraph::new(Line::from(right_spans)), chunks[1]);
}
