use ratatui::{
    layout::Rect,
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::markdown;
use crate::sync;
use crate::theme::Palette;

/// Scroll state of the preview pane. Content height and viewport come from
/// the last render.
#[derive(Debug, Default)]
pub struct PreviewState {
    pub scroll_offset: u16,
    pub content_height: u16,
    pub viewport_height: u16,
    /// Link URLs in document order from the last render.
    pub link_urls: Vec<String>,
    last_reported: Option<u16>,
}

impl PreviewState {
    pub fn new() -> Self {
        Self::default()
    }

    fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount).min(self.max_scroll());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport_height.saturating_sub(2).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport_height.saturating_sub(2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    pub fn scroll_percentage(&self) -> f64 {
        sync::scroll_percentage(
            self.scroll_offset as usize,
            self.content_height as usize,
            self.viewport_height as usize,
        )
    }

    pub fn scroll_to_percentage(&mut self, percentage: f64) {
        let top = sync::scroll_top_for_percentage(
            percentage,
            self.content_height as usize,
            self.viewport_height as usize,
        );
        self.scroll_offset = top.min(u16::MAX as usize) as u16;
    }

    /// Returns the scroll percentage if the offset moved since the last call.
    pub fn poll_scroll(&mut self) -> Option<f64> {
        if self.viewport_height == 0 || self.last_reported == Some(self.scroll_offset) {
            return None;
        }
        let first_report = self.last_reported.is_none();
        self.last_reported = Some(self.scroll_offset);
        (!first_report).then(|| self.scroll_percentage())
    }

    /// Forgets the reporting baseline, e.g. when a new document is loaded.
    pub fn reset(&mut self) {
        self.scroll_offset = 0;
        self.last_reported = None;
    }
}

pub fn render(frame: &mut Frame, area: Rect, content: &str, state: &mut PreviewState, palette: &Palette) {
    // One column for the scrollbar, one for breathing room.
    let width = area.width.saturating_sub(2) as usize;
    let rendered = markdown::render_markdown(content, width, palette);

    state.content_height = rendered.line_count().min(u16::MAX as usize) as u16;
    state.viewport_height = area.height;
    state.link_urls = rendered.link_urls;
    // Content can shrink under a scrolled-down view.
    state.scroll_offset = state.scroll_offset.min(state.max_scroll());

    let paragraph = Paragraph::new(rendered.text)
        .style(palette.base_style())
        .scroll((state.scroll_offset, 0));
    frame.render_widget(paragraph, area);

    if state.content_height > area.height {
        let mut scrollbar_state = ScrollbarState::new(state.max_scroll() as usize)
            .position(state.scroll_offset as usize);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None)
            .style(palette.border_style());
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}
