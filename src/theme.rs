use ratatui::style::{Color, Modifier, Style};

use crate::settings::ThemeId;

/// Colors for one theme. `Color::Reset` inherits the terminal's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub border: Color,
    pub dim: Color,
    pub selection: Color,

    // Markdown syntax
    pub heading: Color,
    pub bold: Color,
    pub italic: Color,
    pub link: Color,
    pub code: Color,
    pub code_bg: Color,
    pub quote: Color,
    pub quote_border: Color,

    // Status indicators
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    pub active_tab: Color,
    pub inactive_tab: Color,
}

const DARK: Palette = Palette {
    bg: Color::Rgb(30, 31, 40),
    fg: Color::Rgb(220, 222, 230),
    border: Color::DarkGray,
    dim: Color::Rgb(110, 114, 130),
    selection: Color::Blue,
    heading: Color::Rgb(130, 170, 255),
    bold: Color::Yellow,
    italic: Color::Cyan,
    link: Color::Cyan,
    code: Color::Rgb(255, 121, 121),
    code_bg: Color::Rgb(40, 42, 54),
    quote: Color::Green,
    quote_border: Color::Rgb(106, 190, 120),
    success: Color::Green,
    warning: Color::Yellow,
    error: Color::Red,
    active_tab: Color::Blue,
    inactive_tab: Color::Gray,
};

const LIGHT: Palette = Palette {
    bg: Color::Rgb(250, 250, 247),
    fg: Color::Rgb(40, 42, 54),
    border: Color::Rgb(180, 182, 190),
    dim: Color::Rgb(130, 132, 140),
    selection: Color::Rgb(180, 210, 255),
    heading: Color::Rgb(30, 80, 180),
    bold: Color::Rgb(150, 90, 0),
    italic: Color::Rgb(0, 120, 140),
    link: Color::Rgb(0, 100, 200),
    code: Color::Rgb(180, 40, 60),
    code_bg: Color::Rgb(236, 236, 232),
    quote: Color::Rgb(40, 120, 60),
    quote_border: Color::Rgb(90, 160, 100),
    success: Color::Rgb(30, 130, 60),
    warning: Color::Rgb(180, 120, 0),
    error: Color::Rgb(200, 30, 30),
    active_tab: Color::Rgb(30, 80, 180),
    inactive_tab: Color::Rgb(130, 132, 140),
};

const TERMINAL: Palette = Palette {
    bg: Color::Reset,
    fg: Color::Reset,
    border: Color::DarkGray,
    dim: Color::DarkGray,
    selection: Color::Blue,
    heading: Color::Blue,
    bold: Color::Yellow,
    italic: Color::Cyan,
    link: Color::Cyan,
    code: Color::Red,
    code_bg: Color::Reset,
    quote: Color::Green,
    quote_border: Color::Green,
    success: Color::Green,
    warning: Color::Yellow,
    error: Color::Red,
    active_tab: Color::Blue,
    inactive_tab: Color::Gray,
};

impl Palette {
    pub fn for_theme(theme: ThemeId) -> Self {
        match theme {
            ThemeId::Dark => DARK,
            ThemeId::Light => LIGHT,
            ThemeId::Terminal => TERMINAL,
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn bar_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.code_bg)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn line_number_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().bg(self.selection)
    }

    pub fn heading_style(&self) -> Style {
        Style::default()
            .fg(self.heading)
            .add_modifier(Modifier::BOLD)
    }

    pub fn bold_style(&self) -> Style {
        Style::default().fg(self.bold).add_modifier(Modifier::BOLD)
    }

    pub fn italic_style(&self) -> Style {
        Style::default()
            .fg(self.italic)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn code_style(&self) -> Style {
        Style::default().fg(self.code)
    }

    pub fn code_block_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.code_bg)
    }

    pub fn quote_style(&self) -> Style {
        Style::default()
            .fg(self.quote)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn link_style(&self) -> Style {
        Style::default()
            .fg(self.link)
            .add_modifier(Modifier::UNDERLINED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_has_a_palette() {
        for id in ThemeId::ALL {
            let p = Palette::for_theme(id);
            assert_ne!(p.heading, p.error, "{id} heading should stand out from errors");
        }
    }

    #[test]
    fn terminal_theme_inherits_terminal_colors() {
        let p = Palette::for_theme(ThemeId::Terminal);
        assert_eq!(p.fg, Color::Reset);
        assert_eq!(p.bg, Color::Reset);
    }

    #[test]
    fn light_and_dark_differ() {
        assert_ne!(
            Palette::for_theme(ThemeId::Light).bg,
            Palette::for_theme(ThemeId::Dark).bg
        );
    }
}
