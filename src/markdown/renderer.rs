use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};
use unicode_width::UnicodeWidthStr;

use crate::theme::Palette;

/// Rendered preview with metadata for post-processing.
pub struct RenderedMarkdown {
    pub text: Text<'static>,
    /// Link URLs in document order.
    pub link_urls: Vec<String>,
}

impl RenderedMarkdown {
    pub fn line_count(&self) -> usize {
        self.text.lines.len()
    }
}

pub(crate) fn parser_options() -> Options {
    Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

/// Renders markdown into styled terminal lines `width` columns wide.
///
/// Raw HTML (blocks and inline) is dropped; the preview never interprets it.
pub fn render_markdown(content: &str, width: usize, palette: &Palette) -> RenderedMarkdown {
    let parser = Parser::new_ext(content, parser_options());
    let base = Style::default().fg(palette.fg);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![base];
    let mut in_code_block = false;
    let mut code_block_lang = String::new();
    let mut code_block_content = String::new();
    let mut blockquote_depth: usize = 0;

    // None = unordered, Some(counter) = ordered
    let mut list_stack: Vec<Option<u64>> = Vec::new();

    let mut in_table = false;
    let mut table_rows: Vec<Vec<Vec<Span<'static>>>> = Vec::new();
    let mut current_cell: Vec<Span<'static>> = Vec::new();
    let mut table_header_count: usize = 0;
    let mut table_alignments: Vec<Alignment> = Vec::new();

    let mut link_url = String::new();
    let mut link_urls: Vec<String> = Vec::new();
    let mut in_image = false;

    let ctx = LineCtx { palette };

    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    let level = level as usize;
                    flush_line(&mut lines, &mut current_spans);
                    let prev_blank = lines.last().map_or(true, |l| {
                        l.spans
                            .iter()
                            .all(|s| s.content.trim().is_empty() || s.content.trim() == "│")
                    });
                    if !prev_blank && level <= 2 {
                        ctx.push_blank_line(&mut lines, blockquote_depth);
                    }
                    ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                    current_spans.push(Span::styled(
                        format!("{} ", "#".repeat(level)),
                        palette.heading_style(),
                    ));
                    style_stack.push(palette.heading_style());
                }
                Tag::Strong => {
                    let base = current_style(&style_stack, base);
                    style_stack.push(compose_style(base, palette.bold_style()));
                }
                Tag::Emphasis => {
                    let base = current_style(&style_stack, base);
                    style_stack.push(compose_style(base, palette.italic_style()));
                }
                Tag::Strikethrough => {
                    let base = current_style(&style_stack, base);
                    style_stack.push(compose_style(
                        base,
                        Style::default()
                            .fg(palette.fg)
                            .add_modifier(Modifier::CROSSED_OUT),
                    ));
                }
                Tag::Link { dest_url, .. } => {
                    let base = current_style(&style_stack, base);
                    style_stack.push(compose_style(base, palette.link_style()));
                    link_url = dest_url.to_string();
                }
                Tag::Image { .. } => {
                    // Terminal preview shows the alt text only.
                    in_image = true;
                    ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                    current_spans.push(Span::styled("[image: ", palette.dim_style()));
                    style_stack.push(palette.italic_style());
                }
                Tag::CodeBlock(kind) => {
                    flush_line(&mut lines, &mut current_spans);
                    in_code_block = true;
                    code_block_content.clear();
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => lang.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                }
                Tag::BlockQuote(_) => {
                    flush_line(&mut lines, &mut current_spans);
                    blockquote_depth += 1;
                    style_stack.push(palette.quote_style());
                }
                Tag::List(start) => {
                    if !list_stack.is_empty() {
                        flush_line(&mut lines, &mut current_spans);
                    }
                    list_stack.push(start);
                }
                Tag::Item => {
                    flush_line(&mut lines, &mut current_spans);
                    ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                    let indent = "  ".repeat(list_stack.len().saturating_sub(1));
                    let bullet = match list_stack.last_mut() {
                        Some(Some(counter)) => {
                            let n = *counter;
                            *counter += 1;
                            format!("{indent}{n}. ")
                        }
                        _ => format!("{indent}• "),
                    };
                    current_spans.push(Span::styled(bullet, base));
                }
                Tag::Table(alignments) => {
                    flush_line(&mut lines, &mut current_spans);
                    in_table = true;
                    table_rows.clear();
                    table_header_count = 0;
                    table_alignments = alignments;
                }
                Tag::TableHead | Tag::TableRow => {
                    table_rows.push(Vec::new());
                }
                Tag::TableCell => {
                    current_cell.clear();
                }
                Tag::FootnoteDefinition(label) => {
                    flush_line(&mut lines, &mut current_spans);
                    ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                    current_spans.push(Span::styled(format!("[{label}]: "), palette.dim_style()));
                }
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(level) => {
                    style_stack.pop();
                    flush_line(&mut lines, &mut current_spans);
                    let rule_char = match level as usize {
                        1 => "━",
                        2 => "─",
                        _ => "",
                    };
                    if !rule_char.is_empty() {
                        let mut spans = Vec::new();
                        ctx.push_bq_prefix(&mut spans, blockquote_depth);
                        spans.push(Span::styled(
                            rule_char.repeat(width.saturating_sub(blockquote_depth * 2)),
                            Style::default().fg(palette.heading),
                        ));
                        lines.push(Line::from(spans));
                    }
                    ctx.push_blank_line(&mut lines, blockquote_depth);
                }
                TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough => {
                    style_stack.pop();
                }
                TagEnd::Link => {
                    style_stack.pop();
                    if !link_url.is_empty() {
                        current_spans.push(Span::styled(
                            format!(" ({link_url})"),
                            palette.dim_style(),
                        ));
                        link_urls.push(std::mem::take(&mut link_url));
                    }
                }
                TagEnd::Image => {
                    style_stack.pop();
                    in_image = false;
                    current_spans.push(Span::styled("]", palette.dim_style()));
                }
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    ctx.render_code_block(
                        &code_block_content,
                        &code_block_lang,
                        width,
                        blockquote_depth,
                        &mut lines,
                    );
                    ctx.push_blank_line(&mut lines, blockquote_depth);
                    code_block_content.clear();
                    code_block_lang.clear();
                }
                TagEnd::BlockQuote(_) => {
                    flush_line(&mut lines, &mut current_spans);
                    style_stack.pop();
                    blockquote_depth = blockquote_depth.saturating_sub(1);
                }
                TagEnd::List(_) => {
                    list_stack.pop();
                    if list_stack.is_empty() {
                        ctx.push_blank_line(&mut lines, blockquote_depth);
                    }
                }
                TagEnd::Item => {
                    flush_line(&mut lines, &mut current_spans);
                }
                TagEnd::Table => {
                    ctx.render_table(
                        &table_rows,
                        table_header_count,
                        &table_alignments,
                        width,
                        &mut lines,
                        blockquote_depth,
                    );
                    in_table = false;
                    table_rows.clear();
                    table_alignments.clear();
                    ctx.push_blank_line(&mut lines, blockquote_depth);
                }
                TagEnd::TableHead => {
                    table_header_count = table_rows.len();
                }
                TagEnd::TableCell => {
                    if let Some(row) = table_rows.last_mut() {
                        row.push(std::mem::take(&mut current_cell));
                    }
                }
                TagEnd::Paragraph => {
                    flush_line(&mut lines, &mut current_spans);
                    // Tight list items keep their rows together.
                    if list_stack.is_empty() {
                        ctx.push_blank_line(&mut lines, blockquote_depth);
                    }
                }
                TagEnd::FootnoteDefinition => {
                    flush_line(&mut lines, &mut current_spans);
                }
                _ => {}
            },
            Event::Text(text) => {
                let style = current_style(&style_stack, base);
                if in_code_block {
                    code_block_content.push_str(&text);
                } else if in_table {
                    current_cell.push(Span::styled(text.to_string(), style));
                } else if in_image {
                    current_spans.push(Span::styled(text.to_string(), style));
                } else {
                    ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                    let wrapped = word_wrap(&text, width, &current_spans);
                    let last = wrapped.len().saturating_sub(1);
                    for (i, chunk) in wrapped.into_iter().enumerate() {
                        current_spans.push(Span::styled(chunk, style));
                        if i < last {
                            flush_line(&mut lines, &mut current_spans);
                            ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                        }
                    }
                }
            }
            Event::Code(code) => {
                let span = Span::styled(format!(" {code} "), palette.code_style());
                if in_table {
                    current_cell.push(span);
                } else {
                    ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                    current_spans.push(span);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if !in_table {
                    flush_line(&mut lines, &mut current_spans);
                }
            }
            Event::FootnoteReference(label) => {
                ctx.push_bq_prefix(&mut current_spans, blockquote_depth);
                current_spans.push(Span::styled(format!("[{label}]"), palette.link_style()));
            }
            Event::TaskListMarker(checked) => {
                let (marker, style) = if checked {
                    ("[x] ", Style::default().fg(palette.success))
                } else {
                    ("[ ] ", base)
                };
                current_spans.push(Span::styled(marker, style));
            }
            Event::Rule => {
                flush_line(&mut lines, &mut current_spans);
                let avail = width.saturating_sub(blockquote_depth * 2);
                let rule = if avail >= 3 {
                    format!("╶{}╴", "─".repeat(avail - 2))
                } else {
                    "─".repeat(avail)
                };
                let mut spans = Vec::new();
                ctx.push_bq_prefix(&mut spans, blockquote_depth);
                spans.push(Span::styled(rule, palette.border_style()));
                lines.push(Line::from(spans));
                ctx.push_blank_line(&mut lines, blockquote_depth);
            }
            // Html, InlineHtml and anything else we do not draw.
            _ => {}
        }
    }

    flush_line(&mut lines, &mut current_spans);
    while lines.last().is_some_and(|l| l.spans.iter().all(|s| s.content.trim().is_empty())) {
        lines.pop();
    }

    RenderedMarkdown {
        text: Text::from(lines),
        link_urls,
    }
}

/// Palette-aware line helpers.
struct LineCtx<'p> {
    palette: &'p Palette,
}

impl LineCtx<'_> {
    fn quote_prefix(&self, depth: usize) -> Span<'static> {
        Span::styled("│ ".repeat(depth), Style::default().fg(self.palette.quote_border))
    }

    /// Pushes the blockquote `│ ` prefix when at the start of a line.
    fn push_bq_prefix(&self, spans: &mut Vec<Span<'static>>, depth: usize) {
        if depth > 0 && spans.is_empty() {
            spans.push(self.quote_prefix(depth));
        }
    }

    fn push_blank_line(&self, lines: &mut Vec<Line<'static>>, depth: usize) {
        if depth > 0 {
            lines.push(Line::from(self.quote_prefix(depth)));
        } else {
            lines.push(Line::from(""));
        }
    }

    fn render_code_block(
        &self,
        content: &str,
        lang: &str,
        width: usize,
        depth: usize,
        lines: &mut Vec<Line<'static>>,
    ) {
        let block_style = self.palette.code_block_style();
        let inner = width.saturating_sub(depth * 2);

        if !lang.is_empty() {
            let mut spans = Vec::new();
            self.push_bq_prefix(&mut spans, depth);
            spans.push(Span::styled(format!(" {lang}"), self.palette.dim_style()));
            lines.push(Line::from(spans));
        }
        for code_line in content.lines() {
            let mut spans = Vec::new();
            self.push_bq_prefix(&mut spans, depth);
            let text = format!(" {code_line}");
            let pad = inner.saturating_sub(text.width());
            spans.push(Span::styled(text, block_style));
            if pad > 0 {
                spans.push(Span::styled(" ".repeat(pad), block_style));
            }
            lines.push(Line::from(spans));
        }
    }

    /// Draws table rows with box-drawing borders, scaling columns to `width`.
    fn render_table(
        &self,
        rows: &[Vec<Vec<Span<'static>>>],
        header_count: usize,
        alignments: &[Alignment],
        width: usize,
        lines: &mut Vec<Line<'static>>,
        depth: usize,
    ) {
        let num_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        if num_cols == 0 {
            return;
        }
        let col_widths = column_widths(rows, num_cols, width.saturating_sub(depth * 2));
        let border_style = self.palette.border_style();
        let pad_style = Style::default().fg(self.palette.fg);

        for (i, row) in rows.iter().enumerate() {
            let mut spans = Vec::new();
            self.push_bq_prefix(&mut spans, depth);
            spans.push(Span::styled("│ ", border_style));

            for (j, &max_w) in col_widths.iter().enumerate() {
                let cell = row.get(j);
                let cell_width: usize = cell.map_or(0, |c| c.iter().map(|s| s.width()).sum());
                let pad = max_w.saturating_sub(cell_width);
                let (left, right) = match alignments.get(j).copied().unwrap_or(Alignment::None) {
                    Alignment::Right => (pad, 0),
                    Alignment::Center => (pad / 2, pad - pad / 2),
                    _ => (0, pad),
                };

                if left > 0 {
                    spans.push(Span::styled(" ".repeat(left), pad_style));
                }
                if let Some(cell_spans) = cell {
                    let mut remaining = max_w;
                    for s in cell_spans {
                        let sw = s.width();
                        if sw <= remaining {
                            spans.push(s.clone());
                            remaining -= sw;
                        } else if remaining > 0 {
                            let truncated: String = s.content.chars().take(remaining).collect();
                            spans.push(Span::styled(truncated, s.style));
                            remaining = 0;
                        }
                    }
                }
                if right > 0 {
                    spans.push(Span::styled(" ".repeat(right), pad_style));
                }
                let sep = if j + 1 < num_cols { " │ " } else { " │" };
                spans.push(Span::styled(sep, border_style));
            }
            lines.push(Line::from(spans));

            if i + 1 == header_count {
                let mut sep = Vec::new();
                self.push_bq_prefix(&mut sep, depth);
                let mut rule = String::from("├");
                for (j, w) in col_widths.iter().enumerate() {
                    rule.push_str(&"─".repeat(w + 2));
                    rule.push_str(if j + 1 < num_cols { "┼" } else { "┤" });
                }
                sep.push(Span::styled(rule, border_style));
                lines.push(Line::from(sep));
            }
        }
    }
}

/// Natural column widths, expanded or shrunk proportionally to fit.
fn column_widths(rows: &[Vec<Vec<Span<'static>>>], num_cols: usize, width: usize) -> Vec<usize> {
    const MIN_COL: usize = 3;
    let mut widths = vec![MIN_COL; num_cols];
    for row in rows {
        for (j, cell) in row.iter().enumerate().take(num_cols) {
            let w: usize = cell.iter().map(|s| s.width()).sum();
            widths[j] = widths[j].max(w);
        }
    }

    // │ a │ b │ → num_cols + 1 borders plus one space each side of a cell.
    let available = width.saturating_sub(num_cols + 1 + num_cols * 2);
    let natural: usize = widths.iter().sum();
    let last = num_cols - 1;

    if available > natural {
        let extra = available - natural;
        let mut given = 0;
        for j in 0..last {
            let share = (extra as f64 * widths[j] as f64 / natural as f64).round() as usize;
            widths[j] += share;
            given += share;
        }
        widths[last] += extra.saturating_sub(given);
    } else if natural > available && available > 0 {
        let mut used = 0;
        for j in 0..last {
            let share = (available as f64 * widths[j] as f64 / natural as f64).floor() as usize;
            widths[j] = share.max(MIN_COL);
            used += widths[j];
        }
        widths[last] = available.saturating_sub(used).max(MIN_COL);
    }
    widths
}

fn flush_line(lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>) {
    if !spans.is_empty() {
        lines.push(Line::from(std::mem::take(spans)));
    }
}

fn current_style(stack: &[Style], fallback: Style) -> Style {
    stack.last().copied().unwrap_or(fallback)
}

/// Splits `text` at spaces so the current line does not pass `max_width`.
fn word_wrap(text: &str, max_width: usize, existing_spans: &[Span]) -> Vec<String> {
    let mut col: usize = existing_spans.iter().map(|s| s.width()).sum();
    if col + text.width() <= max_width {
        return vec![text.to_string()];
    }

    let mut result = Vec::new();
    let mut current = String::new();
    for word in text.split_inclusive(' ') {
        let w = word.width();
        if col + w > max_width && !current.is_empty() {
            result.push(std::mem::take(&mut current));
            col = 0;
        }
        current.push_str(word);
        col += w;
    }
    if !current.is_empty() {
        result.push(current);
    }
    if result.is_empty() {
        vec![text.to_string()]
    } else {
        result
    }
}

/// Overlay colors win; modifiers accumulate.
fn compose_style(base: Style, overlay: Style) -> Style {
    let mut result = overlay;
    result.add_modifier |= base.add_modifier;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ThemeId;

    fn render(md: &str, width: usize) -> Text<'static> {
        render_markdown(md, width, &Palette::for_theme(ThemeId::Dark)).text
    }

    fn plain(text: &Text) -> String {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_render_heading() {
        let text = render("# Hello", 80);
        assert!(plain(&text).contains("# Hello"));
    }

    #[test]
    fn test_render_bold() {
        let text = render("**bold**", 80);
        let has_bold = text.lines[0]
            .spans
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::BOLD) && s.content.contains("bold"));
        assert!(has_bold);
    }

    #[test]
    fn test_render_italic() {
        let text = render("*italic*", 80);
        let has_italic = text.lines[0].spans.iter().any(|s| {
            s.style.add_modifier.contains(Modifier::ITALIC) && s.content.contains("italic")
        });
        assert!(has_italic);
    }

    #[test]
    fn test_render_inline_code_uses_palette() {
        let palette = Palette::for_theme(ThemeId::Light);
        let text = render_markdown("`code`", 80, &palette).text;
        assert!(text.lines[0]
            .spans
            .iter()
            .any(|s| s.style.fg == Some(palette.code) && s.content.contains("code")));
    }

    #[test]
    fn test_render_lists() {
        let all = plain(&render("- item one\n- item two\n\n1. first\n2. second", 80));
        assert!(all.contains("• item one"));
        assert!(all.contains("1. first"));
        assert!(all.contains("2. second"));
    }

    #[test]
    fn test_render_task_list() {
        let all = plain(&render("- [x] done\n- [ ] todo", 80));
        assert!(all.contains("[x] done"));
        assert!(all.contains("[ ] todo"));
    }

    #[test]
    fn test_render_table() {
        let all = plain(&render("| A | B |\n|---|---|\n| 1 | 2 |", 40));
        assert!(all.contains("│"));
        assert!(all.contains("├"));
        for cell in ["A", "B", "1", "2"] {
            assert!(all.contains(cell), "missing cell {cell}: {all}");
        }
    }

    #[test]
    fn test_render_table_shrinks_to_fit_narrow_width() {
        let md = "| Long Header One | Long Header Two |\n|---|---|\n| cell content a | cell content b |";
        let text = render(md, 30);
        for line in &text.lines {
            let w: usize = line.spans.iter().map(|s| s.width()).sum();
            assert!(w <= 30, "table line too wide ({w})");
        }
    }

    #[test]
    fn test_render_rule_fills_width() {
        let text = render("---", 50);
        let rule = text
            .lines
            .iter()
            .find(|l| l.spans.iter().any(|s| s.content.contains('─')))
            .unwrap();
        let content: String = rule.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(content.chars().count(), 50);
    }

    #[test]
    fn test_render_link_shows_url() {
        let rendered = render_markdown(
            "see [docs](https://example.com)",
            80,
            &Palette::for_theme(ThemeId::Dark),
        );
        assert_eq!(rendered.link_urls, vec!["https://example.com".to_string()]);
        assert!(plain(&rendered.text).contains("(https://example.com)"));
    }

    #[test]
    fn test_raw_html_is_dropped() {
        let all = plain(&render("<script>alert(1)</script>\n\nhello <b>x</b>", 80));
        assert!(!all.contains("script"));
        assert!(!all.contains("<b>"));
        assert!(all.contains("hello"));
    }

    #[test]
    fn test_code_block_keeps_lines() {
        let all = plain(&render("```rust\nfn main() {}\nlet x = 1;\n```", 40));
        assert!(all.contains(" rust"));
        assert!(all.contains(" fn main() {}"));
        assert!(all.contains(" let x = 1;"));
    }

    #[test]
    fn test_blockquote_prefix() {
        let all = plain(&render("> quoted", 40));
        assert!(all.contains("│ quoted"));
    }

    #[test]
    fn test_long_paragraph_wraps() {
        let text = render(&"word ".repeat(40), 30);
        assert!(text.lines.len() > 1);
        for line in &text.lines {
            let w: usize = line.spans.iter().map(|s| s.width()).sum();
            assert!(w <= 30);
        }
    }

    #[test]
    fn test_empty_document_renders_nothing() {
        assert!(render("", 40).lines.is_empty());
    }
}
