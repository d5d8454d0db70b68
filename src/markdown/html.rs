//! Sanitized HTML export.
//!
//! Raw HTML in the source is dropped and links or images using a
//! script-capable URL scheme are pointed at `#`, so an exported note can be
//! opened in a browser without running anything embedded in it.

use std::path::{Path, PathBuf};

use pulldown_cmark::{html, CowStr, Event, Parser, Tag};

use super::renderer::parser_options;

/// Renders `content` as an HTML fragment.
pub fn render_html(content: &str) -> String {
    let parser = Parser::new_ext(content, parser_options()).filter_map(sanitize_event);
    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Wraps the rendered body in a standalone document.
pub fn render_document(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{}</title>\n\
         <style>\n\
         body {{ max-width: 46em; margin: 2em auto; padding: 0 1em; \
         font-family: sans-serif; line-height: 1.5; }}\n\
         pre {{ background: #f4f4f4; padding: 0.6em; overflow-x: auto; }}\n\
         table {{ border-collapse: collapse; }}\n\
         td, th {{ border: 1px solid #ccc; padding: 0.2em 0.6em; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         {}\
         </body>\n\
         </html>\n",
        escape_text(title),
        render_html(content)
    )
}

/// `notes/today.md` exports to `notes/today.html`.
pub fn export_path(source: &Path) -> PathBuf {
    source.with_extension("html")
}

fn sanitize_event(event: Event<'_>) -> Option<Event<'_>> {
    match event {
        Event::Html(_) | Event::InlineHtml(_) => None,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Link {
            link_type,
            dest_url: neutralize(dest_url),
            title,
            id,
        })),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Image {
            link_type,
            dest_url: neutralize(dest_url),
            title,
            id,
        })),
        other => Some(other),
    }
}

fn neutralize(url: CowStr<'_>) -> CowStr<'_> {
    if is_dangerous_url(&url) {
        tracing::debug!(url = %url, "neutralized unsafe url");
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// True for `javascript:`, `vbscript:` and non-image `data:` URLs.
///
/// Browsers ignore leading control characters and embedded tabs or newlines
/// in a scheme, so those are stripped before comparing.
pub fn is_dangerous_url(url: &str) -> bool {
    let normalized: String = url
        .trim_start_matches(|c: char| c.is_whitespace() || c.is_control())
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();

    if normalized.starts_with("data:") {
        return !normalized.starts_with("data:image/");
    }
    normalized.starts_with("javascript:") || normalized.starts_with("vbscript:")
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
