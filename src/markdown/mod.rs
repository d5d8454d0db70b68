//! Markdown rendering: styled terminal lines for the preview pane and
//! sanitized HTML for export.

pub mod html;
pub mod renderer;

pub use html::{render_document, render_html};
pub use renderer::{render_markdown, RenderedMarkdown};
