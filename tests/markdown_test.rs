use std::path::PathBuf;

use mdnote::markdown::{self, html::is_dangerous_url};
use mdnote::settings::ThemeId;
use mdnote::theme::Palette;

// Whole-document checks against a fixture. The unit tests in
// src/markdown/ cover individual element types.

fn fixture() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample.md");
    std::fs::read_to_string(path).unwrap()
}

fn plain_lines(content: &str, width: usize) -> Vec<String> {
    let palette = Palette::for_theme(ThemeId::Dark);
    markdown::render_markdown(content, width, &palette)
        .text
        .lines
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
        .collect()
}

// ─── Terminal preview ────────────────────────────────────────────────────

#[test]
fn fixture_renders_every_block_kind() {
    let lines = plain_lines(&fixture(), 70);
    let text = lines.join("\n");

    assert!(text.contains("# Sample Note"));
    assert!(text.contains("sample"));
    assert!(text.contains("nested item"));
    assert!(text.contains("println!(\"hello\");"));
    assert!(text.contains("This is a quote"));
    assert!(text.contains("alpha"));
    assert!(text.contains("(https://example.com/docs)"));
    assert!(text.contains("[image: diagram]"));
}

#[test]
fn fixture_preview_drops_raw_html() {
    let text = plain_lines(&fixture(), 70).join("\n");
    assert!(!text.contains("onclick"));
    assert!(!text.contains("<div"));
}

#[test]
fn narrow_width_wraps_without_overflow() {
    use unicode_width::UnicodeWidthStr;
    let paragraph = "word ".repeat(40);
    for line in plain_lines(&paragraph, 20) {
        assert!(line.width() <= 20, "line too wide: {line:?}");
    }
}

#[test]
fn links_are_collected_in_order() {
    let palette = Palette::for_theme(ThemeId::Dark);
    let rendered = markdown::render_markdown(&fixture(), 70, &palette);
    assert_eq!(rendered.link_urls.first().map(String::as_str), Some("https://example.com/docs"));
}

// ─── HTML export ─────────────────────────────────────────────────────────

#[test]
fn exported_document_has_no_script_vectors() {
    let html = markdown::render_document("sample", &fixture());
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>sample</title>"));
    assert!(html.contains("<h1>Sample Note</h1>"));
    assert!(html.contains("<table>"));
    assert!(!html.contains("<script"));
    assert!(!html.contains("onclick"));
    assert!(!html.contains("javascript:"));
}

#[test]
fn images_with_data_urls_are_kept_only_for_images() {
    let html = markdown::render_html(
        "![ok](data:image/png;base64,AAAA) [bad](data:text/html;base64,PHNjcmlwdD4=)",
    );
    assert!(html.contains("data:image/png"));
    assert!(!html.contains("data:text/html"));
}

#[test]
fn obfuscated_schemes_are_caught() {
    for url in [
        "javascript:alert(1)",
        "JavaScript:alert(1)",
        "  javascript:alert(1)",
        "java\tscript:alert(1)",
        "\u{1}javascript:alert(1)",
        "vbscript:msgbox",
        "data:text/html,<script>",
    ] {
        assert!(is_dangerous_url(url), "{url:?} should be dangerous");
    }
    for url in ["https://example.com", "notes/other.md", "#anchor", "data:image/gif;base64,R0"] {
        assert!(!is_dangerous_url(url), "{url:?} should be allowed");
    }
}

#[test]
fn title_is_escaped() {
    let html = markdown::render_document("<b>&", "body");
    assert!(html.contains("<title>&lt;b&gt;&amp;</title>"));
}
