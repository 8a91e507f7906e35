// ABOUTME: Rendered-text helpers approximating a browser's innerText and textContent.
// ABOUTME: Block elements and <br> produce line breaks; inline whitespace collapses to single spaces.

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use serde::{Deserialize, Serialize};

/// Elements that start and end a line when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Elements whose content is never rendered.
const HIDDEN_TAGS: &[&str] = &["script", "style", "template", "noscript", "head"];

/// How rendered line breaks are represented in the returned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    /// Lines joined with `\n`.
    #[default]
    Keep,
    /// Lines joined with `", "` (address-style fields).
    CommaJoin,
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the rendered, non-empty lines of an element.
pub fn inner_text_lines(el: ElementRef<'_>) -> Vec<String> {
    let mut buf = String::new();
    render(*el, &mut buf);
    buf.split('\n')
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// innerText-like text of an element, lines joined according to `mode`.
pub fn inner_text(el: ElementRef<'_>, mode: LineMode) -> String {
    let lines = inner_text_lines(el);
    match mode {
        LineMode::Keep => lines.join("\n"),
        LineMode::CommaJoin => lines.join(", "),
    }
}

/// textContent-like text: every descendant text node, whitespace-normalized.
pub fn text_content(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

fn render(node: NodeRef<'_, Node>, buf: &mut String) {
    match node.value() {
        Node::Text(text) => {
            for ch in text.chars() {
                buf.push(if ch.is_whitespace() { ' ' } else { ch });
            }
        }
        Node::Element(el) => {
            let name = el.name();
            if HIDDEN_TAGS.contains(&name) {
                return;
            }
            if name == "br" {
                buf.push('\n');
                return;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                buf.push('\n');
            }
            for child in node.children() {
                render(child, buf);
            }
            if block {
                buf.push('\n');
            }
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                render(child, buf);
            }
        }
        _ => {}
    }
}
