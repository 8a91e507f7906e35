// ABOUTME: Page wraps a parsed HTML document and its URL and exposes the read-only primitives extractors use.
// ABOUTME: Heading lookup by label, sibling navigation, selector queries, rendered text and URL resolution.

use scraper::{ElementRef, Html};
use url::Url;

use crate::dom::selectors::compile;
use crate::dom::text::{inner_text, text_content, LineMode};
use crate::error::{ExtractError, FieldError};

/// A loaded listing page: the parsed document plus the URL it was read from.
#[derive(Debug)]
pub struct Page {
    html: Html,
    url: Url,
    source_url: String,
}

impl Page {
    /// Parses `html` read from `url`.
    ///
    /// The URL must be absolute; its host drives profile selection and relative
    /// links are resolved against it.
    pub fn parse(html: &str, url: &str) -> Result<Self, ExtractError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::invalid_url(url, "Page::parse", None));
        }
        let parsed = Url::parse(trimmed).map_err(|e| {
            ExtractError::invalid_url(url, "Page::parse", Some(anyhow::anyhow!("{}", e)))
        })?;
        Ok(Self {
            html: Html::parse_document(html),
            url: parsed,
            source_url: trimmed.to_string(),
        })
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL exactly as supplied by the caller (trimmed).
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Lowercased host of the page URL, empty when the URL has none.
    pub fn host(&self) -> String {
        self.url
            .host_str()
            .map(|h| h.to_lowercase())
            .unwrap_or_default()
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// All elements matching `css`, in document order.
    pub fn query_all(&self, css: &str) -> Result<Vec<ElementRef<'_>>, FieldError> {
        let sel = compile(css)?;
        Ok(self.html.select(&sel).collect())
    }

    /// First element matching `css`.
    pub fn query_first(&self, css: &str) -> Result<Option<ElementRef<'_>>, FieldError> {
        let sel = compile(css)?;
        Ok(self.html.select(&sel).next())
    }

    /// First heading (as matched by `heading_css`) whose rendered text satisfies `pred`.
    pub fn first_matching_heading<F>(
        &self,
        heading_css: &str,
        pred: F,
    ) -> Result<Option<ElementRef<'_>>, FieldError>
    where
        F: Fn(&str) -> bool,
    {
        let sel = compile(heading_css)?;
        Ok(self
            .html
            .select(&sel)
            .find(|h| pred(&inner_text(*h, LineMode::Keep))))
    }

    /// First heading whose text contains any of `labels` (case-sensitive substring).
    pub fn heading_labeled(
        &self,
        heading_css: &str,
        labels: &[String],
    ) -> Result<Option<ElementRef<'_>>, FieldError> {
        self.first_matching_heading(heading_css, |text| {
            labels.iter().any(|label| text.contains(label.as_str()))
        })
    }

    /// Text of the document's `<title>`.
    pub fn document_title(&self) -> Option<String> {
        let title = self.query_first("title").ok()??;
        let text = text_content(title);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Resolves a raw `href`/`src` value against the page URL.
    pub fn resolve_url(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("data:") {
            return Some(raw.to_string());
        }
        self.url.join(raw).ok().map(|u| u.to_string())
    }

    /// True when the document has neither elements nor text inside `<body>`.
    pub fn is_blank(&self) -> bool {
        let body = match self.query_first("body") {
            Ok(Some(body)) => body,
            _ => return true,
        };
        let has_elements = body.children().any(|c| c.value().is_element());
        let has_text = body.text().any(|t| !t.trim().is_empty());
        !has_elements && !has_text
    }
}

/// All descendants of `root` matching `css`, in document order.
pub fn query_all_in<'a>(root: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>, FieldError> {
    let sel = compile(css)?;
    Ok(root.select(&sel).collect())
}

/// First descendant of `root` matching `css`.
pub fn query_first_in<'a>(
    root: ElementRef<'a>,
    css: &str,
) -> Result<Option<ElementRef<'a>>, FieldError> {
    let sel = compile(css)?;
    Ok(root.select(&sel).next())
}

/// Next element sibling, skipping text and comment nodes.
pub fn next_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Parent element, if the parent is an element (not the document).
pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// Next element sibling of the element's parent.
///
/// Used where page variants wrap a heading one level deeper than others, so the
/// content sits beside the heading's parent instead of beside the heading.
pub fn parent_next_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    parent_element(el).and_then(next_sibling)
}

/// Rendered text of an element, trimmed, with line breaks handled per `mode`.
pub fn text(el: ElementRef<'_>, mode: LineMode) -> String {
    inner_text(el, mode)
}
