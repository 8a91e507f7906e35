// ABOUTME: Collects downloadable PDF documents listed under the documents heading.
// ABOUTME: Each link yields an absolute URL and a filename that always ends in ".pdf".

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::dom::page::{next_sibling, parent_next_sibling, query_all_in, query_first_in};
use crate::dom::text_content;
use crate::error::FieldError;
use crate::extractors::FieldContext;
use crate::record::DocumentLink;

static PDF_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf($|\?)").unwrap());

/// Document links in page order.
///
/// The container is the element after the heading, or the element after the
/// heading's parent when the former holds no links. A link qualifies when its
/// raw `href` contains one of the profile's link markers and the resolved URL
/// ends in `.pdf` (optionally followed by a query string).
pub fn extract_documents(ctx: &FieldContext<'_>) -> Result<Vec<DocumentLink>, FieldError> {
    let spec = match ctx.profile.documents {
        Some(ref spec) => spec,
        None => return Ok(Vec::new()),
    };
    let heading = match ctx
        .page
        .heading_labeled(&ctx.profile.heading_selector, &spec.labels)?
    {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };
    let container = match document_container(heading)? {
        Some(el) => el,
        None => return Ok(Vec::new()),
    };

    let mut documents = Vec::new();
    for link in query_all_in(container, "a[href]")? {
        let href = link.value().attr("href").unwrap_or_default();
        if !spec
            .link_markers
            .iter()
            .any(|marker| href.contains(marker.as_str()))
        {
            continue;
        }
        let url = match ctx.page.resolve_url(href) {
            Some(url) => url,
            None => continue,
        };
        if !PDF_TARGET.is_match(&url) {
            continue;
        }
        if let Some(filename) = derive_filename(link, &url)? {
            documents.push(DocumentLink {
                url,
                filename: with_pdf_suffix(filename),
            });
        }
    }
    Ok(documents)
}

fn document_container(heading: ElementRef<'_>) -> Result<Option<ElementRef<'_>>, FieldError> {
    if let Some(sibling) = next_sibling(heading) {
        if query_first_in(sibling, "a")?.is_some() {
            return Ok(Some(sibling));
        }
    }
    Ok(parent_next_sibling(heading))
}

/// First usable name from: a `span` inside the link, the link text, the last
/// URL path segment. Text that still contains comment markup is skipped.
fn derive_filename(link: ElementRef<'_>, url: &str) -> Result<Option<String>, FieldError> {
    for span in query_all_in(link, "span")? {
        if let Some(name) = usable_name(text_content(span)) {
            return Ok(Some(name));
        }
    }
    if let Some(name) = usable_name(text_content(link)) {
        return Ok(Some(name));
    }
    Ok(url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string))
}

fn usable_name(text: String) -> Option<String> {
    if text.is_empty() || text.contains("<!--") {
        None
    } else {
        Some(text)
    }
}

fn with_pdf_suffix(name: String) -> String {
    if name.to_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{}.pdf", name)
    }
}
