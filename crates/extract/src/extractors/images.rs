// ABOUTME: Collects listing photo URLs from structured metadata and page images.
// ABOUTME: Results are absolute, de-duplicated and kept in first-seen order.

use indexmap::IndexSet;
use scraper::ElementRef;

use crate::dom::page::query_all_in;
use crate::dom::Page;
use crate::error::FieldError;
use crate::extractors::FieldContext;
use crate::profiles::ImageSpec;

/// Attributes holding an image URL, most specific first. Lazy-loaded galleries
/// keep the real URL in `data-src` and a placeholder in `src`.
const SOURCE_ATTRIBUTES: &[&str] = &["data-src", "src"];

/// Listing photos.
///
/// Metadata images come first when the profile reads them. Page images are
/// taken from the gallery container when one is configured and yields
/// anything; otherwise every `img` on the page whose URL points at one of the
/// profile's CDN hosts is used.
pub fn extract_images(ctx: &FieldContext<'_>) -> Result<IndexSet<String>, FieldError> {
    let spec = &ctx.profile.images;
    let mut images = IndexSet::new();

    if spec.metadata {
        for raw in ctx.metadata.images() {
            if let Some(url) = ctx.page.resolve_url(&raw) {
                images.insert(url);
            }
        }
    }

    let mut page_images = Vec::new();
    if let Some(ref gallery) = spec.gallery {
        for container in ctx.page.query_all(gallery)? {
            for img in query_all_in(container, "img")? {
                if let Some(url) = image_source(ctx.page, img) {
                    if !is_excluded(spec, &url) {
                        page_images.push(url);
                    }
                }
            }
        }
    }
    if page_images.is_empty() {
        for img in ctx.page.query_all("img")? {
            if let Some(url) = image_source(ctx.page, img) {
                if is_listing_host(spec, &url) && !is_excluded(spec, &url) {
                    page_images.push(url);
                }
            }
        }
    }

    images.extend(page_images);
    Ok(images)
}

fn image_source(page: &Page, img: ElementRef<'_>) -> Option<String> {
    let raw = SOURCE_ATTRIBUTES
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())?;
    if raw.starts_with("data:") {
        return None;
    }
    page.resolve_url(raw)
}

/// An empty host list accepts every image.
fn is_listing_host(spec: &ImageSpec, url: &str) -> bool {
    spec.cdn_hosts.is_empty() || spec.cdn_hosts.iter().any(|host| url.contains(host.as_str()))
}

fn is_excluded(spec: &ImageSpec, url: &str) -> bool {
    spec.exclude_markers
        .iter()
        .any(|marker| url.contains(marker.as_str()))
}
