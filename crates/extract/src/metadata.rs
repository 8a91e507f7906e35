// ABOUTME: Reader for the embedded JSON-LD listing block used as a last-resort field source.
// ABOUTME: Any failure to locate or parse the block degrades to empty metadata, never an error.

use serde_json::{Map, Value};
use tracing::debug;

use crate::dom::Page;
use crate::error::MetadataError;

/// Key/value view over the listing's structured metadata. Possibly empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingMetadata {
    fields: Map<String, Value>,
}

impl ListingMetadata {
    /// Reads the first block matching `selector`. Missing or malformed blocks yield
    /// empty metadata.
    pub fn read(page: &Page, selector: &str) -> Self {
        match Self::try_read(page, selector) {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                debug!(selector, "no structured metadata block");
                Self::default()
            }
            Err(err) => {
                debug!(selector, error = %err, "ignoring unreadable structured metadata");
                Self::default()
            }
        }
    }

    fn try_read(page: &Page, selector: &str) -> Result<Option<Self>, MetadataError> {
        let script = match page.query_first(selector) {
            Ok(Some(script)) => script,
            Ok(None) | Err(_) => return Ok(None),
        };
        let raw = script.text().collect::<String>();
        Self::parse(&raw).map(Some)
    }

    /// Parses a JSON-LD payload. A top-level array contributes its first object.
    pub fn parse(raw: &str) -> Result<Self, MetadataError> {
        let value: Value = serde_json::from_str(raw.trim())?;
        let fields = match value {
            Value::Object(map) => map,
            Value::Array(items) => items
                .into_iter()
                .find_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .ok_or(MetadataError::NotAnObject)?,
            _ => return Err(MetadataError::NotAnObject),
        };
        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value at a nested key path, e.g. `["offers", "price"]`.
    pub fn get(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get(first)?;
        for key in rest {
            current = current.as_object()?.get(key)?;
        }
        Some(current)
    }

    /// Trimmed, non-empty text at a key path. Numbers are rendered as-is.
    pub fn text(&self, path: &[String]) -> Option<String> {
        let text = match self.get(path)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Image URLs from the `image` key: a single string, a list of strings, or
    /// ImageObject entries carrying `url`/`contentUrl`.
    pub fn images(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(value) = self.fields.get("image") {
            collect_image_urls(value, &mut out);
        }
        out
    }
}

fn collect_image_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_image_urls(item, out);
            }
        }
        Value::Object(map) => {
            for key in ["url", "contentUrl"] {
                if let Some(Value::String(s)) = map.get(key) {
                    let trimmed = s.trim();
                    if !trimmed.is_empty() {
                        out.push(trimmed.to_string());
                        break;
                    }
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LD_SELECTOR: &str = r#"script[type="application/ld+json"][data-vmid="ld-json-listing"]"#;

    fn path(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn page_with(script: &str) -> Page {
        let html = format!(
            "<html><head>{}</head><body><h1>x</h1></body></html>",
            script
        );
        Page::parse(&html, "https://www.immoscout24.ch/rent/1").unwrap()
    }

    #[test]
    fn reads_designated_block() {
        let page = page_with(
            r#"<script type="application/ld+json">{"name":"Other"}</script>
               <script type="application/ld+json" data-vmid="ld-json-listing">
                 {"name":" Büro ","offers":{"price":2500},"image":"https://cdn.immoscout24.ch/a.jpg"}
               </script>"#,
        );
        let meta = ListingMetadata::read(&page, LD_SELECTOR);
        assert_eq!(meta.text(&path(&["name"])), Some("Büro".to_string()));
        assert_eq!(
            meta.text(&path(&["offers", "price"])),
            Some("2500".to_string())
        );
        assert_eq!(meta.images(), vec!["https://cdn.immoscout24.ch/a.jpg"]);
    }

    #[test]
    fn malformed_block_is_empty() {
        let page = page_with(
            r#"<script type="application/ld+json" data-vmid="ld-json-listing">{"name": </script>"#,
        );
        assert!(ListingMetadata::read(&page, LD_SELECTOR).is_empty());
    }

    #[test]
    fn missing_block_is_empty() {
        let page = page_with("");
        assert!(ListingMetadata::read(&page, LD_SELECTOR).is_empty());
    }

    #[test]
    fn invalid_selector_is_empty() {
        let page = page_with("");
        assert!(ListingMetadata::read(&page, "[[bad").is_empty());
    }

    #[test]
    fn scalar_payload_is_rejected() {
        assert!(matches!(
            ListingMetadata::parse("42"),
            Err(MetadataError::NotAnObject)
        ));
    }

    #[test]
    fn array_payload_uses_first_object() {
        let meta = ListingMetadata::parse(r#"[1, {"name":"Laden"}, {"name":"Lager"}]"#).unwrap();
        assert_eq!(meta.text(&path(&["name"])), Some("Laden".to_string()));
    }

    #[test]
    fn images_accept_lists_and_objects() {
        let meta = ListingMetadata::parse(
            r#"{"image":["https://a/1.jpg",{"url":"https://a/2.jpg"},{"contentUrl":"https://a/3.jpg"},"  "]}"#,
        )
        .unwrap();
        assert_eq!(
            meta.images(),
            vec!["https://a/1.jpg", "https://a/2.jpg", "https://a/3.jpg"]
        );
    }

    #[test]
    fn non_text_values_are_absent() {
        let meta = ListingMetadata::parse(r#"{"name":"","offers":{"price":null},"x":{"y":1}}"#)
            .unwrap();
        assert_eq!(meta.text(&path(&["name"])), None);
        assert_eq!(meta.text(&path(&["offers", "price"])), None);
        assert_eq!(meta.text(&path(&["x"])), None);
        assert_eq!(meta.text(&path(&["missing", "deeper"])), None);
        assert_eq!(meta.text(&[]), None);
    }
}
