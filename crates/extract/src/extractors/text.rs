// ABOUTME: Scalar text fields evaluated as ordered strategy chains from the active profile.
// ABOUTME: The first strategy producing non-blank text wins; later strategies are not evaluated.

use crate::dom::page::{next_sibling, parent_element, parent_next_sibling, query_first_in, text};
use crate::dom::LineMode;
use crate::error::FieldError;
use crate::extractors::FieldContext;
use crate::profiles::{FieldStrategy, TextField};

/// Runs a strategy chain and returns the first non-blank result.
pub fn evaluate(ctx: &FieldContext<'_>, field: &TextField) -> Result<Option<String>, FieldError> {
    for strategy in &field.strategies {
        if let Some(value) = apply(ctx, strategy, field.lines)? {
            let value = value.trim();
            if !value.is_empty() {
                return Ok(Some(value.to_string()));
            }
        }
    }
    Ok(None)
}

fn apply(
    ctx: &FieldContext<'_>,
    strategy: &FieldStrategy,
    lines: LineMode,
) -> Result<Option<String>, FieldError> {
    let page = ctx.page;
    let value = match strategy {
        FieldStrategy::Metadata { path } => ctx.metadata.text(path),
        FieldStrategy::FirstText { selector } => {
            page.query_first(selector)?.map(|el| text(el, lines))
        }
        FieldStrategy::DocumentTitle => page.document_title(),
        FieldStrategy::HeadingSibling {
            labels,
            parent_fallback,
        } => {
            let heading = match page.heading_labeled(&ctx.profile.heading_selector, labels)? {
                Some(h) => h,
                None => return Ok(None),
            };
            let direct = next_sibling(heading)
                .map(|el| text(el, lines))
                .filter(|t| !t.is_empty());
            if direct.is_none() && *parent_fallback {
                parent_next_sibling(heading).map(|el| text(el, lines))
            } else {
                direct
            }
        }
        FieldStrategy::HeadingSection { labels, selector } => {
            let heading = match page.heading_labeled(&ctx.profile.heading_selector, labels)? {
                Some(h) => h,
                None => return Ok(None),
            };
            match parent_element(heading) {
                Some(section) => query_first_in(section, selector)?.map(|el| text(el, lines)),
                None => None,
            }
        }
        FieldStrategy::StrippedText { selector, strip } => {
            page.query_first(selector)?.map(|el| {
                let mut value = text(el, lines);
                for marker in strip {
                    value = value.replacen(marker.as_str(), "", 1);
                }
                value.trim().to_string()
            })
        }
        FieldStrategy::Digits { selector } => {
            page.query_first(selector)?.map(|el| digits_only(&text(el, lines)))
        }
        FieldStrategy::AttributeDigits { key_contains } => ctx.attributes.and_then(|attrs| {
            attrs
                .iter()
                .find(|(label, _)| label.contains(key_contains.as_str()))
                .map(|(_, value)| digits_only(value))
        }),
    };
    Ok(value)
}

/// Keeps only the ASCII digits of `s`.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn extract_title(ctx: &FieldContext<'_>) -> Result<String, FieldError> {
    Ok(evaluate(ctx, &ctx.profile.title)?.unwrap_or_default())
}

pub fn extract_description(ctx: &FieldContext<'_>) -> Result<String, FieldError> {
    Ok(evaluate(ctx, &ctx.profile.description)?.unwrap_or_default())
}

pub fn extract_address(ctx: &FieldContext<'_>) -> Result<Option<String>, FieldError> {
    evaluate(ctx, &ctx.profile.address)
}

/// Price as displayed, currency and trailing dash removed. Thousands separators
/// are kept.
pub fn extract_price(ctx: &FieldContext<'_>) -> Result<Option<String>, FieldError> {
    evaluate(ctx, &ctx.profile.price)
}

/// Usable area in square metres, digits only.
///
/// Strategies reading the attributes table need `ctx` built with
/// [`FieldContext::with_attributes`].
pub fn extract_usable_space(ctx: &FieldContext<'_>) -> Result<Option<String>, FieldError> {
    evaluate(ctx, &ctx.profile.usable_space)
}

pub fn extract_provider(ctx: &FieldContext<'_>) -> Result<Option<String>, FieldError> {
    evaluate(ctx, &ctx.profile.provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::test_support::{page, profile, HOMEGATE_URL, IMMOSCOUT_URL};
    use crate::metadata::ListingMetadata;
    use crate::profiles::ProfileId;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    const LD_SELECTOR: &str = r#"script[type="application/ld+json"][data-vmid="ld-json-listing"]"#;

    #[test]
    fn title_prefers_metadata_then_h1_then_document_title() {
        let p = profile(ProfileId::Immoscout);

        let html = r#"<html><head><title>Seitentitel</title>
            <script type="application/ld+json" data-vmid="ld-json-listing">{"name":"Aus Metadaten"}</script>
            </head><body><h1>Überschrift</h1></body></html>"#;
        let pg = page(html, IMMOSCOUT_URL);
        let meta = ListingMetadata::read(&pg, LD_SELECTOR);
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_title(&ctx).unwrap(), "Aus Metadaten");

        let pg = page(
            "<html><head><title>Seitentitel</title></head><body><h1>  Überschrift </h1></body></html>",
            IMMOSCOUT_URL,
        );
        let meta = ListingMetadata::default();
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_title(&ctx).unwrap(), "Überschrift");

        let pg = page(
            "<html><head><title>Seitentitel</title></head><body><h1> </h1></body></html>",
            IMMOSCOUT_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_title(&ctx).unwrap(), "Seitentitel");
    }

    #[test]
    fn title_is_empty_without_any_source() {
        let p = profile(ProfileId::Homegate);
        let pg = page("<html><body><p>x</p></body></html>", HOMEGATE_URL);
        let meta = ListingMetadata::default();
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_title(&ctx).unwrap(), "");
    }

    #[test]
    fn description_uses_sibling_then_parent_sibling() {
        let p = profile(ProfileId::Homegate);
        let meta = ListingMetadata::default();

        let pg = page(
            "<body><h2>Beschreibung</h2><div><p>Helle Räume</p><p>Mit Lift</p></div></body>",
            HOMEGATE_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_description(&ctx).unwrap(), "Helle Räume\nMit Lift");

        let pg = page(
            "<body><div><h2>Beschreibung</h2></div><div>Ruhige Lage</div></body>",
            HOMEGATE_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_description(&ctx).unwrap(), "Ruhige Lage");
    }

    #[test]
    fn description_falls_back_to_metadata() {
        let p = profile(ProfileId::Immoscout);
        let pg = page("<body><h2>Lage</h2><p>x</p></body>", IMMOSCOUT_URL);
        let meta = ListingMetadata::parse(r#"{"description":"Aus JSON-LD"}"#).unwrap();
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_description(&ctx).unwrap(), "Aus JSON-LD");
    }

    #[test]
    fn address_lines_are_comma_joined() {
        let p = profile(ProfileId::Immoscout);
        let meta = ListingMetadata::default();
        let pg = page(
            "<body><address>Seestrasse 5<br>8002 Zürich</address></body>",
            IMMOSCOUT_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(
            extract_address(&ctx).unwrap(),
            Some("Seestrasse 5, 8002 Zürich".to_string())
        );
    }

    #[test]
    fn address_falls_back_to_heading_on_immoscout() {
        let p = profile(ProfileId::Immoscout);
        let meta = ListingMetadata::default();
        let pg = page(
            "<body><h2>Adresse</h2><p>Bahnhofplatz 1<br>3011 Bern</p></body>",
            IMMOSCOUT_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(
            extract_address(&ctx).unwrap(),
            Some("Bahnhofplatz 1, 3011 Bern".to_string())
        );
    }

    #[test]
    fn price_strips_currency_and_dash_once() {
        let p = profile(ProfileId::Homegate);
        let meta = ListingMetadata::default();
        let pg = page(
            r#"<body><span class="SpotlightAttributesPrice_value_x1">CHF 2'500.–</span></body>"#,
            HOMEGATE_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_price(&ctx).unwrap(), Some("2'500".to_string()));
    }

    #[test]
    fn price_on_request_is_kept_verbatim() {
        let p = profile(ProfileId::Homegate);
        let meta = ListingMetadata::default();
        let pg = page(
            r#"<body><div class="SpotlightAttributesPrice_value">Preis auf Anfrage</div></body>"#,
            HOMEGATE_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(
            extract_price(&ctx).unwrap(),
            Some("Preis auf Anfrage".to_string())
        );
    }

    #[test]
    fn price_falls_back_to_metadata_offer() {
        let p = profile(ProfileId::Immoscout);
        let pg = page("<body><h1>x</h1></body>", IMMOSCOUT_URL);
        let meta = ListingMetadata::parse(r#"{"offers":{"price":180}}"#).unwrap();
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_price(&ctx).unwrap(), Some("180".to_string()));
    }

    #[test]
    fn usable_space_from_spotlight_digits() {
        let p = profile(ProfileId::Homegate);
        let meta = ListingMetadata::default();
        let pg = page(
            r#"<body><span class="SpotlightAttributesUsableSpace_value">1'200 m²</span></body>"#,
            HOMEGATE_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_usable_space(&ctx).unwrap(), Some("1200".to_string()));
    }

    #[test]
    fn usable_space_from_attributes() {
        let p = profile(ProfileId::Immoscout);
        let meta = ListingMetadata::default();
        let pg = page("<body><h1>x</h1></body>", IMMOSCOUT_URL);
        let mut attrs = IndexMap::new();
        attrs.insert("Zimmer".to_string(), "3".to_string());
        attrs.insert("Nutzfläche:".to_string(), "120 m²".to_string());

        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(extract_usable_space(&ctx).unwrap(), None);

        let ctx = ctx.with_attributes(&attrs);
        assert_eq!(extract_usable_space(&ctx).unwrap(), Some("120".to_string()));
    }

    #[test]
    fn provider_is_address_inside_heading_section() {
        let p = profile(ProfileId::Immoscout);
        let meta = ListingMetadata::default();
        let pg = page(
            "<body><section><h2>Anbieter</h2><div><address>Muster AG<br>8000 Zürich</address></div></section></body>",
            IMMOSCOUT_URL,
        );
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert_eq!(
            extract_provider(&ctx).unwrap(),
            Some("Muster AG\n8000 Zürich".to_string())
        );
    }

    #[test]
    fn invalid_selector_is_a_field_error() {
        let mut p = profile(ProfileId::Homegate);
        p.address.strategies = vec![FieldStrategy::FirstText {
            selector: "[[nope".to_string(),
        }];
        let meta = ListingMetadata::default();
        let pg = page("<body><address>x</address></body>", HOMEGATE_URL);
        let ctx = FieldContext::new(&pg, &p, &meta);
        assert!(matches!(
            extract_address(&ctx),
            Err(FieldError::InvalidSelector(_))
        ));
    }

    #[test]
    fn digits_only_drops_everything_else() {
        assert_eq!(digits_only("ca. 1'250 m²"), "1250");
        assert_eq!(digits_only("auf Anfrage"), "");
    }
}
