// ABOUTME: Assembles one Record from a page by running every field extractor of a profile.
// ABOUTME: Each field runs inside its own failure boundary; see FailurePolicy for what a failure does.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::dom::Page;
use crate::error::{ExtractError, FieldError};
use crate::extractors::{
    extract_address, extract_attributes, extract_description, extract_documents,
    extract_features, extract_images, extract_price, extract_provider, extract_title,
    extract_usable_space, FieldContext,
};
use crate::metadata::ListingMetadata;
use crate::options::FailurePolicy;
use crate::profiles::Profile;
use crate::record::{DocumentLink, Record};

static LISTING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)/?$").unwrap());

/// Numeric listing id: the trailing run of digits in the URL path.
pub fn listing_id(url: &Url) -> Option<String> {
    LISTING_ID
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Builds a record for `page` using `profile`.
///
/// With [`FailurePolicy::Isolate`] this only fails if assembly itself breaks;
/// a failing field is logged and left at its default.
pub fn assemble(
    page: &Page,
    profile: &Profile,
    captured_at: DateTime<Utc>,
    policy: FailurePolicy,
) -> Result<Record, ExtractError> {
    let mut record = Record::seeded(page.source_url(), listing_id(page.url()), captured_at);
    record.price_unit = profile.price_unit;

    let metadata = match profile.metadata_selector {
        Some(ref selector) => ListingMetadata::read(page, selector),
        None => ListingMetadata::default(),
    };
    let ctx = FieldContext::new(page, profile, &metadata);
    let guard = FieldGuard {
        url: page.source_url(),
        policy,
    };

    record.title = guard.run("title", || extract_title(&ctx))?.unwrap_or_default();
    record.description = guard
        .run("description", || extract_description(&ctx))?
        .unwrap_or_default();
    record.address = guard.run("address", || extract_address(&ctx))?.flatten();
    record.price = guard.run("price", || extract_price(&ctx))?.flatten();
    record.features = guard
        .run("features", || extract_features(&ctx))?
        .unwrap_or_default();

    let mut attributes = guard
        .run("attributes", || extract_attributes(&ctx))?
        .unwrap_or_default();
    let with_attributes = ctx.with_attributes(&attributes);
    record.usable_space = guard
        .run("usable_space", || extract_usable_space(&with_attributes))?
        .flatten();
    record.provider = guard
        .run("provider", || extract_provider(&with_attributes))?
        .flatten();
    record.images = guard
        .run("images", || extract_images(&ctx))?
        .unwrap_or_default();
    record.documents = dedup_documents(
        guard
            .run("documents", || extract_documents(&ctx))?
            .unwrap_or_default(),
    );

    if let (Some(label), Some(space)) = (&profile.usable_space_attribute, &record.usable_space) {
        attributes
            .entry(label.clone())
            .or_insert_with(|| space.clone());
    }
    record.attributes = attributes;

    debug!(
        url = page.source_url(),
        profile = %profile.id,
        features = record.features.len(),
        images = record.images.len(),
        documents = record.documents.len(),
        "assembled listing record"
    );
    Ok(record)
}

/// Failure boundary around a single field extractor.
struct FieldGuard<'a> {
    url: &'a str,
    policy: FailurePolicy,
}

impl FieldGuard<'_> {
    /// Runs `f`, turning errors and panics into `Ok(None)` or an assembly error
    /// according to the policy.
    fn run<T, F>(&self, field: &str, f: F) -> Result<Option<T>, ExtractError>
    where
        F: FnOnce() -> Result<T, FieldError>,
    {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(payload) => Err(FieldError::Panicked(panic_message(payload))),
        };
        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(err) => match self.policy {
                FailurePolicy::Isolate => {
                    warn!(field, url = self.url, error = %err, "field extraction failed; keeping default");
                    Ok(None)
                }
                FailurePolicy::Abort => Err(ExtractError::assembly(
                    self.url,
                    "assemble",
                    Some(anyhow::anyhow!("field `{}`: {}", field, err)),
                )),
            },
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Keeps the first document for each URL.
fn dedup_documents(documents: Vec<DocumentLink>) -> Vec<DocumentLink> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|doc| seen.insert(doc.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::test_support::{page, profile, HOMEGATE_URL, IMMOSCOUT_URL};
    use crate::profiles::{FieldStrategy, ProfileId};
    use crate::record::{DEFAULT_CLASSIFICATION_TAG, UNRANKED};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn listing_id_is_trailing_number() {
        assert_eq!(
            listing_id(&url("https://www.immoscout24.ch/rent/4001234567")),
            Some("4001234567".to_string())
        );
        assert_eq!(
            listing_id(&url("https://www.homegate.ch/mieten/3002345678/?ref=list")),
            Some("3002345678".to_string())
        );
        assert_eq!(
            listing_id(&url("https://www.homegate.ch/mieten/buero-zuerich")),
            None
        );
        assert_eq!(listing_id(&url("https://www.homegate.ch/")), None);
    }

    #[test]
    fn empty_page_gets_defaults() {
        let pg = page("<body><p>Nichts</p></body>", HOMEGATE_URL);
        let record = assemble(
            &pg,
            &profile(ProfileId::Homegate),
            fixed_time(),
            FailurePolicy::Isolate,
        )
        .unwrap();
        assert_eq!(record.source_url, HOMEGATE_URL);
        assert_eq!(record.listing_id.as_deref(), Some("3002345678"));
        assert_eq!(record.captured_at_text(), "2024-06-01 12:00:00");
        assert_eq!(record.classification_tag, DEFAULT_CLASSIFICATION_TAG);
        assert_eq!(record.display_rank, UNRANKED);
        assert_eq!(record.rating, "");
        assert!(record.is_empty());
    }

    #[test]
    fn homegate_mirrors_usable_space_into_attributes() {
        let pg = page(
            r#"<body><span class="SpotlightAttributesUsableSpace_value">85 m²</span></body>"#,
            HOMEGATE_URL,
        );
        let record = assemble(
            &pg,
            &profile(ProfileId::Homegate),
            fixed_time(),
            FailurePolicy::Isolate,
        )
        .unwrap();
        assert_eq!(record.usable_space.as_deref(), Some("85"));
        assert_eq!(record.attributes["Nutzfläche"], "85");
    }

    #[test]
    fn immoscout_usable_space_comes_from_attributes() {
        let pg = page(
            "<body><h2>Hauptangaben</h2><dl><dt>Nutzfläche</dt><dd>240 m²</dd></dl></body>",
            IMMOSCOUT_URL,
        );
        let record = assemble(
            &pg,
            &profile(ProfileId::Immoscout),
            fixed_time(),
            FailurePolicy::Isolate,
        )
        .unwrap();
        assert_eq!(record.usable_space.as_deref(), Some("240"));
        assert_eq!(record.attributes["Nutzfläche"], "240 m²");
    }

    fn broken_profile() -> Profile {
        let mut p = profile(ProfileId::Homegate);
        p.price.strategies = vec![FieldStrategy::FirstText {
            selector: "[[broken".to_string(),
        }];
        p
    }

    #[test]
    fn failing_field_is_isolated() {
        let pg = page(
            "<body><h1>Laden</h1><address>Marktgasse 1</address></body>",
            HOMEGATE_URL,
        );
        let record = assemble(&pg, &broken_profile(), fixed_time(), FailurePolicy::Isolate)
            .unwrap();
        assert_eq!(record.title, "Laden");
        assert_eq!(record.address.as_deref(), Some("Marktgasse 1"));
        assert_eq!(record.price, None);
    }

    #[test]
    fn failing_field_aborts_when_asked() {
        let pg = page("<body><h1>Laden</h1></body>", HOMEGATE_URL);
        let err = assemble(&pg, &broken_profile(), fixed_time(), FailurePolicy::Abort)
            .unwrap_err();
        assert!(err.is_assembly());
        assert!(err.to_string().contains("field `price`"));
    }

    #[test]
    fn panics_are_contained_per_field() {
        let guard = FieldGuard {
            url: HOMEGATE_URL,
            policy: FailurePolicy::Isolate,
        };
        let value: Option<String> = guard
            .run("title", || -> Result<String, FieldError> { panic!("boom") })
            .unwrap();
        assert_eq!(value, None);

        let guard = FieldGuard {
            url: HOMEGATE_URL,
            policy: FailurePolicy::Abort,
        };
        let err = guard
            .run("title", || -> Result<String, FieldError> { panic!("boom") })
            .unwrap_err();
        assert!(err.message().contains("boom"));
    }

    #[test]
    fn documents_are_unique_by_url() {
        let docs = dedup_documents(vec![
            DocumentLink {
                url: "https://x/a.pdf".to_string(),
                filename: "A.pdf".to_string(),
            },
            DocumentLink {
                url: "https://x/a.pdf".to_string(),
                filename: "Kopie.pdf".to_string(),
            },
            DocumentLink {
                url: "https://x/b.pdf".to_string(),
                filename: "B.pdf".to_string(),
            },
        ]);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].filename, "A.pdf");
    }
}
