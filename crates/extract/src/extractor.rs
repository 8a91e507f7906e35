// ABOUTME: The Extractor entry point: picks the site profile for a page and assembles its Record.
// ABOUTME: Provides extract() for HTML strings and extract_page() for already-parsed pages.

use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::assembler::{assemble, panic_message};
use crate::dom::Page;
use crate::error::{ExtractError, FieldError};
use crate::options::{ExtractorBuilder, Options};
use crate::profiles::loader::load_builtin_registry;
use crate::profiles::{select_profile, ProfileRegistry};
use crate::record::Record;

static DEFAULT_EXTRACTOR: Lazy<Extractor> = Lazy::new(|| Extractor::builder().build());

/// Extracts listing records from real-estate pages.
#[derive(Debug, Clone)]
pub struct Extractor {
    opts: Options,
    registry: ProfileRegistry,
}

impl Extractor {
    /// Create a new ExtractorBuilder for configuring the extractor.
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::new()
    }

    /// Create a new Extractor with the given options.
    pub fn new(opts: Options) -> Self {
        let registry = opts.registry.clone().unwrap_or_else(load_builtin_registry);
        Self { opts, registry }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Extract a record from an HTML string read from `url`.
    pub fn extract(&self, html: &str, url: &str) -> Result<Record, ExtractError> {
        let page = Page::parse(html, url)?;
        self.extract_page(&page)
    }

    /// Extract a record from a parsed page.
    ///
    /// Empty documents and panics raised while assembling are reported as
    /// assembly errors.
    pub fn extract_page(&self, page: &Page) -> Result<Record, ExtractError> {
        let url = page.source_url();
        if page.is_blank() {
            return Err(ExtractError::assembly(
                url,
                "extract",
                Some(anyhow::anyhow!("document has no content")),
            ));
        }

        let id = select_profile(&page.host());
        let profile = self.registry.get(id).ok_or_else(|| {
            ExtractError::assembly(
                url,
                "extract",
                Some(FieldError::MissingProfile(id.to_string()).into()),
            )
        })?;
        debug!(url, profile = %id, policy = %self.opts.failure_policy, "extracting listing");

        let captured_at = self.opts.captured_at.unwrap_or_else(Utc::now);
        match panic::catch_unwind(AssertUnwindSafe(|| {
            assemble(page, profile, captured_at, self.opts.failure_policy)
        })) {
            Ok(result) => result,
            Err(payload) => Err(ExtractError::assembly(
                url,
                "extract",
                Some(anyhow::anyhow!(
                    "panic during assembly: {}",
                    panic_message(payload)
                )),
            )),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Extract a record with the builtin profiles and default options.
pub fn extract(html: &str, url: &str) -> Result<Record, ExtractError> {
    DEFAULT_EXTRACTOR.extract(html, url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FailurePolicy;
    use crate::profiles::ProfileId;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_assembly_error() {
        let err = extract("", "https://www.homegate.ch/mieten/1").unwrap_err();
        assert!(err.is_assembly());
        let err = extract("<html><body>  </body></html>", "https://www.homegate.ch/mieten/1")
            .unwrap_err();
        assert!(err.is_assembly());
    }

    #[test]
    fn bad_url_is_invalid_url_error() {
        assert!(extract("<h1>x</h1>", "").unwrap_err().is_invalid_url());
        assert!(extract("<h1>x</h1>", "not a url").unwrap_err().is_invalid_url());
    }

    #[test]
    fn missing_profile_is_assembly_error() {
        let extractor = Extractor::builder()
            .registry(ProfileRegistry::new())
            .build();
        let err = extractor
            .extract("<h1>x</h1>", "https://www.immoscout24.ch/rent/1")
            .unwrap_err();
        assert!(err.is_assembly());
        assert!(err.message().contains("immoscout"));
    }

    #[test]
    fn fixed_capture_time_is_used() {
        let at = Utc.with_ymd_and_hms(2023, 12, 24, 18, 30, 0).unwrap();
        let extractor = Extractor::builder()
            .captured_at(at)
            .failure_policy(FailurePolicy::Abort)
            .build();
        let record = extractor
            .extract("<h1>Lager</h1>", "https://www.homegate.ch/mieten/3002345678")
            .unwrap();
        assert_eq!(record.captured_at_text(), "2023-12-24 18:30:00");
        assert_eq!(record.title, "Lager");
        assert_eq!(extractor.registry().len(), 2);
        assert!(extractor.registry().get(ProfileId::Homegate).is_some());
    }
}
