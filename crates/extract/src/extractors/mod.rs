// ABOUTME: Per-field extractors run by the record assembler.
// ABOUTME: Each extractor is a pure function of the page, the active profile and the structured metadata.

//! Field extractors.
//!
//! Submodules:
//! - `text`: scalar fields (title, description, address, price, usable space, provider)
//!   evaluated as ordered strategy chains.
//! - `sections`: heading-anchored features list and attributes table.
//! - `images`: listing photos from metadata and page images.
//! - `documents`: PDF links under the documents heading.

pub mod documents;
pub mod images;
pub mod sections;
pub mod text;

use indexmap::IndexMap;

use crate::dom::Page;
use crate::metadata::ListingMetadata;
use crate::profiles::Profile;

pub use documents::extract_documents;
pub use images::extract_images;
pub use sections::{extract_attributes, extract_features};
pub use text::{
    extract_address, extract_description, extract_price, extract_provider, extract_title,
    extract_usable_space,
};

/// Everything a field extractor may read.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub page: &'a Page,
    pub profile: &'a Profile,
    pub metadata: &'a ListingMetadata,
    /// Attributes extracted so far; only set once the attributes table has run.
    pub attributes: Option<&'a IndexMap<String, String>>,
}

impl<'a> FieldContext<'a> {
    pub fn new(page: &'a Page, profile: &'a Profile, metadata: &'a ListingMetadata) -> Self {
        Self {
            page,
            profile,
            metadata,
            attributes: None,
        }
    }

    pub fn with_attributes(self, attributes: &'a IndexMap<String, String>) -> Self {
        Self {
            attributes: Some(attributes),
            ..self
        }
    }
}
