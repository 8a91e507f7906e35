// ABOUTME: Main library entry point for the immo listing extraction engine.
// ABOUTME: Re-exports the public API: Extractor, ExtractorBuilder, Record, ExtractError, profiles and options.

//! Extracts normalized real-estate listing records from immoscout24.ch and
//! homegate.ch pages.
//!
//! Each site family has a [`Profile`] listing, per field, the strategies to try
//! in order. A failing field is logged and left empty instead of discarding the
//! rest of the record (see [`FailurePolicy`]).
//!
//! # Example
//!
//! ```no_run
//! use immo_extract::{Extractor, ExtractError};
//!
//! fn main() -> Result<(), ExtractError> {
//!     let html = std::fs::read_to_string("listing.html").unwrap_or_default();
//!     let extractor = Extractor::builder().build();
//!     let record = extractor.extract(&html, "https://www.homegate.ch/mieten/3002345678")?;
//!     println!("{}", record.format_markdown());
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod dom;
pub mod error;
pub mod extractor;
pub mod extractors;
pub mod metadata;
pub mod options;
pub mod profiles;
pub mod record;

pub use crate::dom::{decode_html, Page};
pub use crate::error::{ErrorCode, ExtractError, FieldError, MetadataError};
pub use crate::extractor::{extract, Extractor};
pub use crate::metadata::ListingMetadata;
pub use crate::options::{ExtractorBuilder, FailurePolicy, Options};
pub use crate::profiles::loader::{load_builtin_registry, load_registry_json};
pub use crate::profiles::{select_profile, Profile, ProfileId, ProfileRegistry};
pub use crate::record::{DocumentLink, OutboundListing, PriceUnit, Record};
