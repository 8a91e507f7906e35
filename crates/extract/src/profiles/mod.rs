// ABOUTME: Site profile data models, the profile registry, and host-based profile selection.
// ABOUTME: A profile lists, per record field, the ordered strategies to try for one site family.

//! Site profiles.
//!
//! Each site family gets one [`Profile`]: plain serde data listing, per field,
//! the strategies to try in order. Keeping the chains as data means the two
//! profiles can be diffed, overridden from JSON, and tested strategy by strategy.

pub mod loader;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::selectors::precompile_selectors;
use crate::dom::LineMode;
use crate::record::PriceUnit;

/// Host substring identifying the homegate site family.
pub const HOMEGATE_MARKER: &str = "homegate.ch";

/// Site families with their own extraction profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileId {
    Homegate,
    Immoscout,
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProfileId::Homegate => "homegate",
            ProfileId::Immoscout => "immoscout",
        };
        write!(f, "{}", s)
    }
}

/// Picks the profile for a page host. Unknown hosts get the immoscout profile.
pub fn select_profile(host: &str) -> ProfileId {
    if host.to_lowercase().contains(HOMEGATE_MARKER) {
        ProfileId::Homegate
    } else {
        ProfileId::Immoscout
    }
}

/// One way of producing a text value from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldStrategy {
    /// Text or number at a key path in the structured metadata.
    Metadata { path: Vec<String> },
    /// Rendered text of the first element matching `selector`.
    FirstText { selector: String },
    /// The document `<title>`.
    DocumentTitle,
    /// Rendered text of the element following a labeled heading. With
    /// `parent_fallback`, an empty or missing sibling falls back to the
    /// heading's parent's next sibling.
    HeadingSibling {
        labels: Vec<String>,
        #[serde(default)]
        parent_fallback: bool,
    },
    /// Rendered text of the first `selector` match inside the labeled heading's
    /// enclosing element.
    HeadingSection {
        labels: Vec<String>,
        selector: String,
    },
    /// Rendered text of the first `selector` match with the first occurrence of
    /// each `strip` marker removed.
    StrippedText {
        selector: String,
        #[serde(default)]
        strip: Vec<String>,
    },
    /// Only the ASCII digits of the first `selector` match.
    Digits { selector: String },
    /// Only the digits of the first extracted attribute whose label contains
    /// `key_contains`.
    AttributeDigits { key_contains: String },
}

/// Ordered strategy chain for one text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    #[serde(default)]
    pub strategies: Vec<FieldStrategy>,
    /// How line breaks in rendered element text are joined.
    #[serde(default)]
    pub lines: LineMode,
}

/// A block located by a labeled heading (features list, attributes table, documents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub labels: Vec<String>,
}

/// Document links section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSpec {
    pub labels: Vec<String>,
    /// Substrings of the raw `href` that mark a link as a document candidate.
    pub link_markers: Vec<String>,
}

/// Listing photo collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Include image URLs from the structured metadata.
    #[serde(default)]
    pub metadata: bool,
    /// Host substrings that mark a page image as a listing photo.
    #[serde(default)]
    pub cdn_hosts: Vec<String>,
    /// Substrings that mark decorative site assets.
    #[serde(default)]
    pub exclude_markers: Vec<String>,
    /// Gallery container scanned first; the whole document is only scanned when
    /// the gallery yields nothing.
    #[serde(default)]
    pub gallery: Option<String>,
}

fn default_heading_selector() -> String {
    "h2".to_string()
}

/// The full extraction profile for one site family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    /// Elements considered when looking up section headings by label.
    #[serde(default = "default_heading_selector")]
    pub heading_selector: String,
    /// Structured-metadata block, if the site embeds one.
    #[serde(default)]
    pub metadata_selector: Option<String>,
    #[serde(default)]
    pub title: TextField,
    #[serde(default)]
    pub description: TextField,
    #[serde(default)]
    pub address: TextField,
    #[serde(default)]
    pub price: TextField,
    #[serde(default)]
    pub price_unit: PriceUnit,
    #[serde(default)]
    pub usable_space: TextField,
    #[serde(default)]
    pub provider: TextField,
    #[serde(default)]
    pub features: Option<SectionSpec>,
    #[serde(default)]
    pub attributes: Option<SectionSpec>,
    /// Attribute label under which usable space is recorded when the page has no
    /// attributes table entry for it.
    #[serde(default)]
    pub usable_space_attribute: Option<String>,
    #[serde(default)]
    pub images: ImageSpec,
    #[serde(default)]
    pub documents: Option<DocumentSpec>,
}

impl Profile {
    /// Every CSS selector the profile may evaluate.
    pub fn selectors(&self) -> Vec<String> {
        let mut out = vec![self.heading_selector.clone()];
        if let Some(ref sel) = self.metadata_selector {
            out.push(sel.clone());
        }
        for field in [
            &self.title,
            &self.description,
            &self.address,
            &self.price,
            &self.usable_space,
            &self.provider,
        ] {
            for strategy in &field.strategies {
                match strategy {
                    FieldStrategy::FirstText { selector }
                    | FieldStrategy::HeadingSection { selector, .. }
                    | FieldStrategy::StrippedText { selector, .. }
                    | FieldStrategy::Digits { selector } => out.push(selector.clone()),
                    _ => {}
                }
            }
        }
        if let Some(ref gallery) = self.images.gallery {
            out.push(gallery.clone());
        }
        out
    }
}

/// Registry for looking up profiles by id.
#[derive(Debug, Default, Clone)]
pub struct ProfileRegistry {
    map: HashMap<ProfileId, Profile>,
}

impl ProfileRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a profile, replacing any profile with the same id.
    pub fn register(&mut self, profile: Profile) {
        precompile_selectors(profile.selectors());
        self.map.insert(profile.id, profile);
    }

    /// Looks up a profile by id.
    pub fn get(&self, id: ProfileId) -> Option<&Profile> {
        self.map.get(&id)
    }

    /// Looks up the profile for a page host.
    pub fn for_host(&self, host: &str) -> Option<&Profile> {
        self.get(select_profile(host))
    }

    /// Returns the number of registered profiles.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no profiles are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
