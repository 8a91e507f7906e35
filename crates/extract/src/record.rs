// ABOUTME: Record struct holding one normalized listing extracted from a page, plus its outbound wire shape.
// ABOUTME: Field names are a wire contract with the downstream project store and must not change.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Classification applied to every freshly captured listing.
pub const DEFAULT_CLASSIFICATION_TAG: &str = "unrated";

/// Rank meaning "not ranked yet".
pub const UNRANKED: i64 = 9999;

/// Basis the listing price refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    /// Per square metre per year. The source pages cannot be told apart reliably,
    /// so this is assumed for every commercial listing.
    #[default]
    PerM2PerYear,
    Unknown,
}

impl fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceUnit::PerM2PerYear => "per_m2_per_year",
            PriceUnit::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A downloadable listing document (floor plan, brochure, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub url: String,
    pub filename: String,
}

/// One listing extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub source_url: String,
    pub listing_id: Option<String>,
    #[serde(with = "captured_at_format")]
    pub captured_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub address: Option<String>,
    pub price: Option<String>,
    pub price_unit: PriceUnit,
    pub usable_space: Option<String>,
    pub features: Vec<String>,
    pub attributes: IndexMap<String, String>,
    pub provider: Option<String>,
    pub images: IndexSet<String>,
    pub documents: Vec<DocumentLink>,
    pub classification_tag: String,
    pub display_rank: i64,
    pub rating: String,
}

impl Record {
    /// A record carrying only identity fields and the shared defaults.
    pub fn seeded(
        source_url: impl Into<String>,
        listing_id: Option<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            listing_id,
            captured_at,
            title: String::new(),
            description: String::new(),
            address: None,
            price: None,
            price_unit: PriceUnit::default(),
            usable_space: None,
            features: Vec::new(),
            attributes: IndexMap::new(),
            provider: None,
            images: IndexSet::new(),
            documents: Vec::new(),
            classification_tag: DEFAULT_CLASSIFICATION_TAG.to_string(),
            display_rank: UNRANKED,
            rating: String::new(),
        }
    }

    /// Capture time in the wire format (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub fn captured_at_text(&self) -> String {
        self.captured_at.format(captured_at_format::FORMAT).to_string()
    }

    /// Returns true if nothing beyond identity and defaults was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.description.is_empty()
            && self.address.is_none()
            && self.price.is_none()
            && self.features.is_empty()
            && self.attributes.is_empty()
            && self.images.is_empty()
            && self.documents.is_empty()
    }

    /// Returns true if a non-empty price was found.
    pub fn has_price(&self) -> bool {
        self.price.as_ref().map_or(false, |p| !p.is_empty())
    }

    /// Format the record as a markdown summary.
    pub fn format_markdown(&self) -> String {
        let mut parts = Vec::new();

        if !self.title.is_empty() {
            parts.push(format!("# {}", self.title));
        }

        let mut facts = Vec::new();
        if let Some(ref address) = self.address {
            facts.push(address.clone());
        }
        if let Some(ref price) = self.price {
            facts.push(format!("CHF {} ({})", price, self.price_unit));
        }
        if let Some(ref space) = self.usable_space {
            facts.push(format!("{} m²", space));
        }
        if !facts.is_empty() {
            parts.push(facts.join(" | "));
        }

        let mut source = format!("Source: {}", self.source_url);
        if let Some(ref id) = self.listing_id {
            source.push_str(&format!(" (#{})", id));
        }
        source.push_str(&format!(", captured {}", self.captured_at_text()));
        parts.push(source);

        if !self.description.is_empty() {
            parts.push(format!("> {}", self.description.replace('\n', "\n> ")));
        }

        if !self.features.is_empty() {
            let items: Vec<String> = self.features.iter().map(|f| format!("- {}", f)).collect();
            parts.push(format!("## Features\n\n{}", items.join("\n")));
        }

        if !self.attributes.is_empty() {
            let rows: Vec<String> = self
                .attributes
                .iter()
                .map(|(k, v)| format!("- {}: {}", k, v))
                .collect();
            parts.push(format!("## Attributes\n\n{}", rows.join("\n")));
        }

        if let Some(ref provider) = self.provider {
            parts.push(format!("## Provider\n\n{}", provider.replace('\n', ", ")));
        }

        if !self.documents.is_empty() {
            let links: Vec<String> = self
                .documents
                .iter()
                .map(|d| format!("- [{}]({})", d.filename, d.url))
                .collect();
            parts.push(format!("## Documents\n\n{}", links.join("\n")));
        }

        if !self.images.is_empty() {
            parts.push(format!("{} images", self.images.len()));
        }

        parts.join("\n\n")
    }
}

/// One record as sent to the downstream project store: every record field at the
/// top level plus the target project.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundListing<'a> {
    pub project_id: &'a str,
    #[serde(flatten)]
    pub record: &'a Record,
}

impl<'a> OutboundListing<'a> {
    pub fn new(project_id: &'a str, record: &'a Record) -> Self {
        Self { project_id, record }
    }
}

pub(crate) mod captured_at_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let naive =
            NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
    }
}
