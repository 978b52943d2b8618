use crate::error::ScraperError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Identifier of a data source: the three review sites plus the menu listing.
///
/// Declaration order is the default column order of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceName {
    Untappd,
    RateBeer,
    BeerAdvocate,
    /// Metadata carried by the venue's menu listing
    Menu,
}

/// Review sources queried for every beer, in column order.
pub const REVIEW_SOURCES: [SourceName; 3] = [
    SourceName::Untappd,
    SourceName::RateBeer,
    SourceName::BeerAdvocate,
];

impl SourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::Untappd => "untappd",
            SourceName::RateBeer => "ratebeer",
            SourceName::BeerAdvocate => "beeradvocate",
            SourceName::Menu => "menu",
        }
    }

    pub fn is_review_source(&self) -> bool {
        !matches!(self, SourceName::Menu)
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceName {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "untappd" => Ok(SourceName::Untappd),
            "ratebeer" => Ok(SourceName::RateBeer),
            "beeradvocate" => Ok(SourceName::BeerAdvocate),
            "menu" => Ok(SourceName::Menu),
            other => Err(ScraperError::Config(format!("unknown source '{}'", other))),
        }
    }
}

/// Recognized fields of a per-source stats record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Rating,
    Abv,
    Style,
    Where,
    Description,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Rating,
        Field::Abv,
        Field::Style,
        Field::Where,
        Field::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Rating => "rating",
            Field::Abv => "abv",
            Field::Style => "style",
            Field::Where => "where",
            Field::Description => "description",
        }
    }
}

/// Sparse field -> value mapping reported by one source for one beer.
///
/// A missing key means "not reported". Blank values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    fields: BTreeMap<Field, String>,
}

impl SourceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SourceRecord::insert`].
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() {
            self.fields.insert(field, value.to_string());
        }
    }

    pub fn set_opt(&mut self, field: Field, value: Option<String>) {
        if let Some(value) = value {
            self.insert(field, value);
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(|s| s.as_str())
    }

    /// Numeric rating, if the source reported one that parses.
    pub fn rating_value(&self) -> Option<f64> {
        self.get(Field::Rating)
            .and_then(|r| r.parse::<f64>().ok())
            .filter(|r| r.is_finite())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Result of asking one source about one beer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LookupOutcome {
    Found(SourceRecord),
    NotFound,
    /// The site served an access-denial page instead of content
    Blocked(String),
}

impl LookupOutcome {
    /// Wraps a parsed record, collapsing a page with no usable fields to `NotFound`.
    pub fn from_record(record: SourceRecord) -> Self {
        if record.is_empty() {
            LookupOutcome::NotFound
        } else {
            LookupOutcome::Found(record)
        }
    }

    pub fn record(&self) -> Option<&SourceRecord> {
        match self {
            LookupOutcome::Found(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, LookupOutcome::Blocked(_))
    }
}

/// Per-source outcomes for one beer.
pub type BeerRecord = BTreeMap<SourceName, LookupOutcome>;

/// Beer name -> per-source outcomes for the whole batch.
pub type Catalog = HashMap<String, BeerRecord>;

/// How a beer is served, derived from its serving entries' container labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServingKind {
    /// Draft, cask, crowler or growler
    Tap,
    /// Bottles and cans
    Packaged,
    #[default]
    Unknown,
}

impl ServingKind {
    /// Classifies a single container label (e.g. "Draft", "16oz Can").
    pub fn from_container(container: &str) -> Self {
        let label = container.to_lowercase();
        const TAP: [&str; 5] = ["draft", "draught", "cask", "crowler", "growler"];
        const PACKAGED: [&str; 3] = ["bottle", "can", "tallboy"];
        if TAP.iter().any(|t| label.contains(t)) {
            ServingKind::Tap
        } else if PACKAGED.iter().any(|p| label.contains(p)) {
            ServingKind::Packaged
        } else {
            ServingKind::Unknown
        }
    }
}

/// One (volume, container, price) offer of a beer at a venue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingEntry {
    pub volume: String,
    pub container: String,
    pub price: String,
}

/// A beer as listed on a venue menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub style: String,
    pub abv: String,
    /// Brewery location / provenance
    pub origin: String,
    pub servings: Vec<ServingEntry>,
    pub kind: ServingKind,
}

impl MenuItem {
    /// Menu metadata as a record of the `menu` pseudo-source.
    pub fn to_source_record(&self) -> SourceRecord {
        SourceRecord::new()
            .with(Field::Style, self.style.as_str())
            .with(Field::Abv, self.abv.as_str())
            .with(Field::Where, self.origin.as_str())
    }
}

/// A venue resolved from a free-text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub url: String,
}

/// Which servings to include in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServingFilter {
    #[default]
    Both,
    TapsOnly,
    PackagedOnly,
}

impl ServingFilter {
    pub fn accepts(&self, kind: ServingKind) -> bool {
        match self {
            ServingFilter::Both => true,
            ServingFilter::TapsOnly => kind == ServingKind::Tap,
            ServingFilter::PackagedOnly => kind == ServingKind::Packaged,
        }
    }
}

/// Ordering policy for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Keep menu / file order
    Unsorted,
    Average,
    BySource(SourceName),
}

impl FromStr for SortMode {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "avg" | "average" => Ok(SortMode::Average),
            "none" => Ok(SortMode::Unsorted),
            other => match other.parse::<SourceName>()? {
                SourceName::Menu => Err(ScraperError::Config(
                    "the menu carries no ratings to sort by".to_string(),
                )),
                source => Ok(SortMode::BySource(source)),
            },
        }
    }
}

/// Report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Simple,
    Fancy,
}
