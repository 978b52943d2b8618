use crate::types::{
    BeerRecord, Catalog, Field, LookupOutcome, MenuItem, ServingEntry, ServingKind, SourceName,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Value of `field` from the highest-priority source in `precedence` that
/// reported it; `""` when none did.
pub fn pick_field<'a>(record: &'a BeerRecord, field: Field, precedence: &[SourceName]) -> &'a str {
    for source in precedence {
        if let Some(value) = record
            .get(source)
            .and_then(LookupOutcome::record)
            .and_then(|r| r.get(field))
        {
            return value;
        }
    }
    ""
}

/// Consensus view of one beer across all sources.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedBeer {
    pub name: String,
    /// Consensus value per field; fields no source reported are absent
    pub fields: BTreeMap<Field, String>,
    /// Rating reported by each review source that was asked
    pub ratings: BTreeMap<SourceName, Option<f64>>,
    /// Review sources that refused to serve this beer's pages
    pub blocked: BTreeSet<SourceName>,
    pub servings: Vec<ServingEntry>,
    pub kind: ServingKind,
    /// False when no source, menu included, knew anything about the beer
    pub has_data: bool,
}

impl MergedBeer {
    pub fn field(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn rating_of(&self, source: SourceName) -> Option<f64> {
        self.ratings.get(&source).copied().flatten()
    }

    /// Mean of the ratings that were reported; sources without one are left
    /// out rather than counted as zero. `None` when nothing was rated.
    pub fn average_rating(&self) -> Option<f64> {
        let rated: Vec<f64> = self.ratings.values().filter_map(|r| *r).collect();
        if rated.is_empty() {
            None
        } else {
            Some(rated.iter().sum::<f64>() / rated.len() as f64)
        }
    }
}

/// Merges the catalog and menu metadata into one record per beer, in
/// `beer_names` order. Pure: the same inputs always give the same output.
pub fn merge(
    beer_names: &[String],
    catalog: &Catalog,
    menu: &HashMap<String, MenuItem>,
    precedence: &[SourceName],
) -> Vec<MergedBeer> {
    beer_names
        .iter()
        .map(|name| merge_one(name, catalog.get(name), menu.get(name), precedence))
        .collect()
}

fn merge_one(
    name: &str,
    reviews: Option<&BeerRecord>,
    menu_item: Option<&MenuItem>,
    precedence: &[SourceName],
) -> MergedBeer {
    let mut record = reviews.cloned().unwrap_or_default();
    if let Some(item) = menu_item {
        record.insert(
            SourceName::Menu,
            LookupOutcome::from_record(item.to_source_record()),
        );
    }

    let fields = Field::ALL
        .iter()
        .filter_map(|field| {
            let value = pick_field(&record, *field, precedence);
            (!value.is_empty()).then(|| (*field, value.to_string()))
        })
        .collect();

    let ratings = record
        .iter()
        .filter(|(source, _)| source.is_review_source())
        .map(|(source, outcome)| {
            let rating = outcome.record().and_then(|r| r.rating_value());
            (*source, rating)
        })
        .collect();

    let blocked = record
        .iter()
        .filter(|(_, outcome)| outcome.is_blocked())
        .map(|(source, _)| *source)
        .collect();

    let has_data = record.values().any(|outcome| outcome.record().is_some());

    MergedBeer {
        name: name.to_string(),
        fields,
        ratings,
        blocked,
        servings: menu_item.map(|i| i.servings.clone()).unwrap_or_default(),
        kind: menu_item.map(|i| i.kind).unwrap_or_default(),
        has_data,
    }
}
