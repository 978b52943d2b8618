use crate::pipeline::merge::MergedBeer;
use crate::types::{Field, SortMode};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Lowercased words of a style string or filter term. Words are split on
/// whitespace only and stripped of surrounding punctuation, so "new-england"
/// stays a single word.
fn words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Keeps beers whose consensus style shares at least one whole word with the
/// filter terms. No terms means no filtering.
pub fn filter_by_style(beers: Vec<MergedBeer>, terms: &[String]) -> Vec<MergedBeer> {
    let wanted: HashSet<String> = terms.iter().flat_map(|t| words(t)).collect();
    if wanted.is_empty() {
        return beers;
    }
    beers
        .into_iter()
        .filter(|beer| !words(beer.field(Field::Style)).is_disjoint(&wanted))
        .collect()
}

/// Descending by value with missing values last.
fn rated_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts best first. Stable: ties keep their incoming order.
pub fn rank(beers: &mut [MergedBeer], mode: SortMode) {
    match mode {
        SortMode::Unsorted => {}
        SortMode::Average => {
            beers.sort_by(|a, b| rated_desc(a.average_rating(), b.average_rating()));
        }
        SortMode::BySource(source) => {
            beers.sort_by(|a, b| {
                rated_desc(a.rating_of(source), b.rating_of(source))
                    .then_with(|| rated_desc(a.average_rating(), b.average_rating()))
            });
        }
    }
}
