use crate::error::ScraperError;
use crate::types::{LookupOutcome, SourceName};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Parses a selector known at compile time.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid static selector {css}: {e:?}"))
}

/// Element text with runs of whitespace collapsed.
pub fn element_text(element: &ElementRef) -> String {
    let raw = element.text().collect::<String>();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Text of the first element matching `selector`, if any.
pub fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
}

/// Value that follows a label element such as `<b>Style:</b> <a>IPA</a>`:
/// the first non-blank text node or element after the label.
pub fn labeled_value(document: &Html, label_selector: &Selector, label: &str) -> Option<String> {
    let label_el = document
        .select(label_selector)
        .find(|el| element_text(el).eq_ignore_ascii_case(label))?;

    for sibling in label_el.next_siblings() {
        if let Some(text) = sibling.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                return Some(WHITESPACE.replace_all(text, " ").into_owned());
            }
        } else if let Some(element) = ElementRef::wrap(sibling) {
            let text = element_text(&element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Joins a site-relative href onto a base URL.
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

/// Converts a transport failure into the outcome reported for that source.
pub fn outcome_from_error(source: SourceName, beer: &str, err: ScraperError) -> LookupOutcome {
    if err.is_blocked() {
        warn!(%source, %beer, "{} blocked the lookup: {}", source, err);
        LookupOutcome::Blocked(err.to_string())
    } else {
        warn!(%source, %beer, "lookup failed, treating as not found: {}", err);
        LookupOutcome::NotFound
    }
}
