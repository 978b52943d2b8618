use crate::apis::base::{outcome_from_error, select_text, selector};
use crate::app::ports::{HttpClientPort, ReviewSource};
use crate::constants::{RATEBEER_BASE_URL, RATEBEER_GRAPHQL_URL};
use crate::error::Result;
use crate::types::{Field, LookupOutcome, SourceName, SourceRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

const BEER_SEARCH_QUERY: &str = "query beerSearch($query: String, $order: SearchOrder, $first: Int) { \
    searchResultsArr: beerSearch(query: $query, order: $order, first: $first) { \
    totalCount items { beer { id name overallScore ratingCount } } } }";

static RATING: Lazy<Selector> = Lazy::new(|| selector(r#"a[name="real average"] strong"#));
static ABV: Lazy<Selector> = Lazy::new(|| selector(r#"abbr[title="Alcohol By Volume"] ~ strong"#));
static STYLE: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="/beerstyles/"]"#));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").expect("static regex"));
static OUT_OF_FIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/5(\.0?)?$").expect("static regex"));

pub struct RateBeerCrawler {
    http: Arc<dyn HttpClientPort>,
}

impl RateBeerCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self { http }
    }

    async fn find_beer_page(&self, beer: &str) -> Result<Option<String>> {
        let request = json!({
            "query": BEER_SEARCH_QUERY,
            "variables": { "query": beer, "order": "MATCH", "first": 20 },
            "operationName": "beerSearch",
        });
        let response = self.http.post_json(RATEBEER_GRAPHQL_URL, &request).await?;
        Ok(parse_search_response(&response))
    }

    async fn fetch_stats(&self, page_url: &str) -> Result<SourceRecord> {
        let page = self.http.get(page_url, &[]).await?;
        if !page.is_success() {
            debug!(status = page.status, "beer page unavailable");
            return Ok(SourceRecord::new());
        }
        Ok(parse_beer_page(&page.body))
    }
}

#[async_trait::async_trait]
impl ReviewSource for RateBeerCrawler {
    fn source_name(&self) -> SourceName {
        SourceName::RateBeer
    }

    #[instrument(skip(self))]
    async fn lookup(&self, beer: &str, known_page: Option<&str>) -> LookupOutcome {
        if let Some(url) = known_page {
            match self.fetch_stats(url).await {
                Ok(record) if !record.is_empty() => return LookupOutcome::Found(record),
                Ok(_) => debug!(%url, "suggested page had nothing usable, searching the site"),
                Err(e) if e.is_blocked() => return outcome_from_error(self.source_name(), beer, e),
                Err(e) => debug!(%url, "suggested page failed ({}), searching the site", e),
            }
        }
        let page_url = match self.find_beer_page(beer).await {
            Ok(Some(url)) => url,
            Ok(None) => return LookupOutcome::NotFound,
            Err(e) => return outcome_from_error(self.source_name(), beer, e),
        };
        match self.fetch_stats(&page_url).await {
            Ok(record) => LookupOutcome::from_record(record),
            Err(e) => outcome_from_error(self.source_name(), beer, e),
        }
    }
}

/// Beer page URL for the top GraphQL search hit, `None` when nothing matched.
pub fn parse_search_response(response: &Value) -> Option<String> {
    let results = &response["data"]["searchResultsArr"];
    if results["totalCount"].as_u64().unwrap_or(0) == 0 {
        return None;
    }
    let top_hit = &results["items"].get(0)?["beer"];
    let name = top_hit["name"].as_str()?;
    let id = match &top_hit["id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(beer_page_url(name, &id))
}

/// `https://www.ratebeer.com/beer/<slug>/<id>/`
pub fn beer_page_url(name: &str, id: &str) -> String {
    let slug = NON_WORD.replace_all(name.trim(), "-").to_lowercase();
    format!(
        "{}/beer/{}/{}/",
        RATEBEER_BASE_URL,
        slug.trim_matches('-'),
        id
    )
}

/// Stats from a beer page. "-" and "N/A" mean unrated; "0" is a real score here.
pub fn parse_beer_page(html: &str) -> SourceRecord {
    let document = Html::parse_document(html);
    let mut record = SourceRecord::new();

    let rating = select_text(&document, &RATING)
        .map(|r| OUT_OF_FIVE.replace(&r, "").trim().to_string())
        .filter(|r| r != "-" && !r.eq_ignore_ascii_case("N/A"));
    record.set_opt(Field::Rating, rating);
    record.set_opt(Field::Abv, select_text(&document, &ABV));
    record.set_opt(Field::Style, select_text(&document, &STYLE));

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_page_url_from_top_hit() {
        let response = json!({
            "data": { "searchResultsArr": {
                "totalCount": 2,
                "items": [
                    { "beer": { "id": "7056", "name": "Russian River Pliny the Elder" } },
                    { "beer": { "id": "1", "name": "Other" } }
                ]
            }}
        });
        assert_eq!(
            parse_search_response(&response).as_deref(),
            Some("https://www.ratebeer.com/beer/russian-river-pliny-the-elder/7056/")
        );
    }

    #[test]
    fn zero_hits_is_not_found() {
        let response = json!({ "data": { "searchResultsArr": { "totalCount": 0, "items": [] } } });
        assert_eq!(parse_search_response(&response), None);
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(
            beer_page_url("Founders KBS (Kentucky Breakfast Stout)", "12"),
            "https://www.ratebeer.com/beer/founders-kbs-kentucky-breakfast-stout/12/"
        );
    }

    #[test]
    fn parses_beer_page_fields() {
        let html = r#"
            <div>
              <a name="real average">Avg: <strong>3.94/5.0</strong></a>
              <abbr title="Alcohol By Volume">ABV</abbr>: <strong>8%</strong>
              Style: <a href="/beerstyles/imperial-ipa/61/">Imperial IPA</a>
            </div>"#;
        let record = parse_beer_page(html);
        assert_eq!(record.get(Field::Rating), Some("3.94"));
        assert_eq!(record.get(Field::Abv), Some("8%"));
        assert_eq!(record.get(Field::Style), Some("Imperial IPA"));
    }

    #[test]
    fn dash_rating_is_unrated() {
        let html = r#"<a name="real average"><strong>-</strong></a>"#;
        assert_eq!(parse_beer_page(html).get(Field::Rating), None);
    }
}
