use crate::apis::base::{
    absolute_url, element_text, labeled_value, outcome_from_error, select_text, selector,
};
use crate::app::ports::{HttpClientPort, HttpPage, ReviewSource};
use crate::constants::BEERADVOCATE_BASE_URL;
use crate::error::Result;
use crate::types::{Field, LookupOutcome, SourceName, SourceRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, instrument};

const PLACE_DIRECTORY_PATH: &str = "/place/directory/";

static REDIRECT_INPUT: Lazy<Selector> = Lazy::new(|| selector(r#"input[name="redirect"]"#));
static PROFILE_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="/beer/profile/"]"#));
static RATING: Lazy<Selector> = Lazy::new(|| selector("span.ba-ravg"));
static LABEL: Lazy<Selector> = Lazy::new(|| selector("b"));
// Beers are /beer/profile/<brewery_id>/<beer_id>/; breweries stop after the first id
static BEER_PROFILE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/beer/profile/\d+/\d+/?(?:[?#].*)?$").expect("static regex"));
static PLACE_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="/place/directory/"]"#));

/// What a site search landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchHit {
    /// Redirected (or pointed) straight at a beer profile
    Beer(String),
    /// Redirected to some other kind of page, e.g. a brewery or place
    OtherEntity(String),
    NoMatch,
}

pub struct BeerAdvocateCrawler {
    http: Arc<dyn HttpClientPort>,
}

impl BeerAdvocateCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self { http }
    }

    async fn search(&self, query: &str) -> Result<HttpPage> {
        let url = format!("{}/search/", BEERADVOCATE_BASE_URL);
        self.http.get(&url, &[("q", query), ("qt", "beer")]).await
    }

    /// Resolves the beer page. When the first search lands on a different
    /// entity type, retries once with an exact-phrase query and only accepts
    /// profile links from the result list.
    async fn find_beer_page(&self, beer: &str) -> Result<Option<String>> {
        let page = self.search(beer).await?;
        match classify_search(&page.final_url, &page.body) {
            SearchHit::Beer(url) => Ok(Some(url)),
            SearchHit::NoMatch => Ok(None),
            SearchHit::OtherEntity(url) => {
                debug!(%url, "search landed on a non-beer page, retrying");
                let quoted = format!("\"{}\"", beer);
                let retry = self.search(&quoted).await?;
                if is_beer_profile(&retry.final_url) {
                    return Ok(Some(retry.final_url));
                }
                Ok(first_profile_link(&retry.body))
            }
        }
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
impl ReviewSource for BeerAdvocateCrawler {
    fn source_name(&self) -> SourceName {
        SourceName::BeerAdvocate
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

/// True for a beer profile URL (absolute or site-relative); brewery
/// profiles share the `/beer/profile/` prefix but carry only one id.
fn is_beer_profile(url: &str) -> bool {
    BEER_PROFILE_PATH.is_match(url.trim_start_matches(BEERADVOCATE_BASE_URL))
}

fn first_profile_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let href = document
        .select(&PROFILE_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| is_beer_profile(href))?;
    Some(absolute_url(BEERADVOCATE_BASE_URL, href))
}

/// Classifies a search response by where it redirected (HTTP redirect or the
/// hidden `redirect` input), falling back to the first beer profile listed.
pub fn classify_search(final_url: &str, html: &str) -> SearchHit {
    if is_beer_profile(final_url) {
        return SearchHit::Beer(final_url.to_string());
    }
    if final_url
        .trim_start_matches(BEERADVOCATE_BASE_URL)
        .starts_with("/beer/profile/")
    {
        return SearchHit::OtherEntity(final_url.to_string());
    }

    let redirect = {
        let document = Html::parse_document(html);
        document
            .select(&REDIRECT_INPUT)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    if let Some(target) = redirect {
        let target = absolute_url(BEERADVOCATE_BASE_URL, &target);
        return if is_beer_profile(&target) {
            SearchHit::Beer(target)
        } else {
            SearchHit::OtherEntity(target)
        };
    }

    match first_profile_link(html) {
        Some(url) => SearchHit::Beer(url),
        None => SearchHit::NoMatch,
    }
}

/// Stats from a beer profile. A "0" average means not yet rated.
pub fn parse_beer_page(html: &str) -> SourceRecord {
    let document = Html::parse_document(html);
    let mut record = SourceRecord::new();

    let rating = select_text(&document, &RATING).filter(|r| r != "0" && r != "-");
    record.set_opt(Field::Rating, rating);
    record.set_opt(
        Field::Abv,
        labeled_value(&document, &LABEL, "Alcohol by volume (ABV):"),
    );
    record.set_opt(Field::Style, labeled_value(&document, &LABEL, "Style:"));

    // "state, country"
    let places: Vec<String> = document
        .select(&PLACE_LINK)
        .filter(|a| {
            a.value()
                .attr("href")
                .map_or(false, |h| h.len() > PLACE_DIRECTORY_PATH.len())
        })
        .map(|a| element_text(&a))
        .filter(|t| !t.is_empty())
        .collect();
    if !places.is_empty() {
        record.insert(Field::Where, places.join(", "));
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
        <div id="info_box">
          <b>Style:</b> <a href="/beer/styles/116/"><b>New England IPA</b></a><br>
          <b>Alcohol by volume (ABV):</b> 6.80%<br>
          <b>Score:</b> <span class="ba-score">95</span><br>
          <b>Avg:</b> <span class="ba-ravg">4.41</span><br>
          <a href="/place/directory/">Directory</a>
          <a href="/place/directory/9/US/MA/">Massachusetts</a>,
          <a href="/place/directory/9/US/">United States</a>
        </div>"#;

    #[test]
    fn parses_profile_fields() {
        let record = parse_beer_page(PROFILE);
        assert_eq!(record.get(Field::Rating), Some("4.41"));
        assert_eq!(record.get(Field::Abv), Some("6.80%"));
        assert_eq!(record.get(Field::Style), Some("New England IPA"));
        assert_eq!(record.get(Field::Where), Some("Massachusetts, United States"));
    }

    #[test]
    fn zero_average_is_unrated() {
        let record = parse_beer_page(r#"<span class="ba-ravg">0</span><b>Style:</b> Lager"#);
        assert_eq!(record.get(Field::Rating), None);
        assert_eq!(record.get(Field::Style), Some("Lager"));
    }

    #[test]
    fn http_redirect_to_profile_is_a_beer_hit() {
        let url = "https://www.beeradvocate.com/beer/profile/28743/136936/";
        assert_eq!(classify_search(url, ""), SearchHit::Beer(url.to_string()));
    }

    #[test]
    fn brewery_redirect_is_other_entity() {
        let url = "https://www.beeradvocate.com/beer/profile/1199/";
        assert_eq!(classify_search(url, ""), SearchHit::OtherEntity(url.to_string()));
        assert_eq!(
            classify_search(
                "https://www.beeradvocate.com/search/?q=x",
                r#"<input type="hidden" name="redirect" value="/beer/profile/1199/">"#
            ),
            SearchHit::OtherEntity("https://www.beeradvocate.com/beer/profile/1199/".into())
        );
    }

    #[test]
    fn result_list_skips_brewery_links() {
        let html = r#"<a href="/beer/profile/1199/">Founders Brewing</a>
                      <a href="/beer/profile/1199/5/">Founders Porter</a>"#;
        assert_eq!(
            classify_search("https://www.beeradvocate.com/search/?q=x", html),
            SearchHit::Beer("https://www.beeradvocate.com/beer/profile/1199/5/".into())
        );
    }

    #[test]
    fn redirect_input_to_place_is_other_entity() {
        let html = r#"<form><input type="hidden" name="redirect" value="/place/list/?brewery=1"></form>
                      <a href="/beer/profile/1/2/">Something</a>"#;
        assert_eq!(
            classify_search("https://www.beeradvocate.com/search/?q=x", html),
            SearchHit::OtherEntity("https://www.beeradvocate.com/place/list/?brewery=1".into())
        );
    }

    #[test]
    fn result_list_falls_back_to_first_profile_link() {
        let html = r#"<div id="ba-content">
            <a href="/beer/profile/22/333/">Beer One</a>
            <a href="/beer/profile/44/555/">Beer Two</a></div>"#;
        assert_eq!(
            classify_search("https://www.beeradvocate.com/search/?q=x", html),
            SearchHit::Beer("https://www.beeradvocate.com/beer/profile/22/333/".into())
        );
        assert_eq!(
            classify_search("https://www.beeradvocate.com/search/?q=x", "<p>none</p>"),
            SearchHit::NoMatch
        );
    }
}
