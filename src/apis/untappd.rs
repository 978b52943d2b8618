use crate::apis::base::{absolute_url, element_text, outcome_from_error, select_text, selector};
use crate::app::ports::{HttpClientPort, ReviewSource};
use crate::constants::UNTAPPD_BASE_URL;
use crate::error::Result;
use crate::types::{Field, LookupOutcome, SourceName, SourceRecord};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, instrument};

static SEARCH_HIT: Lazy<Selector> = Lazy::new(|| selector("p.name a"));
static RATING: Lazy<Selector> = Lazy::new(|| selector("span.num"));
static ABV: Lazy<Selector> = Lazy::new(|| selector("p.abv"));
static STYLE: Lazy<Selector> = Lazy::new(|| selector("p.style"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector("div.beer-descrption-read-less"));

pub struct UntappdCrawler {
    http: Arc<dyn HttpClientPort>,
}

impl UntappdCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self { http }
    }

    async fn find_beer_page(&self, beer: &str) -> Result<Option<String>> {
        let url = format!("{}/search", UNTAPPD_BASE_URL);
        let page = self.http.get(&url, &[("q", beer)]).await?;
        Ok(parse_search_results(&page.body))
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
impl ReviewSource for UntappdCrawler {
    fn source_name(&self) -> SourceName {
        SourceName::Untappd
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

/// Top beer hit of a search results page.
pub fn parse_search_results(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&SEARCH_HIT)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.starts_with("/b/"))
        .map(|href| absolute_url(UNTAPPD_BASE_URL, href))
}

/// Stats from a beer page. "N/A" ratings mean unrated and are dropped.
pub fn parse_beer_page(html: &str) -> SourceRecord {
    let document = Html::parse_document(html);
    let mut record = SourceRecord::new();

    let rating = select_text(&document, &RATING)
        .map(|r| r.replace(['(', ')'], "").trim().to_string())
        .filter(|r| !r.eq_ignore_ascii_case("N/A"));
    record.set_opt(Field::Rating, rating);

    let abv = select_text(&document, &ABV)
        .map(|a| a.trim_end_matches("ABV").trim().to_string())
        .filter(|a| !a.eq_ignore_ascii_case("N/A"));
    record.set_opt(Field::Abv, abv);

    record.set_opt(Field::Style, select_text(&document, &STYLE));

    let description = document.select(&DESCRIPTION).next().map(|el| {
        element_text(&el)
            .trim_end_matches("Show Less")
            .trim()
            .to_string()
    });
    record.set_opt(Field::Description, description);

    record
}
