use crate::apis::base::selector;
use crate::app::ports::{HttpClientPort, PageFinder};
use crate::constants::{
    BEERADVOCATE_BEER_PREFIX, RATEBEER_BEER_PREFIX, UNTAPPD_BEER_PREFIX, WEB_SEARCH_URL,
};
use crate::types::SourceName;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

static RESULT_LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));

/// Beer-page URL prefix for each review source.
pub fn beer_page_prefix(source: SourceName) -> Option<&'static str> {
    match source {
        SourceName::Untappd => Some(UNTAPPD_BEER_PREFIX),
        SourceName::RateBeer => Some(RATEBEER_BEER_PREFIX),
        SourceName::BeerAdvocate => Some(BEERADVOCATE_BEER_PREFIX),
        SourceName::Menu => None,
    }
}

/// One general web search per beer, mined for each source's beer page.
pub struct WebSearchFinder {
    http: Arc<dyn HttpClientPort>,
    sources: Vec<SourceName>,
}

impl WebSearchFinder {
    pub fn new(http: Arc<dyn HttpClientPort>, sources: Vec<SourceName>) -> Self {
        Self { http, sources }
    }
}

#[async_trait::async_trait]
impl PageFinder for WebSearchFinder {
    #[instrument(skip(self))]
    async fn find_pages(&self, beer: &str) -> HashMap<SourceName, String> {
        match self.http.get(WEB_SEARCH_URL, &[("q", beer)]).await {
            Ok(page) => {
                let pages = parse_result_links(&page.body, &self.sources);
                debug!(hits = pages.len(), "web search done");
                pages
            }
            Err(e) => {
                warn!("web search failed, falling back to site search: {}", e);
                HashMap::new()
            }
        }
    }
}

/// Extracts the first result link per source. Handles both redirect-style
/// links (`/url?q=<target>&...`) and direct links; targets are percent-decoded.
pub fn parse_result_links(html: &str, sources: &[SourceName]) -> HashMap<SourceName, String> {
    let document = Html::parse_document(html);
    let targets: Vec<String> = document
        .select(&RESULT_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(link_target)
        .collect();

    let mut pages = HashMap::new();
    for source in sources {
        let Some(prefix) = beer_page_prefix(*source) else {
            continue;
        };
        if let Some(target) = targets.iter().find(|t| t.starts_with(prefix)) {
            pages.insert(*source, target.clone());
        }
    }
    pages
}

fn link_target(href: &str) -> Option<String> {
    if href.starts_with("/url?") {
        let url = Url::parse(&format!("https://www.google.com{}", href)).ok()?;
        return url
            .query_pairs()
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned());
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::REVIEW_SOURCES;

    #[test]
    fn mines_redirect_links_per_source() {
        let html = r#"
            <a href="/url?q=https://www.beeradvocate.com/beer/profile/22511/119443/&amp;sa=U">BA</a>
            <a href="/url?q=https://untappd.com/b/tree-house-julius/394519&amp;sa=U">Untappd</a>
            <a href="/url?q=https://untappd.com/b/other/1&amp;sa=U">Untappd 2</a>
            <a href="/url?q=https://www.facebook.com/treehouse&amp;sa=U">FB</a>"#;
        let pages = parse_result_links(html, &REVIEW_SOURCES);
        assert_eq!(
            pages.get(&SourceName::Untappd).map(String::as_str),
            Some("https://untappd.com/b/tree-house-julius/394519")
        );
        assert_eq!(
            pages.get(&SourceName::BeerAdvocate).map(String::as_str),
            Some("https://www.beeradvocate.com/beer/profile/22511/119443/")
        );
        assert!(!pages.contains_key(&SourceName::RateBeer));
    }

    #[test]
    fn decodes_percent_escapes() {
        let html = r#"<a href="/url?q=https://www.ratebeer.com/beer/fl%C3%B6ss/12/&amp;sa=U">RB</a>"#;
        let pages = parse_result_links(html, &[SourceName::RateBeer]);
        assert_eq!(
            pages.get(&SourceName::RateBeer).map(String::as_str),
            Some("https://www.ratebeer.com/beer/flöss/12/")
        );
    }

    #[test]
    fn no_hits_is_empty() {
        assert!(parse_result_links("<p>nothing</p>", &REVIEW_SOURCES).is_empty());
    }
}
