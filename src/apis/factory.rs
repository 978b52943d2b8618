use crate::apis::beeradvocate::BeerAdvocateCrawler;
use crate::apis::ratebeer::RateBeerCrawler;
use crate::apis::untappd::UntappdCrawler;
use crate::app::ports::{HttpClientPort, ReviewSource};
use crate::types::SourceName;
use std::sync::Arc;

/// Crawler for a review source; `None` for the menu pseudo-source.
pub fn create_source(
    source: SourceName,
    http: Arc<dyn HttpClientPort>,
) -> Option<Arc<dyn ReviewSource>> {
    match source {
        SourceName::Untappd => Some(Arc::new(UntappdCrawler::new(http))),
        SourceName::RateBeer => Some(Arc::new(RateBeerCrawler::new(http))),
        SourceName::BeerAdvocate => Some(Arc::new(BeerAdvocateCrawler::new(http))),
        SourceName::Menu => None,
    }
}

/// Crawlers for each named source, skipping any without one.
pub fn create_sources(
    sources: &[SourceName],
    http: Arc<dyn HttpClientPort>,
) -> Vec<Arc<dyn ReviewSource>> {
    sources
        .iter()
        .filter_map(|s| create_source(*s, http.clone()))
        .collect()
}
