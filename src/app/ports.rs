use crate::error::Result;
use crate::types::{LookupOutcome, MenuItem, SourceName, Venue};
use async_trait::async_trait;
use std::collections::HashMap;

/// Fetch primitive shared by every crawler.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// GET with query parameters. Access-denial responses come back as
    /// `ScraperError::Blocked`; other statuses are returned as-is.
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpPage>;

    /// POST a JSON body and decode a JSON response.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value>;
}

#[derive(Clone, Debug)]
pub struct HttpPage {
    pub status: u16,
    /// URL after redirects
    pub final_url: String,
    pub body: String,
}

impl HttpPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One review site.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    fn source_name(&self) -> SourceName;

    /// Looks up a beer, fetching `known_page` directly when given and
    /// searching the site otherwise, or when that page turns out stale. Never
    /// fails: every failure mode maps to a `LookupOutcome`.
    async fn lookup(&self, beer: &str, known_page: Option<&str>) -> LookupOutcome;
}

/// General web search used to guess beer pages for several sources at once.
#[async_trait]
pub trait PageFinder: Send + Sync {
    /// Best-guess page per source; sources without a hit are absent.
    async fn find_pages(&self, beer: &str) -> HashMap<SourceName, String>;
}

/// Venue menu listing.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// Resolves a free-text query to one venue, or `ScraperError::VenueNotFound`.
    async fn find_venue(&self, query: &str) -> Result<Venue>;

    /// The venue's current beer list, in menu order.
    async fn list_menu(&self, venue: &Venue) -> Result<Vec<MenuItem>>;
}
