/// Site endpoints and markers shared across crawlers.
pub const UNTAPPD_BASE_URL: &str = "https://untappd.com";
pub const RATEBEER_BASE_URL: &str = "https://www.ratebeer.com";
pub const RATEBEER_GRAPHQL_URL: &str = "https://beta.ratebeer.com/v1/api/graphql/";
pub const BEERADVOCATE_BASE_URL: &str = "https://www.beeradvocate.com";
pub const BEERMENUS_BASE_URL: &str = "https://www.beermenus.com";
pub const WEB_SEARCH_URL: &str = "https://www.google.com/search";

/// Beer-page URL prefixes recognized in general web-search results
pub const UNTAPPD_BEER_PREFIX: &str = "https://untappd.com/b/";
pub const RATEBEER_BEER_PREFIX: &str = "https://www.ratebeer.com/beer/";
pub const BEERADVOCATE_BEER_PREFIX: &str = "https://www.beeradvocate.com/beer/";

pub const DEFAULT_USER_AGENT: &str = "brewscan/0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_CONFIG_FILE: &str = "brewscan.toml";
pub const CONFIG_ENV_VAR: &str = "BREWSCAN_CONFIG";

/// Lowercased body fragments that identify an access-denial page
pub const ACCESS_DENIED_MARKERS: [&str; 4] = [
    "access denied",
    "verify you are a human",
    "unusual traffic",
    "are you a robot",
];

/// True if a response status or body looks like the site refused to serve content.
pub fn looks_blocked(status: u16, body: &str) -> bool {
    if matches!(status, 403 | 429 | 503) {
        return true;
    }
    let lower = body.to_lowercase();
    ACCESS_DENIED_MARKERS.iter().any(|m| lower.contains(m))
}
