use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, DEFAULT_WORKERS,
};
use crate::error::{Result, ScraperError};
use crate::types::{ServingKind, SourceName, REVIEW_SOURCES};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runtime configuration. Every key has a default, so an absent file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Beers looked up concurrently
    pub workers: usize,
    /// Field fallback order, highest priority first
    pub precedence: Vec<SourceName>,
    /// Review sources to query, in report column order
    pub sources: Vec<SourceName>,
    /// Guess beer pages with one general web search before site searches
    pub web_search: bool,
    /// Directory for JSON log files; console only when unset
    pub log_dir: Option<String>,
    pub serving_overrides: ServingOverrides,
}

/// Venues known to mislabel their serving types: venue name -> container label -> kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ServingOverrides(HashMap<String, HashMap<String, ServingKind>>);

impl ServingOverrides {
    pub fn insert(&mut self, venue: &str, container: &str, kind: ServingKind) {
        self.0
            .entry(venue.to_string())
            .or_default()
            .insert(container.to_string(), kind);
    }

    /// Overrides for one venue (matched case-insensitively), keyed by lowercased label.
    pub fn for_venue(&self, venue_name: &str) -> HashMap<String, ServingKind> {
        self.0
            .iter()
            .find(|(venue, _)| venue.trim().eq_ignore_ascii_case(venue_name.trim()))
            .map(|(_, table)| {
                table
                    .iter()
                    .map(|(label, kind)| (label.trim().to_lowercase(), *kind))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            workers: DEFAULT_WORKERS,
            precedence: vec![
                SourceName::Untappd,
                SourceName::Menu,
                SourceName::RateBeer,
                SourceName::BeerAdvocate,
            ],
            sources: REVIEW_SOURCES.to_vec(),
            web_search: true,
            log_dir: None,
            serving_overrides: ServingOverrides::default(),
        }
    }
}

impl Config {
    /// Loads from an explicit path, then `$BREWSCAN_CONFIG`, then `./brewscan.toml`,
    /// falling back to defaults when none of them exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

        let config_path = match explicit {
            Some(p) => p,
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
                p
            }
        };

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        debug!(path = %config_path.display(), "Loaded config file");
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.precedence.is_empty() {
            return Err(ScraperError::Config("precedence must name at least one source".into()));
        }
        let mut seen = HashSet::new();
        for source in &self.precedence {
            if !seen.insert(source) {
                return Err(ScraperError::Config(format!(
                    "source '{}' appears twice in precedence",
                    source
                )));
            }
        }
        if self.sources.is_empty() {
            return Err(ScraperError::Config("sources must name at least one review site".into()));
        }
        if let Some(menu) = self.sources.iter().find(|s| !s.is_review_source()) {
            return Err(ScraperError::Config(format!(
                "'{}' is not a review site and can't be listed in sources",
                menu
            )));
        }
        if self.workers == 0 {
            return Err(ScraperError::Config("workers must be at least 1".into()));
        }
        Ok(())
    }
}
