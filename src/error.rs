use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("couldn't find that bar: {0}")]
    VenueNotFound(String),

    #[error("access denied by {url} (status {status})")]
    Blocked { url: String, status: u16 },

    #[error("API error: {message}")]
    Api { message: String },
}

impl ScraperError {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ScraperError::Blocked { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
