use std::env;
use std::path::PathBuf;

use crate::error::RaceFeedError;

const DEFAULT_CATALOG_PATH: &str = "races.json";
const DEFAULT_LISTING_URL: &str = "https://fullraces.com";
const DEFAULT_SEARCH_URL: &str = "https://watchf1full.com";
const DEFAULT_FILEMOON_API_URL: &str = "https://filemoonapi.com/api";
const DEFAULT_FILEMOON_EMBED_URL: &str = "https://filemoon.sx/e";

/// Scout configuration loaded from environment variables.
///
/// The remote-upload API key is not kept here; the mirror client reads it
/// when it is built.
#[derive(Debug, Clone)]
pub struct Config {
    // Persistence
    pub catalog_path: PathBuf,

    // Upstream sites
    pub listing_url: String,
    pub search_url: String,

    // Remote mirror
    pub filemoon_api_url: String,
    pub filemoon_embed_url: String,

    // Crawl limits
    pub fetch_attempts: u32,
    pub max_pages: Option<u32>,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// production defaults for anything unset.
    pub fn from_env() -> Result<Self, RaceFeedError> {
        Ok(Self {
            catalog_path: env::var("RACEFEED_CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH)),
            listing_url: env_or("RACEFEED_LISTING_URL", DEFAULT_LISTING_URL),
            search_url: env_or("RACEFEED_SEARCH_URL", DEFAULT_SEARCH_URL),
            filemoon_api_url: env_or("FILEMOON_API_URL", DEFAULT_FILEMOON_API_URL),
            filemoon_embed_url: env_or("FILEMOON_EMBED_URL", DEFAULT_FILEMOON_EMBED_URL),
            fetch_attempts: parse_env("RACEFEED_FETCH_ATTEMPTS")?.unwrap_or(1).max(1),
            max_pages: parse_env("RACEFEED_MAX_PAGES")?,
        })
    }

    /// Log the effective configuration.
    pub fn log(&self) {
        tracing::info!(
            catalog = %self.catalog_path.display(),
            listing = self.listing_url.as_str(),
            search = self.search_url.as_str(),
            filemoon_api = self.filemoon_api_url.as_str(),
            fetch_attempts = self.fetch_attempts,
            max_pages = ?self.max_pages,
            "Loaded config"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            filemoon_api_url: DEFAULT_FILEMOON_API_URL.to_string(),
            filemoon_embed_url: DEFAULT_FILEMOON_EMBED_URL.to_string(),
            fetch_attempts: 1,
            max_pages: None,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| default.to_string())
}

fn parse_env(key: &str) -> Result<Option<u32>, RaceFeedError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RaceFeedError::Config(format!("{key} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
