use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// HS256 secret used by the auth provider to sign access tokens
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub firecrawl_api_key: String,
    pub firecrawl_base_url: Option<String>,
    pub tavily_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub crawl: CrawlSettings,
    pub analysis_page_limit: usize,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

/// Crawl job tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    pub page_limit: u32,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for CrawlSettings {
    /// 50 pages, polled every 5 seconds for up to 5 minutes.
    fn default() -> Self {
        Self {
            page_limit: 50,
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{} must be set", key));
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = CrawlSettings::default();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: parse_or("PORT", optional("PORT"), 8080)?,
            jwt_secret: required("SUPABASE_JWT_SECRET")?,
            jwt_audience: optional("JWT_AUDIENCE").unwrap_or_else(|| "authenticated".to_string()),
            firecrawl_api_key: required("FIRECRAWL_API_KEY")?,
            firecrawl_base_url: optional("FIRECRAWL_BASE_URL"),
            tavily_api_key: optional("TAVILY_API_KEY"),
            google_api_key: optional("GOOGLE_API_KEY"),
            gemini_model: optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            crawl: CrawlSettings {
                page_limit: parse_or("CRAWL_PAGE_LIMIT", optional("CRAWL_PAGE_LIMIT"), defaults.page_limit)?,
                poll_interval: Duration::from_secs(parse_or(
                    "CRAWL_POLL_INTERVAL_SECS",
                    optional("CRAWL_POLL_INTERVAL_SECS"),
                    defaults.poll_interval.as_secs(),
                )?),
                max_poll_attempts: parse_or(
                    "CRAWL_MAX_POLL_ATTEMPTS",
                    optional("CRAWL_MAX_POLL_ATTEMPTS"),
                    defaults.max_poll_attempts,
                )?,
            },
            analysis_page_limit: parse_or("ANALYSIS_PAGE_LIMIT", optional("ANALYSIS_PAGE_LIMIT"), 10)?,
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}
