// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Audit orchestration lives in domains/scans/actions and drives these traits.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseCrawler)

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// =============================================================================
// Crawler Trait (Infrastructure - site crawling API)
// =============================================================================

/// Options sent when starting a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of pages to crawl
    pub limit: u32,
    /// Output formats requested per page (markdown, html, links)
    pub formats: Vec<String>,
    pub only_main_content: bool,
}

impl CrawlOptions {
    /// Markdown, HTML and links for up to `limit` pages, main content only.
    pub fn audit(limit: u32) -> Self {
        Self {
            limit,
            formats: vec!["markdown".into(), "html".into(), "links".into()],
            only_main_content: true,
        }
    }
}

/// An outgoing link found on a crawled page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledLink {
    pub href: String,
    pub text: Option<String>,
}

/// A single crawled page as returned by the crawler.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawledPage {
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status_code: i32,
    pub links: Vec<CrawledLink>,
}

/// Response to starting a crawl.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlStart {
    /// Asynchronous crawl; poll `crawl_status` with this job id
    Job { id: String },
    /// The crawler answered synchronously with the pages
    Completed { pages: Vec<CrawledPage> },
}

/// Status of an asynchronous crawl job.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlJobStatus {
    /// Still running (`scraping` or any other non-terminal status)
    InProgress {
        status: String,
        completed: Option<u32>,
        total: Option<u32>,
    },
    Completed { pages: Vec<CrawledPage> },
    Failed { error: Option<String> },
}

#[async_trait]
pub trait BaseCrawler: Send + Sync {
    /// Start crawling `url`.
    async fn start_crawl(&self, url: &str, options: &CrawlOptions) -> Result<CrawlStart>;

    /// Fetch the current status of a crawl job.
    async fn crawl_status(&self, job_id: &str) -> Result<CrawlJobStatus>;
}

// =============================================================================
// Search Service Trait (Infrastructure - web search API)
// =============================================================================

/// Search result, stored verbatim as an insight source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

#[async_trait]
pub trait BaseSearchService: Send + Sync {
    /// Search the web. `search_depth` is "basic" or "advanced".
    async fn search(
        &self,
        query: &str,
        max_results: Option<usize>,
        search_depth: Option<&str>,
    ) -> Result<Vec<SearchResult>>;

    /// False for the no-op fallback used when no API key is configured.
    fn is_configured(&self) -> bool {
        true
    }
}

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier recorded next to generated rows.
    fn model_name(&self) -> &str;

    /// False for the no-op fallback used when no API key is configured.
    fn is_configured(&self) -> bool {
        true
    }
}
