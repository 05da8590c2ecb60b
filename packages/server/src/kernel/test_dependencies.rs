// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    BaseAI, BaseCrawler, BaseSearchService, CrawlJobStatus, CrawlOptions, CrawlStart,
    CrawledLink, CrawledPage, SearchResult, ServerDeps,
};
use crate::config::CrawlSettings;

/// Build a crawled page for fixtures.
pub fn mock_page(url: &str, title: &str, links: &[(&str, Option<&str>)]) -> CrawledPage {
    CrawledPage {
        url: url.to_string(),
        title: Some(title.to_string()),
        content: Some(format!("# {}\n\nMock content for {}", title, url)),
        status_code: 200,
        links: links
            .iter()
            .map(|(href, text)| CrawledLink {
                href: href.to_string(),
                text: text.map(str::to_string),
            })
            .collect(),
    }
}

// =============================================================================
// Mock Crawler
// =============================================================================

/// Arguments captured from a start_crawl call
#[derive(Debug, Clone)]
pub struct StartCrawlCall {
    pub url: String,
    pub options: CrawlOptions,
}

pub struct MockCrawler {
    start_responses: Mutex<VecDeque<Result<CrawlStart, String>>>,
    status_responses: Mutex<VecDeque<Result<CrawlJobStatus, String>>>,
    start_calls: Mutex<Vec<StartCrawlCall>>,
    status_calls: Mutex<Vec<String>>,
}

impl Default for MockCrawler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCrawler {
    pub fn new() -> Self {
        Self {
            start_responses: Mutex::new(VecDeque::new()),
            status_responses: Mutex::new(VecDeque::new()),
            start_calls: Mutex::new(Vec::new()),
            status_calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue an async job start.
    pub fn with_job(self, job_id: &str) -> Self {
        self.start_responses
            .lock()
            .unwrap()
            .push_back(Ok(CrawlStart::Job {
                id: job_id.to_string(),
            }));
        self
    }

    /// Queue a synchronous start that returns pages inline.
    pub fn with_inline_pages(self, pages: Vec<CrawledPage>) -> Self {
        self.start_responses
            .lock()
            .unwrap()
            .push_back(Ok(CrawlStart::Completed { pages }));
        self
    }

    pub fn with_start_error(self, message: &str) -> Self {
        self.start_responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Queue one `scraping` poll response.
    pub fn with_in_progress(self, completed: u32, total: u32) -> Self {
        self.with_status(CrawlJobStatus::InProgress {
            status: "scraping".to_string(),
            completed: Some(completed),
            total: Some(total),
        })
    }

    pub fn with_completed(self, pages: Vec<CrawledPage>) -> Self {
        self.with_status(CrawlJobStatus::Completed { pages })
    }

    pub fn with_failed(self, error: Option<&str>) -> Self {
        self.with_status(CrawlJobStatus::Failed {
            error: error.map(str::to_string),
        })
    }

    pub fn with_status(self, status: CrawlJobStatus) -> Self {
        self.status_responses.lock().unwrap().push_back(Ok(status));
        self
    }

    pub fn with_status_error(self, message: &str) -> Self {
        self.status_responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn start_calls(&self) -> Vec<StartCrawlCall> {
        self.start_calls.lock().unwrap().clone()
    }

    /// Job ids polled, in order.
    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseCrawler for MockCrawler {
    async fn start_crawl(&self, url: &str, options: &CrawlOptions) -> Result<CrawlStart> {
        self.start_calls.lock().unwrap().push(StartCrawlCall {
            url: url.to_string(),
            options: options.clone(),
        });

        match self.start_responses.lock().unwrap().pop_front() {
            Some(Ok(start)) => Ok(start),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(CrawlStart::Job {
                id: "mock-job".to_string(),
            }),
        }
    }

    async fn crawl_status(&self, job_id: &str) -> Result<CrawlJobStatus> {
        self.status_calls.lock().unwrap().push(job_id.to_string());

        // Once the queue drains the job looks stuck, which exercises timeouts
        match self.status_responses.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(CrawlJobStatus::InProgress {
                status: "scraping".to_string(),
                completed: None,
                total: None,
            }),
        }
    }
}

// =============================================================================
// Mock Search Service
// =============================================================================

pub struct MockSearchService {
    failing_queries: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
    configured: bool,
}

impl Default for MockSearchService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearchService {
    pub fn new() -> Self {
        Self {
            failing_queries: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    /// Behave like the no-op fallback.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Queries containing `pattern` fail.
    pub fn failing_on(self, pattern: &str) -> Self {
        self.failing_queries
            .lock()
            .unwrap()
            .push(pattern.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseSearchService for MockSearchService {
    async fn search(
        &self,
        query: &str,
        _max_results: Option<usize>,
        _search_depth: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        self.calls.lock().unwrap().push(query.to_string());

        let fails = self
            .failing_queries
            .lock()
            .unwrap()
            .iter()
            .any(|p| query.contains(p.as_str()));
        if fails {
            anyhow::bail!("Mock search failure for '{}'", query);
        }

        Ok(vec![SearchResult {
            title: format!("Result for {}", query),
            url: "https://research.example/article".to_string(),
            content: format!("Findings about {}", query),
            score: 0.9,
            published_date: None,
        }])
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

// =============================================================================
// Mock AI (Generic LLM capabilities)
// =============================================================================

pub struct MockAI {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<String>>,
    configured: bool,
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Add a text response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
        self
    }

    /// Add a JSON response to the queue (will be serialized)
    pub fn with_json_response<T: serde::Serialize>(self, data: &T) -> Self {
        let json = serde_json::to_string(data).expect("Failed to serialize mock response");
        self.with_response(json)
    }

    pub fn with_error(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Get all prompts that were sent to the AI
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of times the AI was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok("Mock AI response".to_string()),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for ServerDeps backed by mocks.
///
/// Polling runs with a 1ms interval so crawl timeouts resolve instantly.
pub struct TestDependencies {
    pub crawler: Arc<MockCrawler>,
    pub search: Arc<MockSearchService>,
    pub ai: Arc<MockAI>,
    pub crawl: CrawlSettings,
    pub analysis_page_limit: usize,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            crawler: Arc::new(MockCrawler::new()),
            search: Arc::new(MockSearchService::new()),
            ai: Arc::new(MockAI::new()),
            crawl: CrawlSettings {
                page_limit: 50,
                poll_interval: Duration::from_millis(1),
                max_poll_attempts: 5,
            },
            analysis_page_limit: 10,
        }
    }

    pub fn with_crawler(mut self, crawler: MockCrawler) -> Self {
        self.crawler = Arc::new(crawler);
        self
    }

    pub fn with_search(mut self, search: MockSearchService) -> Self {
        self.search = Arc::new(search);
        self
    }

    pub fn with_ai(mut self, ai: MockAI) -> Self {
        self.ai = Arc::new(ai);
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.crawl.max_poll_attempts = attempts;
        self
    }

    pub fn server_deps(&self, db_pool: PgPool) -> ServerDeps {
        ServerDeps::new(
            db_pool,
            self.crawler.clone(),
            self.search.clone(),
            self.ai.clone(),
            self.crawl.clone(),
            self.analysis_page_limit,
        )
    }
}
