//! Server dependencies for background audit tasks (using traits for testability)
//!
//! This module provides the dependency container shared by the HTTP edges and
//! the background crawl, analysis and research tasks. All external services
//! sit behind trait objects so tests can swap in mocks.

use anyhow::Result;
use gemini_client::GeminiClient;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::{Config, CrawlSettings};
use crate::kernel::ai::{GeminiAI, NoopAI};
use crate::kernel::firecrawl_client::FirecrawlClient;
use crate::kernel::tavily_client::{NoopSearchService, TavilyClient};
use crate::kernel::{BaseAI, BaseCrawler, BaseSearchService};

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub crawler: Arc<dyn BaseCrawler>,
    pub search: Arc<dyn BaseSearchService>,
    pub ai: Arc<dyn BaseAI>,
    pub crawl: CrawlSettings,
    /// Max pages sent to the LLM per content analysis run
    pub analysis_page_limit: usize,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        crawler: Arc<dyn BaseCrawler>,
        search: Arc<dyn BaseSearchService>,
        ai: Arc<dyn BaseAI>,
        crawl: CrawlSettings,
        analysis_page_limit: usize,
    ) -> Self {
        Self {
            db_pool,
            crawler,
            search,
            ai,
            crawl,
            analysis_page_limit,
        }
    }

    /// Wire real vendor clients from configuration.
    ///
    /// Missing Tavily or Google keys fall back to no-op services; the
    /// endpoints that need them answer 503 instead of failing at startup.
    pub fn from_config(db_pool: PgPool, config: &Config) -> Result<Self> {
        let mut firecrawl = FirecrawlClient::new(config.firecrawl_api_key.clone())?;
        if let Some(base_url) = &config.firecrawl_base_url {
            firecrawl = firecrawl.with_base_url(base_url.clone());
        }

        let search: Arc<dyn BaseSearchService> = match &config.tavily_api_key {
            Some(key) => Arc::new(TavilyClient::new(key.clone())?),
            None => {
                tracing::warn!("TAVILY_API_KEY not set, market research disabled");
                Arc::new(NoopSearchService)
            }
        };

        let ai: Arc<dyn BaseAI> = match &config.google_api_key {
            Some(key) => Arc::new(GeminiAI::new(
                GeminiClient::new(key.clone())?,
                config.gemini_model.clone(),
            )),
            None => {
                tracing::warn!("GOOGLE_API_KEY not set, AI analysis disabled");
                Arc::new(NoopAI)
            }
        };

        Ok(Self::new(
            db_pool,
            Arc::new(firecrawl),
            search,
            ai,
            config.crawl.clone(),
            config.analysis_page_limit,
        ))
    }
}
