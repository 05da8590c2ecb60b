use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{BaseSearchService, SearchResult};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Tavily API client for web search
pub struct TavilyClient {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
}

/// Tavily search depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum SearchDepth {
    Basic,
    Advanced,
}

impl SearchDepth {
    fn parse(depth: Option<&str>) -> Self {
        match depth {
            Some("advanced") => Self::Advanced,
            _ => Self::Basic,
        }
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: SearchDepth,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    published_date: Option<String>,
}

impl From<TavilyResult> for SearchResult {
    fn from(r: TavilyResult) -> Self {
        SearchResult {
            title: r.title,
            url: r.url,
            content: r.content,
            score: r.score,
            published_date: r.published_date,
        }
    }
}

impl TavilyClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            endpoint: TAVILY_SEARCH_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl BaseSearchService for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: Option<usize>,
        search_depth: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: SearchDepth::parse(search_depth),
            max_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("Failed to send Tavily search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Tavily API error {}: {}", status, body);
        }

        let tavily_response: TavilyResponse = response
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        Ok(tavily_response
            .results
            .into_iter()
            .map(SearchResult::from)
            .collect())
    }
}

/// No-op search service for when the API key is not configured
pub struct NoopSearchService;

#[async_trait]
impl BaseSearchService for NoopSearchService {
    async fn search(
        &self,
        _query: &str,
        _max_results: Option<usize>,
        _search_depth: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        tracing::warn!("NoopSearchService: search called but no Tavily API key configured");
        Ok(vec![])
    }

    fn is_configured(&self) -> bool {
        false
    }
}
