//! Firecrawl v1 crawl API client.
//!
//! Only the two calls the audit needs: `POST /crawl` to start a job and
//! `GET /crawl/{id}` to poll it. Completed jobs with large result sets are
//! paginated by Firecrawl through a `next` URL, which is followed here so
//! callers always see the full page list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{BaseCrawler, CrawlJobStatus, CrawlOptions, CrawlStart, CrawledLink, CrawledPage};

const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev/v1";

/// Upper bound on `next` pages followed for one job.
const MAX_RESULT_PAGES: usize = 20;

pub struct FirecrawlClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

// Request/Response types for Firecrawl API

#[derive(Serialize)]
struct CrawlRequest<'a> {
    url: &'a str,
    limit: u32,
    #[serde(rename = "scrapeOptions")]
    scrape_options: ScrapeOptions<'a>,
}

#[derive(Serialize)]
struct ScrapeOptions<'a> {
    formats: &'a [String],
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct CrawlStartResponse {
    #[serde(default)]
    success: bool,
    id: Option<String>,
    error: Option<String>,
    #[serde(default)]
    data: Vec<PageData>,
}

#[derive(Debug, Deserialize)]
struct CrawlStatusResponse {
    status: String,
    completed: Option<u32>,
    total: Option<u32>,
    #[serde(default)]
    data: Vec<PageData>,
    next: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PageData {
    url: Option<String>,
    markdown: Option<String>,
    content: Option<String>,
    #[serde(default)]
    links: Vec<LinkEntry>,
    metadata: Option<PageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct PageMetadata {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
    #[serde(rename = "statusCode")]
    status_code: Option<i32>,
    #[serde(default)]
    links: Vec<LinkEntry>,
}

/// Links come back either as bare URLs (`links` format) or as objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    Href(String),
    Object {
        href: Option<String>,
        text: Option<String>,
    },
}

impl FirecrawlClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: FIRECRAWL_API_URL.to_string(),
        })
    }

    /// Override the API base URL (self-hosted Firecrawl, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<R: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<R> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .context("Failed to send Firecrawl status request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Status check failed: {} {}", status.as_u16(), body);
        }

        response
            .json()
            .await
            .context("Failed to parse Firecrawl status response")
    }
}

#[async_trait]
impl BaseCrawler for FirecrawlClient {
    async fn start_crawl(&self, url: &str, options: &CrawlOptions) -> Result<CrawlStart> {
        let request = CrawlRequest {
            url,
            limit: options.limit,
            scrape_options: ScrapeOptions {
                formats: &options.formats,
                only_main_content: options.only_main_content,
            },
        };

        let response = self
            .client
            .post(format!("{}/crawl", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to send Firecrawl crawl request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Firecrawl API error: {} {}", status.as_u16(), body);
        }

        let start: CrawlStartResponse = response
            .json()
            .await
            .context("Failed to parse Firecrawl crawl response")?;

        parse_start_response(start)
    }

    async fn crawl_status(&self, job_id: &str) -> Result<CrawlJobStatus> {
        let mut status: CrawlStatusResponse = self
            .get_json(&format!("{}/crawl/{}", self.base_url, job_id))
            .await?;

        if status.status == "completed" {
            let mut next = status.next.take();
            let mut followed = 0;
            while let Some(next_url) = next {
                if followed >= MAX_RESULT_PAGES {
                    debug!(job_id = %job_id, "Stopped following crawl result pages");
                    break;
                }
                let more: CrawlStatusResponse = self.get_json(&next_url).await?;
                status.data.extend(more.data);
                next = more.next;
                followed += 1;
            }
        }

        Ok(parse_status_response(status))
    }
}

fn parse_start_response(start: CrawlStartResponse) -> Result<CrawlStart> {
    if !start.success {
        anyhow::bail!(
            "Firecrawl failed: {}",
            start.error.as_deref().unwrap_or("unknown error")
        );
    }

    match start.id {
        Some(id) => Ok(CrawlStart::Job { id }),
        None => Ok(CrawlStart::Completed {
            pages: start.data.into_iter().filter_map(into_crawled_page).collect(),
        }),
    }
}

fn parse_status_response(status: CrawlStatusResponse) -> CrawlJobStatus {
    match status.status.as_str() {
        "completed" => CrawlJobStatus::Completed {
            pages: status.data.into_iter().filter_map(into_crawled_page).collect(),
        },
        "failed" | "cancelled" => CrawlJobStatus::Failed {
            error: status.error,
        },
        _ => CrawlJobStatus::InProgress {
            status: status.status,
            completed: status.completed,
            total: status.total,
        },
    }
}

/// Pages without any URL are dropped.
fn into_crawled_page(data: PageData) -> Option<CrawledPage> {
    let metadata = data.metadata.unwrap_or_default();

    let url = metadata
        .url
        .or(metadata.source_url)
        .or(data.url)
        .filter(|u| !u.trim().is_empty())?;

    let links = data
        .links
        .into_iter()
        .chain(metadata.links)
        .filter_map(|entry| match entry {
            LinkEntry::Href(href) => Some(CrawledLink { href, text: None }),
            LinkEntry::Object { href, text } => href.map(|href| CrawledLink { href, text }),
        })
        .filter(|link| !link.href.trim().is_empty())
        .collect();

    Some(CrawledPage {
        url,
        title: metadata.title,
        content: data.markdown.or(data.content),
        status_code: metadata.status_code.unwrap_or(200),
        links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_with_id_is_async_job() {
        let start: CrawlStartResponse = serde_json::from_str(
            r#"{"success": true, "id": "job-123", "url": "https://api.firecrawl.dev/v1/crawl/job-123"}"#,
        )
        .unwrap();

        assert_eq!(
            parse_start_response(start).unwrap(),
            CrawlStart::Job {
                id: "job-123".into()
            }
        );
    }

    #[test]
    fn start_without_id_returns_inline_pages() {
        let start: CrawlStartResponse = serde_json::from_str(
            r##"{"success": true, "data": [
                {"markdown": "# Home", "metadata": {"url": "https://example.com", "title": "Home"}}
            ]}"##,
        )
        .unwrap();

        match parse_start_response(start).unwrap() {
            CrawlStart::Completed { pages } => {
                assert_eq!(pages.len(), 1);
                assert_eq!(pages[0].title.as_deref(), Some("Home"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unsuccessful_start_is_an_error() {
        let start: CrawlStartResponse =
            serde_json::from_str(r#"{"success": false, "error": "Insufficient credits"}"#)
                .unwrap();

        let err = parse_start_response(start).unwrap_err();
        assert_eq!(err.to_string(), "Firecrawl failed: Insufficient credits");
    }

    #[test]
    fn status_maps_to_job_states() {
        let scraping: CrawlStatusResponse =
            serde_json::from_str(r#"{"status": "scraping", "completed": 3, "total": 10}"#)
                .unwrap();
        assert_eq!(
            parse_status_response(scraping),
            CrawlJobStatus::InProgress {
                status: "scraping".into(),
                completed: Some(3),
                total: Some(10),
            }
        );

        let failed: CrawlStatusResponse =
            serde_json::from_str(r#"{"status": "failed", "error": "blocked"}"#).unwrap();
        assert_eq!(
            parse_status_response(failed),
            CrawlJobStatus::Failed {
                error: Some("blocked".into())
            }
        );
    }

    #[test]
    fn page_reads_links_in_both_shapes() {
        let data: PageData = serde_json::from_str(
            r#"{
                "markdown": "body",
                "links": ["https://example.com/a", ""],
                "metadata": {
                    "sourceURL": "https://example.com/",
                    "statusCode": 404,
                    "links": [{"href": "/b", "text": "B"}, {"text": "no href"}]
                }
            }"#,
        )
        .unwrap();

        let page = into_crawled_page(data).unwrap();
        assert_eq!(page.url, "https://example.com/");
        assert_eq!(page.status_code, 404);
        assert_eq!(page.content.as_deref(), Some("body"));
        assert_eq!(
            page.links,
            vec![
                CrawledLink {
                    href: "https://example.com/a".into(),
                    text: None
                },
                CrawledLink {
                    href: "/b".into(),
                    text: Some("B".into())
                },
            ]
        );
    }

    #[test]
    fn page_defaults_and_url_fallbacks() {
        let data: PageData =
            serde_json::from_str(r#"{"url": "https://example.com/x", "content": "plain"}"#)
                .unwrap();
        let page = into_crawled_page(data).unwrap();
        assert_eq!(page.url, "https://example.com/x");
        assert_eq!(page.status_code, 200);
        assert_eq!(page.content.as_deref(), Some("plain"));

        assert!(into_crawled_page(PageData::default()).is_none());
    }
}
