//! Crawl a scanned site and store its pages and links.
//!
//! Runs as a background task spawned by the start-scan handler. The scan
//! moves `pending → crawling → completed`, or to `failed` with the error
//! recorded on the row.

use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CrawlSettings;
use crate::domains::scans::actions::record_failure;
use crate::domains::scans::links::{classify_link, host_of};
use crate::domains::scans::models::{NewPageLink, Page, PageLink, Scan};
use crate::domains::scans::status::ScanStatus;
use crate::kernel::{BaseCrawler, CrawlJobStatus, CrawlOptions, CrawlStart, CrawledPage, ServerDeps};

/// How often and how long to poll a crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

impl PollPolicy {
    /// Longest time a job can be polled, saturating at `Duration::MAX`.
    pub fn max_wait(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts)
            .unwrap_or(Duration::MAX)
    }
}

impl From<&CrawlSettings> for PollPolicy {
    fn from(settings: &CrawlSettings) -> Self {
        Self {
            interval: settings.poll_interval,
            max_attempts: settings.max_poll_attempts,
        }
    }
}

#[derive(Debug, Error)]
pub enum CrawlFailure {
    #[error("{0}")]
    StatusCheck(String),
    #[error("Crawl job failed: {0}")]
    JobFailed(String),
    #[error("Crawl job timed out")]
    TimedOut { attempts: u32, waited: Duration },
}

/// Counts from one finished crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_saved: usize,
    pub pages_skipped: usize,
    pub links_saved: u64,
}

/// Poll `job_id` until it completes, fails, or the attempts run out.
pub async fn poll_crawl_job(
    crawler: &dyn BaseCrawler,
    job_id: &str,
    policy: PollPolicy,
) -> Result<Vec<CrawledPage>, CrawlFailure> {
    for attempt in 1..=policy.max_attempts {
        let status = crawler
            .crawl_status(job_id)
            .await
            .map_err(|e| CrawlFailure::StatusCheck(e.to_string()))?;

        match status {
            CrawlJobStatus::Completed { pages } => {
                info!(job_id, attempt, pages = pages.len(), "Crawl job completed");
                return Ok(pages);
            }
            CrawlJobStatus::Failed { error } => {
                let error = error.unwrap_or_else(|| "Unknown error".to_string());
                warn!(job_id, attempt, error = %error, "Crawl job failed");
                return Err(CrawlFailure::JobFailed(error));
            }
            CrawlJobStatus::InProgress {
                status,
                completed,
                total,
            } => {
                debug!(job_id, attempt, status = %status, ?completed, ?total, "Crawl job still running");
                tokio::time::sleep(policy.interval).await;
            }
        }
    }

    Err(CrawlFailure::TimedOut {
        attempts: policy.max_attempts,
        waited: policy.max_wait(),
    })
}

/// Run the whole crawl for a pending scan.
///
/// Any failure after the scan entered `crawling` is written to `scans.error`
/// and also returned. A scan that is no longer pending is left untouched.
pub async fn crawl_site(scan: &Scan, deps: &ServerDeps) -> Result<CrawlSummary> {
    let pool = &deps.db_pool;

    if !Scan::transition(scan.id, ScanStatus::Crawling, None, pool).await? {
        anyhow::bail!("Scan {} is not pending, crawl skipped", scan.id);
    }

    info!(scan_id = %scan.id, url = %scan.url, "Starting crawl");

    let outcome = async {
        let summary = crawl_and_store(scan, deps).await?;
        if !Scan::transition(scan.id, ScanStatus::Completed, None, pool).await? {
            warn!(scan_id = %scan.id, "Scan left crawling state before completion");
        }
        Ok::<_, anyhow::Error>(summary)
    }
    .await;

    match outcome {
        Ok(summary) => {
            info!(
                scan_id = %scan.id,
                pages_saved = summary.pages_saved,
                pages_skipped = summary.pages_skipped,
                links_saved = summary.links_saved,
                "Crawl completed"
            );
            Ok(summary)
        }
        Err(e) => {
            let message = e.to_string();
            warn!(scan_id = %scan.id, error = %message, "Crawl failed");
            record_failure(scan.id, &message, pool).await;
            Err(e)
        }
    }
}

async fn crawl_and_store(scan: &Scan, deps: &ServerDeps) -> Result<CrawlSummary> {
    let options = CrawlOptions::audit(deps.crawl.page_limit);

    let pages = match deps.crawler.start_crawl(&scan.url, &options).await? {
        CrawlStart::Completed { pages } => pages,
        CrawlStart::Job { id } => {
            info!(scan_id = %scan.id, job_id = %id, "Polling crawl job");
            poll_crawl_job(deps.crawler.as_ref(), &id, PollPolicy::from(&deps.crawl)).await?
        }
    };

    Ok(persist_pages(scan, pages, deps).await)
}

/// Store crawled pages and their links. Pages that fail to insert are skipped.
pub async fn persist_pages(scan: &Scan, pages: Vec<CrawledPage>, deps: &ServerDeps) -> CrawlSummary {
    let pool = &deps.db_pool;
    let site_host = host_of(&scan.url).unwrap_or_default();
    let mut summary = CrawlSummary::default();

    for page in pages {
        let page_id = match Page::insert(
            scan.id,
            &page.url,
            page.title.as_deref(),
            page.content.as_deref(),
            page.status_code,
            pool,
        )
        .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(scan_id = %scan.id, url = %page.url, error = %e, "Failed to store page, skipping");
                summary.pages_skipped += 1;
                continue;
            }
        };
        summary.pages_saved += 1;

        let links: Vec<NewPageLink> = page
            .links
            .iter()
            .map(|link| NewPageLink {
                link: classify_link(&link.href, &page.url, &site_host),
                anchor_text: link.text.clone(),
            })
            .collect();

        match PageLink::insert_many(page_id, &links, pool).await {
            Ok(count) => summary.links_saved += count,
            Err(e) => warn!(page_id = %page_id, error = %e, "Failed to store page links"),
        }
    }

    summary
}
