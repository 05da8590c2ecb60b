//! Scan actions
//!
//! Background work kicked off by the scan endpoints. Each action drives the
//! kernel traits on `ServerDeps` and persists through the models.

pub mod analyze_content;
pub mod crawl_site;
pub mod market_research;
pub mod start_scan;

pub use analyze_content::{analyze_content, begin_analysis, start_analysis, AnalysisSummary};
pub use crawl_site::{crawl_site, persist_pages, poll_crawl_job, CrawlFailure, CrawlSummary, PollPolicy};
pub use market_research::{gather_research, run_market_research, start_market_research, Research};
pub use start_scan::start_scan;

use sqlx::PgPool;
use tracing::{error, warn};

use crate::common::ScanId;
use crate::domains::scans::models::Scan;

/// Write `message` to a failed scan. Errors from the write are logged here.
pub(crate) async fn record_failure(scan_id: ScanId, message: &str, pool: &PgPool) {
    match Scan::mark_failed(scan_id, message, pool).await {
        Ok(true) => {}
        Ok(false) => warn!(scan_id = %scan_id, "Scan no longer active, failure not recorded"),
        Err(e) => error!(scan_id = %scan_id, error = ?e, "Failed to record scan failure"),
    }
}
