use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use url::Url;

use crate::common::UserId;
use crate::domains::scans::actions::crawl_site::crawl_site;
use crate::domains::scans::models::Scan;
use crate::kernel::ServerDeps;

/// Create a pending scan for `url` and crawl it in the background.
pub async fn start_scan(user_id: UserId, url: &Url, deps: Arc<ServerDeps>) -> Result<Scan> {
    let scan = Scan::create(user_id, url.as_str(), &deps.db_pool).await?;
    info!(scan_id = %scan.id, user_id = %user_id, url = %scan.url, "Scan created");

    let task_scan = scan.clone();
    tokio::spawn(async move {
        if let Err(e) = crawl_site(&task_scan, &deps).await {
            error!(scan_id = %task_scan.id, error = %e, "Background crawl ended with error");
        }
    });

    Ok(scan)
}
