//! Per-page LLM content analysis.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::common::ScanId;
use crate::domains::scans::actions::record_failure;
use crate::domains::scans::models::{Page, PageSuggestion, Scan};
use crate::domains::scans::prompts::{normalize_suggestions, page_analysis_prompt, parse_model_json};
use crate::domains::scans::status::ScanStatus;
use crate::kernel::ServerDeps;
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub analyzed: usize,
    pub failed: usize,
}

/// Claim a completed scan for analysis (`completed → analyzing`).
///
/// Returns false when the scan is not completed, which includes a run that
/// is already in progress.
pub async fn begin_analysis(scan_id: ScanId, pool: &PgPool) -> Result<bool> {
    Scan::transition(scan_id, ScanStatus::Analyzing, None, pool).await
}

/// Analyze the pages of a scan that is in `analyzing`, then complete it.
pub async fn analyze_content(scan: &Scan, deps: &ServerDeps) -> Result<AnalysisSummary> {
    let pool = &deps.db_pool;
    let limit = i64::try_from(deps.analysis_page_limit).unwrap_or(i64::MAX);

    let pages = match Page::find_for_analysis(scan.id, limit, pool).await {
        Ok(pages) => pages,
        Err(e) => {
            let message = e.to_string();
            warn!(scan_id = %scan.id, error = %message, "Could not load pages for analysis");
            record_failure(scan.id, &message, pool).await;
            return Err(e);
        }
    };

    info!(scan_id = %scan.id, pages = pages.len(), "Analyzing page content");

    let mut summary = AnalysisSummary::default();
    for page in &pages {
        match analyze_page(page, deps).await {
            Ok(_) => summary.analyzed += 1,
            Err(e) => {
                warn!(scan_id = %scan.id, page_id = %page.id, url = %page.url, error = %e, "Page analysis failed, skipping");
                summary.failed += 1;
            }
        }
    }

    match Scan::transition(scan.id, ScanStatus::Completed, None, pool).await {
        Ok(true) => {}
        Ok(false) => warn!(scan_id = %scan.id, "Scan left analyzing state before completion"),
        Err(e) => {
            let message = e.to_string();
            warn!(scan_id = %scan.id, error = %message, "Could not complete analysis");
            record_failure(scan.id, &message, pool).await;
            return Err(e);
        }
    }

    info!(
        scan_id = %scan.id,
        analyzed = summary.analyzed,
        failed = summary.failed,
        "Content analysis completed"
    );
    Ok(summary)
}

async fn analyze_page(page: &Page, deps: &ServerDeps) -> Result<PageSuggestion> {
    let content = page.content.as_deref().unwrap_or_default();
    let prompt = page_analysis_prompt(&page.url, page.title.as_deref(), content);

    let text = deps.ai.complete(&prompt).await?;
    let suggestions = normalize_suggestions(parse_model_json(&text));

    PageSuggestion::create(page.id, deps.ai.model_name(), &suggestions, &deps.db_pool).await
}

/// Spawn analysis for a scan already moved to `analyzing`.
pub fn start_analysis(scan: Scan, deps: Arc<ServerDeps>) {
    tokio::spawn(async move {
        if let Err(e) = analyze_content(&scan, &deps).await {
            error!(scan_id = %scan.id, error = %e, "Content analysis ended with error");
        }
    });
}
