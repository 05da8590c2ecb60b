//! Market research for a scanned site: web searches about its domain
//! summarized by the LLM into competitor and trend insights.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Utc};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::domains::scans::links::host_of;
use crate::domains::scans::models::{MarketInsight, Scan};
use crate::domains::scans::prompts::{market_research_prompt, parse_model_json, research_queries};
use crate::kernel::{BaseSearchService, SearchResult, ServerDeps};

const RESULTS_PER_QUERY: usize = 5;
const SEARCH_DEPTH: &str = "advanced";

/// Search results grouped by query, plus the flat list stored as sources
#[derive(Debug, Clone, Default)]
pub struct Research {
    pub by_query: Map<String, Value>,
    pub sources: Vec<SearchResult>,
}

/// Run every research query. A failing query is logged and left out.
pub async fn gather_research(
    search: &dyn BaseSearchService,
    domain: &str,
    year: i32,
) -> Research {
    let mut research = Research::default();

    for query in research_queries(domain, year) {
        match search
            .search(&query, Some(RESULTS_PER_QUERY), Some(SEARCH_DEPTH))
            .await
        {
            Ok(results) => {
                let value = serde_json::to_value(&results).unwrap_or(Value::Array(Vec::new()));
                research.by_query.insert(query, value);
                research.sources.extend(results);
            }
            Err(e) => warn!(query = %query, error = %e, "Research query failed, skipping"),
        }
    }

    research
}

/// Research the scan's domain and store the insights.
///
/// Returns `None` when the LLM call fails; nothing is written in that case.
/// The scan status is never changed.
pub async fn run_market_research(scan: &Scan, deps: &ServerDeps) -> Result<Option<MarketInsight>> {
    let domain = host_of(&scan.url)
        .ok_or_else(|| anyhow::anyhow!("Scan {} has no host in its URL", scan.id))?;
    let year = Utc::now().year();

    let research = gather_research(deps.search.as_ref(), &domain, year).await;
    info!(
        scan_id = %scan.id,
        domain = %domain,
        queries = research.by_query.len(),
        sources = research.sources.len(),
        "Research gathered"
    );

    let prompt = market_research_prompt(&scan.url, &Value::Object(research.by_query));
    let text = match deps.ai.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(scan_id = %scan.id, error = %e, "Market analysis failed, no insights stored");
            return Ok(None);
        }
    };

    let insights = parse_model_json(&text);
    let sources = serde_json::to_value(&research.sources)?;
    let row = MarketInsight::create(
        scan.id,
        deps.ai.model_name(),
        &insights,
        &sources,
        &deps.db_pool,
    )
    .await?;

    info!(scan_id = %scan.id, insight_id = %row.id, "Market insights stored");
    Ok(Some(row))
}

/// Spawn market research in the background.
pub fn start_market_research(scan: Scan, deps: Arc<ServerDeps>) {
    tokio::spawn(async move {
        if let Err(e) = run_market_research(&scan, &deps).await {
            error!(scan_id = %scan.id, error = %e, "Market research ended with error");
        }
    });
}
