use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use crate::common::{MarketInsightId, ScanId};

/// MarketInsight - competitor and trend analysis generated for a scan
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketInsight {
    pub id: MarketInsightId,
    pub scan_id: ScanId,
    pub model: String,
    pub insights: Value,
    /// Raw search results keyed by query
    pub sources: Value,
    pub created_at: DateTime<Utc>,
}

impl MarketInsight {
    pub async fn create(
        scan_id: ScanId,
        model: &str,
        insights: &Value,
        sources: &Value,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, MarketInsight>(
            r#"
            INSERT INTO market_insights (id, scan_id, model, insights, sources)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(MarketInsightId::new())
        .bind(scan_id)
        .bind(model)
        .bind(insights)
        .bind(sources)
        .fetch_one(pool)
        .await
        .context("Failed to save market insights")
    }

    pub async fn find_by_scan(scan_id: ScanId, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, MarketInsight>(
            "SELECT * FROM market_insights WHERE scan_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(scan_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
