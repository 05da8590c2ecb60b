use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use crate::common::{PageId, PageSuggestionId, ScanId};

/// PageSuggestion - LLM improvement suggestions for one page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageSuggestion {
    pub id: PageSuggestionId,
    pub page_id: PageId,
    pub model: String,
    pub suggestions: Value,
    pub created_at: DateTime<Utc>,
}

impl PageSuggestion {
    pub async fn create(
        page_id: PageId,
        model: &str,
        suggestions: &Value,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, PageSuggestion>(
            r#"
            INSERT INTO page_suggestions (id, page_id, model, suggestions)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(PageSuggestionId::new())
        .bind(page_id)
        .bind(model)
        .bind(suggestions)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to save suggestions for page {}", page_id))
    }

    pub async fn find_by_scan(scan_id: ScanId, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, PageSuggestion>(
            r#"
            SELECT ps.* FROM page_suggestions ps
            JOIN pages p ON p.id = ps.page_id
            WHERE p.scan_id = $1
            ORDER BY ps.created_at, ps.id
            "#,
        )
        .bind(scan_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
