use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{PageId, ScanId};

/// Page - one crawled URL of a scan
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    pub id: PageId,
    pub scan_id: ScanId,
    pub url: String,
    pub title: Option<String>,
    /// Markdown body as returned by the crawler
    pub content: Option<String>,
    pub status_code: i32,
    pub created_at: DateTime<Utc>,
}

/// Page row for the results view, with its latest suggestions and link counts
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PageOverview {
    pub id: PageId,
    pub scan_id: ScanId,
    pub url: String,
    pub title: Option<String>,
    pub status_code: i32,
    pub created_at: DateTime<Utc>,
    pub suggestions: Option<serde_json::Value>,
    pub suggestions_model: Option<String>,
    pub internal_links: i64,
    pub external_links: i64,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Page {
    pub async fn insert(
        scan_id: ScanId,
        url: &str,
        title: Option<&str>,
        content: Option<&str>,
        status_code: i32,
        pool: &PgPool,
    ) -> Result<PageId> {
        let id: PageId = sqlx::query_scalar(
            r#"
            INSERT INTO pages (id, scan_id, url, title, content, status_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(PageId::new())
        .bind(scan_id)
        .bind(url)
        .bind(title)
        .bind(content)
        .bind(status_code)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to insert page {}", url))?;
        Ok(id)
    }

    pub async fn find_by_scan(scan_id: ScanId, pool: &PgPool) -> Result<Vec<Self>> {
        let pages = sqlx::query_as::<_, Page>(
            "SELECT * FROM pages WHERE scan_id = $1 ORDER BY created_at, id",
        )
        .bind(scan_id)
        .fetch_all(pool)
        .await?;
        Ok(pages)
    }

    /// Pages worth sending to the LLM: non-empty content, crawl order, capped
    pub async fn find_for_analysis(scan_id: ScanId, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let pages = sqlx::query_as::<_, Page>(
            r#"
            SELECT * FROM pages
            WHERE scan_id = $1
              AND content IS NOT NULL
              AND btrim(content) <> ''
            ORDER BY created_at, id
            LIMIT $2
            "#,
        )
        .bind(scan_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to load pages for analysis")?;
        Ok(pages)
    }

    pub async fn overview_for_scan(scan_id: ScanId, pool: &PgPool) -> Result<Vec<PageOverview>> {
        let pages = sqlx::query_as::<_, PageOverview>(
            r#"
            SELECT
                p.id, p.scan_id, p.url, p.title, p.status_code, p.created_at,
                s.suggestions,
                s.model AS suggestions_model,
                COALESCE(l.internal_links, 0) AS internal_links,
                COALESCE(l.external_links, 0) AS external_links
            FROM pages p
            LEFT JOIN LATERAL (
                SELECT suggestions, model FROM page_suggestions
                WHERE page_id = p.id
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            ) s ON TRUE
            LEFT JOIN LATERAL (
                SELECT
                    COUNT(*) FILTER (WHERE is_internal) AS internal_links,
                    COUNT(*) FILTER (WHERE NOT is_internal) AS external_links
                FROM page_links
                WHERE page_id = p.id
            ) l ON TRUE
            WHERE p.scan_id = $1
            ORDER BY p.created_at, p.id
            "#,
        )
        .bind(scan_id)
        .fetch_all(pool)
        .await
        .context("Failed to load page overview")?;
        Ok(pages)
    }

    pub async fn count_for_scan(scan_id: ScanId, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM pages WHERE scan_id = $1")
            .bind(scan_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
