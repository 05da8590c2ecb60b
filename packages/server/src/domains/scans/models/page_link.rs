use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{PageId, PageLinkId, ScanId};
use crate::domains::scans::links::ClassifiedLink;

/// PageLink - an outgoing link found on a crawled page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageLink {
    pub id: PageLinkId,
    pub page_id: PageId,
    pub target_url: String,
    pub is_internal: bool,
    pub anchor_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A classified link plus its anchor text, ready to insert
#[derive(Debug, Clone)]
pub struct NewPageLink {
    pub link: ClassifiedLink,
    pub anchor_text: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl PageLink {
    /// Insert all links of one page in a single statement
    pub async fn insert_many(page_id: PageId, links: &[NewPageLink], pool: &PgPool) -> Result<u64> {
        if links.is_empty() {
            return Ok(0);
        }

        let ids: Vec<PageLinkId> = links.iter().map(|_| PageLinkId::new()).collect();
        let targets: Vec<&str> = links.iter().map(|l| l.link.target_url.as_str()).collect();
        let internal: Vec<bool> = links.iter().map(|l| l.link.is_internal).collect();
        let anchors: Vec<Option<&str>> = links.iter().map(|l| l.anchor_text.as_deref()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO page_links (id, page_id, target_url, is_internal, anchor_text)
            SELECT id, $2, target_url, is_internal, anchor_text
            FROM UNNEST($1::uuid[], $3::text[], $4::bool[], $5::text[])
                AS t(id, target_url, is_internal, anchor_text)
            "#,
        )
        .bind(&ids)
        .bind(page_id)
        .bind(&targets)
        .bind(&internal)
        .bind(&anchors)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert links for page {}", page_id))?;

        Ok(result.rows_affected())
    }

    /// Links of every page in a scan
    pub async fn find_by_scan(scan_id: ScanId, pool: &PgPool) -> Result<Vec<Self>> {
        let links = sqlx::query_as::<_, PageLink>(
            r#"
            SELECT l.* FROM page_links l
            JOIN pages p ON p.id = l.page_id
            WHERE p.scan_id = $1
            ORDER BY l.created_at, l.id
            "#,
        )
        .bind(scan_id)
        .fetch_all(pool)
        .await?;
        Ok(links)
    }

    pub async fn find_by_page(page_id: PageId, pool: &PgPool) -> Result<Vec<Self>> {
        let links = sqlx::query_as::<_, PageLink>(
            "SELECT * FROM page_links WHERE page_id = $1 ORDER BY created_at, id",
        )
        .bind(page_id)
        .fetch_all(pool)
        .await?;
        Ok(links)
    }
}
