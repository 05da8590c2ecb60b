use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{PageRequest, ScanId, UserId};
use crate::domains::scans::status::ScanStatus;

/// Scan - one audit run of a user's website
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Scan {
    pub id: ScanId,
    pub user_id: UserId,
    pub url: String,
    pub status: ScanStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for the scan history list
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    /// Case-insensitive substring of the URL
    pub search: Option<String>,
    pub status: Option<ScanStatus>,
}

/// Dashboard counters for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ScanStats {
    pub total_scans: i64,
    pub completed_scans: i64,
    pub total_pages: i64,
    pub analyzed_pages: i64,
}

impl ScanStats {
    /// Completed scans as a rounded percentage of all scans.
    pub fn success_rate(&self) -> i64 {
        if self.total_scans == 0 {
            return 0;
        }
        ((self.completed_scans as f64 / self.total_scans as f64) * 100.0).round() as i64
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Scan {
    /// Insert a new pending scan
    pub async fn create(user_id: UserId, url: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Scan>(
            r#"
            INSERT INTO scans (id, user_id, url, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(ScanId::new())
        .bind(user_id)
        .bind(url)
        .bind(ScanStatus::Pending)
        .fetch_one(pool)
        .await
        .context("Failed to create scan")
    }

    pub async fn find_by_id(id: ScanId, pool: &PgPool) -> Result<Option<Self>> {
        let scan = sqlx::query_as::<_, Scan>("SELECT * FROM scans WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(scan)
    }

    /// Find a scan only if it belongs to `user_id`
    pub async fn find_for_user(id: ScanId, user_id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let scan =
            sqlx::query_as::<_, Scan>("SELECT * FROM scans WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(scan)
    }

    /// Move a scan to `next` if its current status allows it.
    ///
    /// The predecessor check happens in the UPDATE itself, so concurrent tasks
    /// cannot push a scan through an illegal transition. Returns false when the
    /// row was missing or in a state that cannot reach `next`.
    pub async fn transition(
        id: ScanId,
        next: ScanStatus,
        error: Option<&str>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scans
            SET status = $1, error = $2, updated_at = NOW()
            WHERE id = $3 AND status = ANY($4)
            "#,
        )
        .bind(next)
        .bind(error)
        .bind(id)
        .bind(ScanStatus::allowed_predecessors(next))
        .execute(pool)
        .await
        .with_context(|| format!("Failed to move scan {} to {}", id, next))?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark a scan failed from whatever active state it is in
    pub async fn mark_failed(id: ScanId, error: &str, pool: &PgPool) -> Result<bool> {
        Self::transition(id, ScanStatus::Failed, Some(error), pool).await
    }

    /// One page of a user's scans, newest first, plus the total match count
    pub async fn list_for_user(
        user_id: UserId,
        filter: &ScanFilter,
        page: &PageRequest,
        pool: &PgPool,
    ) -> Result<(Vec<Self>, i64)> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let scans = sqlx::query_as::<_, Scan>(
            r#"
            SELECT * FROM scans
            WHERE user_id = $1
              AND ($2::text IS NULL OR url ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(pattern.as_deref())
        .bind(filter.status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list scans")?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM scans
            WHERE user_id = $1
              AND ($2::text IS NULL OR url ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR status = $3)
            "#,
        )
        .bind(user_id)
        .bind(pattern.as_deref())
        .bind(filter.status)
        .fetch_one(pool)
        .await
        .context("Failed to count scans")?;

        Ok((scans, count))
    }

    /// Most recent scans for the dashboard
    pub async fn recent_for_user(user_id: UserId, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let scans = sqlx::query_as::<_, Scan>(
            "SELECT * FROM scans WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(scans)
    }

    /// Delete a scan and, through cascades, everything collected for it.
    /// Returns false when the scan does not exist or belongs to someone else.
    pub async fn delete_for_user(id: ScanId, user_id: UserId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scans WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to delete scan")?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn stats_for_user(user_id: UserId, pool: &PgPool) -> Result<ScanStats> {
        sqlx::query_as::<_, ScanStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM scans WHERE user_id = $1) AS total_scans,
                (SELECT COUNT(*) FROM scans WHERE user_id = $1 AND status = 'completed')
                    AS completed_scans,
                (SELECT COUNT(*) FROM pages p
                    JOIN scans s ON s.id = p.scan_id
                    WHERE s.user_id = $1) AS total_pages,
                (SELECT COUNT(*) FROM page_suggestions ps
                    JOIN pages p ON p.id = ps.page_id
                    JOIN scans s ON s.id = p.scan_id
                    WHERE s.user_id = $1) AS analyzed_pages
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to load scan stats")
    }
}

/// ILIKE pattern matching `search` anywhere, with wildcards escaped
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("shop"), "%shop%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn success_rate_rounds() {
        let stats = ScanStats {
            total_scans: 3,
            completed_scans: 2,
            total_pages: 0,
            analyzed_pages: 0,
        };
        assert_eq!(stats.success_rate(), 67);
    }

    #[test]
    fn success_rate_without_scans_is_zero() {
        let stats = ScanStats {
            total_scans: 0,
            completed_scans: 0,
            total_pages: 0,
            analyzed_pages: 0,
        };
        assert_eq!(stats.success_rate(), 0);
    }
}
