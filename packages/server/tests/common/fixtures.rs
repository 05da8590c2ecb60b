//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use std::time::Duration;

use anyhow::Result;
use server_core::common::{PageId, ScanId, UserId};
use server_core::domains::scans::{Page, Scan, ScanStatus};
use sqlx::PgPool;
use tokio::sync::OnceCell;

/// Scans on this host cannot be written as `completed`.
pub const COMPLETION_REJECTED_HOST: &str = "https://completion-rejected.test";

static COMPLETION_TRIGGER: OnceCell<()> = OnceCell::const_new();

/// Install a trigger that raises on `completed` writes for
/// [`COMPLETION_REJECTED_HOST`] scans. Other scans are unaffected.
pub async fn reject_completion_writes(pool: &PgPool) {
    COMPLETION_TRIGGER
        .get_or_init(|| async {
            sqlx::raw_sql(
                r#"
                CREATE OR REPLACE FUNCTION reject_test_completion() RETURNS trigger AS $$
                BEGIN
                    IF NEW.status = 'completed'
                       AND NEW.url LIKE 'https://completion-rejected.test%' THEN
                        RAISE EXCEPTION 'completion write rejected';
                    END IF;
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                DROP TRIGGER IF EXISTS reject_test_completion ON scans;
                CREATE TRIGGER reject_test_completion
                    BEFORE UPDATE ON scans
                    FOR EACH ROW EXECUTE FUNCTION reject_test_completion();
                "#,
            )
            .execute(pool)
            .await
            .expect("Failed to install completion trigger");
        })
        .await;
}

/// Create a scan and force it into `status`, bypassing the transition guard.
pub async fn create_scan_with_status(
    pool: &PgPool,
    user_id: UserId,
    url: &str,
    status: ScanStatus,
) -> Result<Scan> {
    let scan = Scan::create(user_id, url, pool).await?;
    sqlx::query("UPDATE scans SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(scan.id)
        .execute(pool)
        .await?;
    Ok(Scan {
        status,
        ..scan
    })
}

pub async fn create_page(
    pool: &PgPool,
    scan_id: ScanId,
    url: &str,
    content: Option<&str>,
) -> Result<PageId> {
    Page::insert(scan_id, url, Some("Fixture page"), content, 200, pool).await
}

/// Poll until the scan reaches `status` or two seconds pass.
pub async fn wait_for_status(pool: &PgPool, scan_id: ScanId, status: ScanStatus) -> Scan {
    for _ in 0..200 {
        let scan = Scan::find_by_id(scan_id, pool)
            .await
            .expect("Failed to load scan")
            .expect("Scan disappeared");
        if scan.status == status {
            return scan;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Scan {} never reached {}", scan_id, status);
}
