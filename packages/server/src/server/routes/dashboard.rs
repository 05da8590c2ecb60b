use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::domains::scans::models::{Scan, ScanStats};
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;
use crate::server::routes::scans::ScanView;

const RECENT_SCANS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub counts: ScanStats,
    pub success_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub recent_scans: Vec<ScanView>,
    pub stats: DashboardStats,
}

/// GET /api/dashboard
pub async fn dashboard_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<DashboardResponse>> {
    let recent = Scan::recent_for_user(auth.user_id, RECENT_SCANS, &state.db_pool).await?;
    let counts = Scan::stats_for_user(auth.user_id, &state.db_pool).await?;

    Ok(Json(DashboardResponse {
        recent_scans: recent.into_iter().map(ScanView::from).collect(),
        stats: DashboardStats {
            success_rate: counts.success_rate(),
            counts,
        },
    }))
}
