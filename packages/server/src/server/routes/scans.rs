//! Scan endpoints under `/api/scans`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::common::{OffsetPage, PageRequest, ScanId, DEFAULT_PER_PAGE};
use crate::domains::scans::actions::{begin_analysis, start_analysis, start_market_research, start_scan};
use crate::domains::scans::links::normalize_site_url;
use crate::domains::scans::models::{MarketInsight, Page, PageLink, Scan, ScanFilter};
use crate::domains::scans::status::ScanStatus;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct StartScanRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScanResponse {
    pub success: bool,
    pub scan_id: ScanId,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListScansQuery {
    pub search: Option<String>,
    /// A scan status, or `all`
    pub status: Option<String>,
    pub page: Option<i64>,
}

/// A scan with its progress percentage
#[derive(Debug, Serialize)]
pub struct ScanView {
    #[serde(flatten)]
    pub scan: Scan,
    pub progress: u8,
}

impl From<Scan> for ScanView {
    fn from(scan: Scan) -> Self {
        let progress = scan.status.progress();
        Self { scan, progress }
    }
}

/// Scan history page, rows under `scans`
#[derive(Debug, Serialize)]
pub struct ScanListResponse {
    pub scans: Vec<ScanView>,
    pub count: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<OffsetPage<ScanView>> for ScanListResponse {
    fn from(page: OffsetPage<ScanView>) -> Self {
        Self {
            scans: page.items,
            count: page.count,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }
    }
}

/// Extractor result for the `:id` segment
type ScanIdPath = Result<Path<String>, PathRejection>;

fn parse_scan_id(path: ScanIdPath) -> ApiResult<ScanId> {
    let Path(raw) = path?;
    ScanId::parse(&raw).map_err(|_| ApiError::BadRequest("Invalid scan id".to_string()))
}

async fn owned_scan(state: &AppState, auth: &AuthUser, path: ScanIdPath) -> ApiResult<Scan> {
    let id = parse_scan_id(path)?;
    Scan::find_for_user(id, auth.user_id, &state.db_pool)
        .await?
        .ok_or_else(ApiError::scan_not_found)
}

fn parse_status_filter(raw: Option<&str>) -> ApiResult<Option<ScanStatus>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(ApiError::BadRequest),
    }
}

/// POST /api/scans
pub async fn start_scan_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    body: Result<Json<StartScanRequest>, JsonRejection>,
) -> ApiResult<Json<StartScanResponse>> {
    let Json(body) = body?;
    let url = normalize_site_url(body.url.as_deref().unwrap_or_default())?;

    let scan = start_scan(auth.user_id, &url, state.deps.clone()).await?;

    Ok(Json(StartScanResponse {
        success: true,
        scan_id: scan.id,
        message: "Scan started successfully".to_string(),
    }))
}

/// GET /api/scans
pub async fn list_scans_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    query: Result<Query<ListScansQuery>, QueryRejection>,
) -> ApiResult<Json<ScanListResponse>> {
    let Query(query) = query?;
    let filter = ScanFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        status: parse_status_filter(query.status.as_deref())?,
    };
    let page = PageRequest::new(query.page, DEFAULT_PER_PAGE);

    let (scans, count) = Scan::list_for_user(auth.user_id, &filter, &page, &state.db_pool).await?;

    let page = OffsetPage::new(scans, count, &page).map(ScanView::from);
    Ok(Json(page.into()))
}

/// GET /api/scans/:id
pub async fn get_scan_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    id: ScanIdPath,
) -> ApiResult<Json<Value>> {
    let scan = owned_scan(&state, &auth, id).await?;
    let page_count = Page::count_for_scan(scan.id, &state.db_pool).await?;

    Ok(Json(json!({
        "scan": ScanView::from(scan),
        "page_count": page_count,
    })))
}

/// DELETE /api/scans/:id
pub async fn delete_scan_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    id: ScanIdPath,
) -> ApiResult<Json<Value>> {
    let id = parse_scan_id(id)?;
    if !Scan::delete_for_user(id, auth.user_id, &state.db_pool).await? {
        return Err(ApiError::scan_not_found());
    }
    tracing::info!(scan_id = %id, "Scan deleted");

    Ok(Json(json!({ "success": true })))
}

/// GET /api/scans/:id/pages
pub async fn scan_pages_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    id: ScanIdPath,
) -> ApiResult<Json<Value>> {
    let scan = owned_scan(&state, &auth, id).await?;
    let pages = Page::overview_for_scan(scan.id, &state.db_pool).await?;

    Ok(Json(json!({ "pages": pages })))
}

/// GET /api/scans/:id/links
pub async fn scan_links_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    id: ScanIdPath,
) -> ApiResult<Json<Value>> {
    let scan = owned_scan(&state, &auth, id).await?;
    let links = PageLink::find_by_scan(scan.id, &state.db_pool).await?;

    Ok(Json(json!({ "links": links })))
}

/// GET /api/scans/:id/insights
pub async fn scan_insights_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    id: ScanIdPath,
) -> ApiResult<Json<Value>> {
    let scan = owned_scan(&state, &auth, id).await?;
    let insights = MarketInsight::find_by_scan(scan.id, &state.db_pool).await?;

    Ok(Json(json!({ "insights": insights })))
}

/// POST /api/scans/:id/market-research
pub async fn market_research_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    id: ScanIdPath,
) -> ApiResult<Json<Value>> {
    let scan = owned_scan(&state, &auth, id).await?;

    if !state.deps.search.is_configured() || !state.deps.ai.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "Market research is not configured".to_string(),
        ));
    }

    tracing::info!(scan_id = %scan.id, "Market research requested");
    start_market_research(scan, state.deps.clone());

    Ok(Json(json!({
        "success": true,
        "message": "Market research started",
    })))
}

/// POST /api/scans/:id/analyze
pub async fn analyze_scan_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    id: ScanIdPath,
) -> ApiResult<Json<Value>> {
    let scan = owned_scan(&state, &auth, id).await?;

    if !state.deps.ai.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "Content analysis is not configured".to_string(),
        ));
    }

    if !begin_analysis(scan.id, &state.db_pool).await? {
        return Err(ApiError::Conflict(format!(
            "Scan must be completed before analysis (current status: {})",
            scan.status
        )));
    }

    tracing::info!(scan_id = %scan.id, "Content analysis requested");
    start_analysis(scan, state.deps.clone());

    Ok(Json(json!({
        "success": true,
        "message": "Content analysis started",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_accepts_all_and_blank() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_status_filter(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("completed")).unwrap(),
            Some(ScanStatus::Completed)
        );
        assert!(matches!(
            parse_status_filter(Some("done")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn list_response_puts_rows_under_scans() {
        let request = PageRequest::new(Some(1), DEFAULT_PER_PAGE);
        let body = serde_json::to_value(ScanListResponse::from(OffsetPage::<ScanView>::new(
            Vec::new(),
            0,
            &request,
        )))
        .unwrap();
        assert_eq!(body["scans"], serde_json::json!([]));
        assert_eq!(body["total_pages"], 0);
        assert!(body.get("items").is_none());
    }

    #[test]
    fn start_response_uses_camel_case() {
        let id = ScanId::new();
        let body = serde_json::to_value(StartScanResponse {
            success: true,
            scan_id: id,
            message: "Scan started successfully".to_string(),
        })
        .unwrap();
        assert_eq!(body["scanId"], id.to_string());
        assert_eq!(body["success"], true);
    }
}
