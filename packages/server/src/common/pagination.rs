//! Offset pagination for list endpoints.
//!
//! Pages are 1-based. `PageRequest::offset()` feeds `LIMIT/OFFSET`, and
//! `OffsetPage` wraps the rows with the totals a pager needs.
//!
//! ```rust,ignore
//! let request = PageRequest::new(query.page, DEFAULT_PER_PAGE);
//! let (scans, count) = Scan::list_for_user(user_id, &filter, &request, pool).await?;
//! let page = OffsetPage::new(scans, count, &request);
//! ```

use serde::Serialize;

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

/// Validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Clamps `page` to at least 1 and `per_page` into `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<i64>, per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub count: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, count: i64, request: &PageRequest) -> Self {
        Self {
            items,
            count,
            page: request.page,
            per_page: request.per_page,
            total_pages: total_pages(count, request.per_page),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> OffsetPage<U> {
        OffsetPage {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// `ceil(count / per_page)`, zero for an empty set.
pub fn total_pages(count: i64, per_page: i64) -> i64 {
    if count <= 0 || per_page <= 0 {
        return 0;
    }
    (count + per_page - 1) / per_page
}
