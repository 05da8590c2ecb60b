//! Typed IDs for every persisted entity.

pub use super::id::Id;

/// Marker for authenticated users (owned by the auth provider).
pub struct User;

/// Marker for audit scans.
pub struct Scan;

/// Marker for crawled pages.
pub struct Page;

/// Marker for outgoing page links.
pub struct PageLink;

/// Marker for per-page AI suggestions.
pub struct PageSuggestion;

/// Marker for market research results.
pub struct MarketInsight;

pub type UserId = Id<User>;
pub type ScanId = Id<Scan>;
pub type PageId = Id<Page>;
pub type PageLinkId = Id<PageLink>;
pub type PageSuggestionId = Id<PageSuggestion>;
pub type MarketInsightId = Id<MarketInsight>;
