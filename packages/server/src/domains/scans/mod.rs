//! Website audit scans: crawl, market research and content analysis.

pub mod actions;
pub mod links;
pub mod models;
pub mod prompts;
pub mod status;

pub use models::{MarketInsight, Page, PageLink, PageOverview, PageSuggestion, Scan, ScanFilter, ScanStats};
pub use status::ScanStatus;
