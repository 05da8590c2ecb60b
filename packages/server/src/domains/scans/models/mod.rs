pub mod market_insight;
pub mod page;
pub mod page_link;
pub mod page_suggestion;
pub mod scan;

pub use market_insight::MarketInsight;
pub use page::{Page, PageOverview};
pub use page_link::{NewPageLink, PageLink};
pub use page_suggestion::PageSuggestion;
pub use scan::{Scan, ScanFilter, ScanStats};
