//! Kernel module - infrastructure clients and dependencies.

pub mod ai;
pub mod deps;
pub mod firecrawl_client;
pub mod tavily_client;
pub mod test_dependencies;
pub mod traits;

pub use ai::{GeminiAI, NoopAI};
pub use deps::ServerDeps;
pub use firecrawl_client::FirecrawlClient;
pub use tavily_client::{NoopSearchService, TavilyClient};
pub use test_dependencies::TestDependencies;
pub use traits::*;
