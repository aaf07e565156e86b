// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Breadth-first crawling starting from a root URL
// - Same-site restriction (doesn't crawl external sites)
// - Each page is fetched at most once per crawl
// - Every step runs through the event pipeline, so it can be observed or
//   replaced by your own listeners
//
// Submodules:
// - scope: Which links are in scope, and their canonical form
// - queue: The frontier (queue + seen set)
// - defaults: The built-in listeners
// - spider: The crawl loop itself
// =============================================================================

mod defaults;
mod queue;
pub(crate) mod scope;
mod spider;

pub use defaults::{
    ExtractLinks, FetchPage, FinishCrawl, LogFetchError, SetRoot, DEFAULT_PRIORITY,
};
pub use queue::Frontier;
pub use scope::{normalize, CanonicalUri, ScopePolicy};
pub use spider::{CrawlPhase, CrawlState, CrawlSummary, FailedFetch, Spider};
