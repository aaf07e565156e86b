// src/lib.rs
// =============================================================================
// site-spider: a single-host breadth-first web crawler built around an
// event pipeline.
//
// Quick start:
//
//   let mut spider = Spider::new(SpiderConfig::default())?;
//   spider.attach_fn(Stage::PostFetch, |event: &mut Event<'_>| {
//       if let Some(uri) = &event.params().uri {
//           println!("crawled {uri}");
//       }
//   }, 10);
//   let summary = spider.crawl(Some("https://example.com")).await;
//
// Modules:
// - crawl: Scope filter, frontier, default listeners and the crawl loop
// - events: Stages, listeners and the priority-ordered pipeline
// - fetch: HTTP transport and HTML link extraction
// - config: Client options and scope policy
// - error: Errors that can happen while building a Spider
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod events;
pub mod fetch;

pub use config::SpiderConfig;
pub use crawl::{
    normalize, CanonicalUri, CrawlPhase, CrawlState, CrawlSummary, FailedFetch, Frontier,
    ScopePolicy, Spider, DEFAULT_PRIORITY,
};
pub use error::SpiderError;
pub use events::{Event, Links, Listener, Params, Pipeline, Reply, Stage, TriggerOutcome};
pub use fetch::{FetchError, FetchOutcome, HttpTransport, Page, Transport};
