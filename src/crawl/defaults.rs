// src/crawl/defaults.rs
// =============================================================================
// The built-in listeners that make the spider actually crawl.
//
// One listener per stage, all attached at DEFAULT_PRIORITY (-1000) so any
// listener you attach with a higher priority runs before them and can
// pre-empt them:
//
//   start       -> SetRoot       turn the `root` param into the crawl root
//   pre-fetch   -> FetchPage     download the page with the Transport
//   fetch-error -> LogFetchError log what went wrong
//   post-fetch  -> ExtractLinks  pull <a href> values out of HTML pages
//   finish      -> FinishCrawl   nothing but a log line
// =============================================================================

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::events::{Event, Listener, Pipeline, Reply, Stage};
use crate::fetch::{extract_anchor_hrefs, Transport};

pub const DEFAULT_PRIORITY: i32 = -1000;

pub(crate) fn attach_defaults(pipeline: &mut Pipeline, transport: Arc<dyn Transport>) {
    pipeline
        .attach(Stage::Start, SetRoot, DEFAULT_PRIORITY)
        .attach(Stage::PreFetch, FetchPage::new(transport), DEFAULT_PRIORITY)
        .attach(Stage::FetchError, LogFetchError, DEFAULT_PRIORITY)
        .attach(Stage::PostFetch, ExtractLinks, DEFAULT_PRIORITY)
        .attach(Stage::Finish, FinishCrawl, DEFAULT_PRIORITY);
}

/// Establishes the root from the `root` param and queues it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetRoot;

#[async_trait]
impl Listener for SetRoot {
    async fn on_event(&self, event: &mut Event<'_>) -> Reply {
        let candidate = event.params().root.clone();
        match event.state_mut().establish_root(candidate.as_deref()) {
            Some(root) => debug!(root = %root, "root established"),
            None => warn!(candidate = ?candidate, "root candidate rejected"),
        }
        Reply::Nothing
    }
}

/// Fetches the `uri` param. Failures come back as a value, never a panic.
#[derive(Clone)]
pub struct FetchPage {
    transport: Arc<dyn Transport>,
}

impl FetchPage {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Listener for FetchPage {
    async fn on_event(&self, event: &mut Event<'_>) -> Reply {
        // Cloned so no borrow of the event is held across the await
        let Some(uri) = event.params().uri.clone() else {
            return Reply::Nothing;
        };
        Reply::Fetched(self.transport.fetch(&uri).await.into())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogFetchError;

#[async_trait]
impl Listener for LogFetchError {
    async fn on_event(&self, event: &mut Event<'_>) -> Reply {
        let params = event.params();
        let url = params.uri.as_ref().map(|u| u.as_str()).unwrap_or("<unknown>");
        match params.fetch_error() {
            Some(error) => warn!(url, %error, "failed to fetch page"),
            None => warn!(url, "no page was produced for this url"),
        }
        Reply::Nothing
    }
}

/// Returns the page's unique, non-empty hrefs, or an empty list when the
/// page is missing or not HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractLinks;

#[async_trait]
impl Listener for ExtractLinks {
    async fn on_event(&self, event: &mut Event<'_>) -> Reply {
        let links = match event.params().page() {
            Some(page) if page.is_html() => unique_hrefs(extract_anchor_hrefs(&page.body)),
            Some(page) => {
                debug!(url = %page.url, content_type = ?page.content_type(), "not html, no links");
                Vec::new()
            }
            None => Vec::new(),
        };
        Reply::from(links)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FinishCrawl;

#[async_trait]
impl Listener for FinishCrawl {
    async fn on_event(&self, event: &mut Event<'_>) -> Reply {
        debug!(seen = event.state().frontier().seen_count(), "frontier drained");
        Reply::Nothing
    }
}

// Drops empty hrefs and repeats, keeping the first occurrence of each
fn unique_hrefs(hrefs: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    hrefs
        .into_iter()
        .filter(|href| !href.trim().is_empty())
        .filter(|href| seen.insert(href.clone()))
        .collect()
}
