// src/crawl/spider.rs
// =============================================================================
// The crawl loop. This is where the frontier and the event pipeline meet.
//
// How it works:
// 1. Fire "start" so a listener can establish the root
// 2. Take the next URL off the frontier
// 3. Fire "pre-fetch" and expect a fetched page back
//    - no page? fire "fetch-error" and move on to the next URL
// 4. Fire "post-fetch" and expect a list of links back
// 5. Run every link through the scope filter and offer it to the frontier
// 6. Repeat from 2 until the frontier is empty, then fire "finish"
//
// Every step waits for the previous one to finish, so pages are visited in
// strict breadth-first order: all links of a page are queued before the
// next page is fetched.
//
// Rust concepts:
// - async/await: The loop awaits each stage before moving on
// - Arc<dyn Trait>: The transport is shared with the default fetch listener
// - while let: Loop until the frontier hands back None
// =============================================================================

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::defaults::attach_defaults;
use super::queue::Frontier;
use super::scope::{normalize, CanonicalUri, ScopePolicy};
use crate::config::SpiderConfig;
use crate::error::SpiderError;
use crate::events::{Event, Listener, Params, Pipeline, Reply, Stage};
use crate::fetch::{FetchOutcome, HttpTransport, Transport};

/// Where a crawl is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    /// The start stage is running; the root can still change
    Starting,
    /// Pages are being fetched; the root is frozen
    Visiting,
    /// The frontier is empty and the finish stage is running
    Draining,
    Finished,
}

/// Everything that belongs to one crawl run.
///
/// A fresh CrawlState is created for every call to `Spider::crawl`, so the
/// seen set never leaks from one crawl into the next.
#[derive(Debug)]
pub struct CrawlState {
    phase: CrawlPhase,
    policy: ScopePolicy,
    root: Option<CanonicalUri>,
    frontier: Frontier,
}

impl CrawlState {
    pub fn new(policy: ScopePolicy) -> Self {
        Self {
            phase: CrawlPhase::Idle,
            policy,
            root: None,
            frontier: Frontier::new(),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn root(&self) -> Option<&CanonicalUri> {
        self.root.as_ref()
    }

    pub fn policy(&self) -> ScopePolicy {
        self.policy
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    // Sets the root from a raw candidate and queues it
    //
    // Only allowed while the start stage runs. Once visiting begins the
    // root is frozen and this just returns the current root.
    //
    // Each call replaces the previous root and its queue entry, so the
    // frontier only ever holds the root now in effect (or nothing).
    //
    // Returns: the root now in effect, if any
    pub fn establish_root(&mut self, candidate: Option<&str>) -> Option<&CanonicalUri> {
        if self.phase != CrawlPhase::Starting {
            warn!(phase = ?self.phase, "root is frozen outside the start stage");
            return self.root.as_ref();
        }

        if let Some(previous) = &self.root {
            debug!(previous = %previous, "replacing root");
        }
        self.frontier = Frontier::new();
        self.root = candidate.and_then(|candidate| normalize(candidate, None, self.policy));
        if let Some(root) = &self.root {
            self.frontier.offer(root.clone());
        }
        self.root.as_ref()
    }

    /// Runs a raw link through the scope filter against the root.
    pub fn scope(&self, candidate: &str) -> Option<CanonicalUri> {
        let root = self.root.as_ref()?;
        normalize(candidate, Some(root), self.policy)
    }

    // Stops the crawl after the current page by dropping every queued URL
    //
    // Returns: how many queued URLs were dropped
    pub fn halt(&mut self) -> usize {
        let dropped = self.frontier.clear_pending();
        info!(dropped, "crawl halted by listener");
        dropped
    }

    fn enter(&mut self, phase: CrawlPhase) {
        trace!(from = ?self.phase, to = ?phase, "crawl phase");
        self.phase = phase;
    }
}

/// A page that could not be fetched.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFetch {
    pub url: CanonicalUri,
    pub message: String,
}

/// What a finished crawl did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    /// The root the crawl ran against, if one was established
    pub root: Option<CanonicalUri>,
    /// Successfully fetched pages, in visiting order
    pub visited: Vec<CanonicalUri>,
    /// Pages whose fetch failed, in visiting order
    pub failed: Vec<FailedFetch>,
    /// Distinct URLs ever admitted to the frontier (root included)
    pub discovered: usize,
}

impl CrawlSummary {
    /// Every URL that went through pre-fetch.
    pub fn attempted(&self) -> usize {
        self.visited.len() + self.failed.len()
    }
}

/// The crawler: a configured event pipeline with the default listeners.
pub struct Spider {
    config: SpiderConfig,
    pipeline: Pipeline,
}

impl Spider {
    /// Builds a spider that fetches pages over HTTP.
    pub fn new(config: SpiderConfig) -> Result<Self, SpiderError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Builds a spider whose default pre-fetch listener uses `transport`.
    pub fn with_transport(config: SpiderConfig, transport: Arc<dyn Transport>) -> Self {
        let mut pipeline = Pipeline::new();
        attach_defaults(&mut pipeline, transport);
        Self { config, pipeline }
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn attach<L>(&mut self, stage: Stage, listener: L, priority: i32) -> &mut Self
    where
        L: Listener + 'static,
    {
        self.pipeline.attach(stage, listener, priority);
        self
    }

    pub fn attach_fn<F, R>(&mut self, stage: Stage, f: F, priority: i32) -> &mut Self
    where
        F: Fn(&mut Event<'_>) -> R + Send + Sync + 'static,
        R: Into<Reply> + 'static,
    {
        self.pipeline.attach_fn(stage, f, priority);
        self
    }

    // Crawls breadth-first from `root` until the frontier is empty
    //
    // Never fails: a bad root means zero pages, a failed fetch only skips
    // that page. Check the summary to see what actually happened.
    pub async fn crawl(&self, root: Option<&str>) -> CrawlSummary {
        let mut state = CrawlState::new(self.config.scope);
        let mut summary = CrawlSummary::default();

        state.enter(CrawlPhase::Starting);
        info!(root = root.unwrap_or("<none>"), "crawl starting");
        self.pipeline
            .trigger(
                Stage::Start,
                &mut state,
                Params::with_root(root.map(str::to_string)),
            )
            .await;

        state.enter(CrawlPhase::Visiting);
        summary.root = state.root.clone();
        if summary.root.is_none() {
            warn!("no valid root was established, nothing to crawl");
        }

        while let Some(uri) = state.frontier.next() {
            debug!(url = %uri, queued = state.frontier.len(), "visiting");

            let outcome = self
                .pipeline
                .trigger_until(
                    Stage::PreFetch,
                    &mut state,
                    Params::with_uri(uri.clone()),
                    Reply::is_fetch_success,
                )
                .await;

            let page = match outcome.into_last() {
                Some(Reply::Fetched(FetchOutcome::Success(page))) => page,
                results => {
                    let message = describe_failure(results.as_ref());
                    self.pipeline
                        .trigger(
                            Stage::FetchError,
                            &mut state,
                            Params::with_results(uri.clone(), results),
                        )
                        .await;
                    summary.failed.push(FailedFetch { url: uri, message });
                    continue;
                }
            };

            summary.visited.push(uri.clone());

            let outcome = self
                .pipeline
                .trigger_until(
                    Stage::PostFetch,
                    &mut state,
                    Params::with_results(uri.clone(), Some(Reply::from(page))),
                    Reply::is_links,
                )
                .await;

            let links = match outcome.into_last() {
                Some(Reply::Links(links)) => links.realize().await,
                _ => Vec::new(),
            };

            let found = links.len();
            let mut accepted = 0;
            for link in links {
                match state.scope(&link) {
                    Some(candidate) => {
                        let queued = candidate.to_string();
                        if state.frontier.offer(candidate) {
                            debug!(link = %queued, "link queued");
                            accepted += 1;
                        }
                    }
                    None => debug!(link = %link, "link out of scope"),
                }
            }
            debug!(url = %uri, found, accepted, "links processed");
        }

        state.enter(CrawlPhase::Draining);
        self.pipeline
            .trigger(Stage::Finish, &mut state, Params::default())
            .await;
        state.enter(CrawlPhase::Finished);

        summary.discovered = state.frontier.seen_count();
        info!(
            visited = summary.visited.len(),
            failed = summary.failed.len(),
            discovered = summary.discovered,
            "crawl finished"
        );
        summary
    }
}

impl std::fmt::Debug for Spider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spider")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

fn describe_failure(results: Option<&Reply>) -> String {
    match results {
        Some(Reply::Fetched(FetchOutcome::Failure(error))) => error.to_string(),
        Some(_) => "pre-fetch produced no page".to_string(),
        None => "no pre-fetch listener produced a result".to_string(),
    }
}
