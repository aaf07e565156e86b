// src/events/stage.rs
// =============================================================================
// The vocabulary of the event pipeline.
//
// - Stage: the five points in a crawl where listeners run
// - Params: the shared parameter bag every listener of one trigger sees
// - Event: a stage + the crawl state + the params, handed to each listener
// - Reply: what a listener hands back (nothing, a fetch result, or links)
//
// Listeners run one after another on the same Event, so a listener can
// change a parameter (for example the root) before later listeners read it.
// =============================================================================

use futures::stream::{BoxStream, Stream, StreamExt};
use std::fmt;

use crate::crawl::{CanonicalUri, CrawlState};
use crate::fetch::{FetchError, FetchOutcome, Page};

/// A named point in the crawl lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Before anything is fetched; params: `root`
    Start,
    /// Before a page is fetched; params: `uri`
    PreFetch,
    /// A page could not be fetched; params: `uri`, `results`
    FetchError,
    /// A page was fetched; params: `uri`, `results`
    PostFetch,
    /// The frontier is empty; no params
    Finish,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Start,
        Stage::PreFetch,
        Stage::FetchError,
        Stage::PostFetch,
        Stage::Finish,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::PreFetch => "pre-fetch",
            Stage::FetchError => "fetch-error",
            Stage::PostFetch => "post-fetch",
            Stage::Finish => "finish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The mutable parameter bag shared by all listeners of one trigger.
#[derive(Debug, Default)]
pub struct Params {
    /// Raw root candidate (start stage)
    pub root: Option<String>,
    /// The page being processed (pre-fetch, fetch-error, post-fetch)
    pub uri: Option<CanonicalUri>,
    /// What pre-fetch produced (fetch-error) or the fetched page (post-fetch)
    pub results: Option<Reply>,
}

impl Params {
    pub fn with_root(root: Option<String>) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn with_uri(uri: CanonicalUri) -> Self {
        Self {
            uri: Some(uri),
            ..Self::default()
        }
    }

    pub fn with_results(uri: CanonicalUri, results: Option<Reply>) -> Self {
        Self {
            uri: Some(uri),
            results,
            ..Self::default()
        }
    }

    /// The fetched page, if `results` holds a successful fetch.
    pub fn page(&self) -> Option<&Page> {
        match &self.results {
            Some(Reply::Fetched(outcome)) => outcome.page(),
            _ => None,
        }
    }

    /// The fetch failure, if `results` holds one.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match &self.results {
            Some(Reply::Fetched(outcome)) => outcome.error(),
            _ => None,
        }
    }
}

/// What one listener invocation sees: the stage, the crawl, the params.
pub struct Event<'a> {
    stage: Stage,
    state: &'a mut CrawlState,
    params: Params,
}

impl<'a> Event<'a> {
    pub fn new(stage: Stage, state: &'a mut CrawlState, params: Params) -> Self {
        Self {
            stage,
            state,
            params,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The crawl this event belongs to (root, frontier, phase).
    pub fn state(&self) -> &CrawlState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut CrawlState {
        &mut *self.state
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("stage", &self.stage)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Links produced by a post-fetch listener, either ready or lazy.
pub enum Links {
    List(Vec<String>),
    Stream(BoxStream<'static, String>),
}

impl Links {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = String> + Send + 'static,
    {
        Links::Stream(stream.boxed())
    }

    /// Turns a lazy stream into a concrete list, preserving order.
    pub async fn realize(self) -> Vec<String> {
        match self {
            Links::List(links) => links,
            Links::Stream(stream) => stream.collect().await,
        }
    }
}

impl fmt::Debug for Links {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Links::List(links) => f.debug_tuple("List").field(links).finish(),
            Links::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// The value a listener returns.
///
/// Stop predicates look at the variant tag: pre-fetch stops on a successful
/// `Fetched`, post-fetch stops on `Links`.
#[derive(Debug)]
pub enum Reply {
    /// Nothing significant; dispatch continues
    Nothing,
    Fetched(FetchOutcome),
    Links(Links),
}

impl Reply {
    pub fn is_fetch_success(&self) -> bool {
        matches!(self, Reply::Fetched(outcome) if outcome.is_success())
    }

    pub fn is_links(&self) -> bool {
        matches!(self, Reply::Links(_))
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Nothing
    }
}

impl From<FetchOutcome> for Reply {
    fn from(outcome: FetchOutcome) -> Self {
        Reply::Fetched(outcome)
    }
}

impl From<Page> for Reply {
    fn from(page: Page) -> Self {
        Reply::Fetched(FetchOutcome::Success(page))
    }
}

impl From<FetchError> for Reply {
    fn from(error: FetchError) -> Self {
        Reply::Fetched(FetchOutcome::Failure(error))
    }
}

impl From<Links> for Reply {
    fn from(links: Links) -> Self {
        Reply::Links(links)
    }
}

impl From<Vec<String>> for Reply {
    fn from(links: Vec<String>) -> Self {
        Reply::Links(Links::List(links))
    }
}

impl From<Vec<&str>> for Reply {
    fn from(links: Vec<&str>) -> Self {
        links
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into()
    }
}
