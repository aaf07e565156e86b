// src/events/pipeline.rs
// =============================================================================
// The event pipeline: a registry of listeners per stage, run in priority
// order, that can stop early.
//
// How a trigger works:
// 1. Look up the listeners attached to the stage, highest priority first
//    (equal priorities keep the order they were attached in)
// 2. Hand every listener the same Event, so changes to its params are seen
//    by the listeners that come after it
// 3. After each listener, ask the stop predicate (if any) about its reply;
//    if it says yes, stop right there
// 4. Report whether we stopped and what the last reply was
//
// This is the only way to extend the crawler. An observer attaches a
// listener that returns Reply::Nothing. An override attaches a listener
// with a higher priority than the built-in one whose reply satisfies the
// stage's stop predicate, so the built-in listener never runs.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, trace};

use super::stage::{Event, Params, Reply, Stage};
use crate::crawl::CrawlState;

/// Something that reacts to a stage.
///
/// Implement this for listeners that need to `.await` (like the default
/// fetcher). Plain closures can be attached with `Pipeline::attach_fn`.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn on_event(&self, event: &mut Event<'_>) -> Reply;
}

/// Adapts a synchronous closure into a Listener.
pub struct FnListener<F, R> {
    f: F,
    _reply: PhantomData<fn() -> R>,
}

impl<F, R> FnListener<F, R>
where
    F: Fn(&mut Event<'_>) -> R + Send + Sync,
    R: Into<Reply>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _reply: PhantomData,
        }
    }
}

#[async_trait]
impl<F, R> Listener for FnListener<F, R>
where
    F: Fn(&mut Event<'_>) -> R + Send + Sync,
    R: Into<Reply>,
{
    async fn on_event(&self, event: &mut Event<'_>) -> Reply {
        (self.f)(event).into()
    }
}

struct Registration {
    priority: i32,
    listener: Box<dyn Listener>,
}

/// Listeners per stage, each list kept sorted by descending priority.
#[derive(Default)]
pub struct Pipeline {
    stages: HashMap<Stage, Vec<Registration>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    // Attaches a listener to a stage
    //
    // Higher priorities run first. A new listener goes after every listener
    // that already has the same priority, so ties run in attach order.
    pub fn attach<L>(&mut self, stage: Stage, listener: L, priority: i32) -> &mut Self
    where
        L: Listener + 'static,
    {
        let registrations = self.stages.entry(stage).or_default();
        let position = registrations.partition_point(|r| r.priority >= priority);
        registrations.insert(
            position,
            Registration {
                priority,
                listener: Box::new(listener),
            },
        );
        debug!(%stage, priority, position, "listener attached");
        self
    }

    /// Attaches a plain closure; its return value is converted into a Reply.
    pub fn attach_fn<F, R>(&mut self, stage: Stage, f: F, priority: i32) -> &mut Self
    where
        F: Fn(&mut Event<'_>) -> R + Send + Sync + 'static,
        R: Into<Reply> + 'static,
    {
        self.attach(stage, FnListener::new(f), priority)
    }

    pub fn listener_count(&self, stage: Stage) -> usize {
        self.stages.get(&stage).map_or(0, Vec::len)
    }

    /// Priorities of a stage's listeners in the order they will run.
    pub fn priorities(&self, stage: Stage) -> Vec<i32> {
        self.stages
            .get(&stage)
            .map(|registrations| registrations.iter().map(|r| r.priority).collect())
            .unwrap_or_default()
    }

    /// Runs every listener of `stage`, never stopping early.
    pub async fn trigger(
        &self,
        stage: Stage,
        state: &mut CrawlState,
        params: Params,
    ) -> TriggerOutcome {
        self.dispatch(stage, state, params, None).await
    }

    /// Runs the listeners of `stage` until one reply satisfies `until`.
    pub async fn trigger_until<P>(
        &self,
        stage: Stage,
        state: &mut CrawlState,
        params: Params,
        until: P,
    ) -> TriggerOutcome
    where
        P: Fn(&Reply) -> bool + Sync,
    {
        let until: &(dyn Fn(&Reply) -> bool + Sync) = &until;
        self.dispatch(stage, state, params, Some(until)).await
    }

    async fn dispatch(
        &self,
        stage: Stage,
        state: &mut CrawlState,
        params: Params,
        until: Option<&(dyn Fn(&Reply) -> bool + Sync)>,
    ) -> TriggerOutcome {
        let registrations = self.stages.get(&stage).map_or(&[][..], Vec::as_slice);
        let mut event = Event::new(stage, state, params);

        let mut last = None;
        let mut stopped = false;
        let mut dispatched = 0;

        for registration in registrations {
            let reply = registration.listener.on_event(&mut event).await;
            dispatched += 1;

            let stop = until.is_some_and(|until| until(&reply));
            last = Some(reply);

            if stop {
                trace!(%stage, priority = registration.priority, "dispatch stopped");
                stopped = true;
                break;
            }
        }

        TriggerOutcome {
            stopped,
            dispatched,
            last,
            params: event.into_params(),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for stage in Stage::ALL {
            map.entry(&stage.name(), &self.priorities(stage));
        }
        map.finish()
    }
}

/// What happened during one trigger.
#[derive(Debug)]
pub struct TriggerOutcome {
    stopped: bool,
    dispatched: usize,
    last: Option<Reply>,
    params: Params,
}

impl TriggerOutcome {
    /// True if a reply satisfied the stop predicate.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// How many listeners actually ran.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// The stopping listener's reply, or the final listener's reply, or
    /// None if nothing was attached.
    pub fn last(&self) -> Option<&Reply> {
        self.last.as_ref()
    }

    pub fn into_last(self) -> Option<Reply> {
        self.last
    }

    /// The params as the last listener left them.
    pub fn params(&self) -> &Params {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::ScopePolicy;
    use std::sync::{Arc, Mutex};

    fn recorder(
        pipeline: &mut Pipeline,
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
        priority: i32,
    ) {
        let log = Arc::clone(log);
        pipeline.attach_fn(
            Stage::Finish,
            move |_event: &mut Event<'_>| {
                log.lock().unwrap().push(name);
            },
            priority,
        );
    }

    #[tokio::test]
    async fn test_priority_order_is_descending_and_stable() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        recorder(&mut pipeline, &log, "low", -1000);
        recorder(&mut pipeline, &log, "first-ten", 10);
        recorder(&mut pipeline, &log, "zero", 0);
        recorder(&mut pipeline, &log, "second-ten", 10);

        let mut state = CrawlState::new(ScopePolicy::default());
        let outcome = pipeline
            .trigger(Stage::Finish, &mut state, Params::default())
            .await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first-ten", "second-ten", "zero", "low"]
        );
        assert_eq!(pipeline.priorities(Stage::Finish), vec![10, 10, 0, -1000]);
        assert_eq!(outcome.dispatched(), 4);
        assert!(!outcome.stopped());
        assert!(matches!(outcome.last(), Some(Reply::Nothing)));
    }

    #[tokio::test]
    async fn test_stop_predicate_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();

        pipeline.attach_fn(Stage::PostFetch, |_event: &mut Event<'_>| (), 20);
        pipeline.attach_fn(Stage::PostFetch, |_event: &mut Event<'_>| vec!["/x"], 10);
        let never = Arc::clone(&log);
        pipeline.attach_fn(
            Stage::PostFetch,
            move |_event: &mut Event<'_>| {
                never.lock().unwrap().push("never");
                vec!["/y"]
            },
            -1000,
        );

        let mut state = CrawlState::new(ScopePolicy::default());
        let outcome = pipeline
            .trigger_until(Stage::PostFetch, &mut state, Params::default(), Reply::is_links)
            .await;

        assert!(outcome.stopped());
        assert_eq!(outcome.dispatched(), 2);
        match outcome.into_last() {
            Some(Reply::Links(links)) => assert_eq!(links.realize().await, vec!["/x"]),
            other => panic!("expected links, got {other:?}"),
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_params_mutations_are_visible_downstream() {
        let mut pipeline = Pipeline::new();
        pipeline.attach_fn(
            Stage::Start,
            |event: &mut Event<'_>| {
                event.params_mut().root = Some("http://rewritten.test/".to_string());
            },
            5,
        );
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        pipeline.attach_fn(
            Stage::Start,
            move |event: &mut Event<'_>| {
                *sink.lock().unwrap() = event.params().root.clone();
            },
            1,
        );

        let mut state = CrawlState::new(ScopePolicy::default());
        let outcome = pipeline
            .trigger(
                Stage::Start,
                &mut state,
                Params::with_root(Some("http://original.test/".to_string())),
            )
            .await;

        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("http://rewritten.test/")
        );
        assert_eq!(
            outcome.params().root.as_deref(),
            Some("http://rewritten.test/")
        );
    }

    #[tokio::test]
    async fn test_empty_stage() {
        let pipeline = Pipeline::new();
        let mut state = CrawlState::new(ScopePolicy::default());
        let outcome = pipeline
            .trigger_until(Stage::PreFetch, &mut state, Params::default(), Reply::is_fetch_success)
            .await;

        assert!(!outcome.stopped());
        assert_eq!(outcome.dispatched(), 0);
        assert!(outcome.last().is_none());
        assert_eq!(pipeline.listener_count(Stage::PreFetch), 0);
    }
}
