// src/events/mod.rs
// =============================================================================
// This module is the crawler's extension point.
//
// Submodules:
// - stage: Stage names, the Event handed to listeners, Params and Reply
// - pipeline: Attaching listeners and triggering stages in priority order
// =============================================================================

mod pipeline;
mod stage;

pub use pipeline::{FnListener, Listener, Pipeline, TriggerOutcome};
pub use stage::{Event, Links, Params, Reply, Stage};
