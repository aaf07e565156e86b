// src/crawl/queue.rs
// =============================================================================
// The frontier: pages waiting to be crawled, plus every page ever queued.
//
// How it works:
// 1. offer() a canonical URL
// 2. If we've seen it before, ignore it
// 3. Otherwise remember it and push it to the back of the queue
// 4. next() pops from the front, so pages come out in breadth-first order
//
// The "seen" set only ever grows during a crawl. Because a URL is recorded
// the moment it is queued (not when it is visited), a page that is linked
// from ten places is still fetched exactly once, and cyclic sites terminate.
//
// Rust concepts:
// - HashSet: To track queued URLs (O(1) lookup)
// - VecDeque: Double-ended queue for breadth-first crawling
// =============================================================================

use std::collections::{HashSet, VecDeque};

use super::scope::CanonicalUri;

/// FIFO queue of accepted URLs plus the set of everything ever enqueued.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CanonicalUri>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    // Queues a URL unless it was queued before
    //
    // Returns: true if the URL was new and is now waiting in the queue
    pub fn offer(&mut self, uri: CanonicalUri) -> bool {
        if !self.seen.insert(uri.as_str().to_string()) {
            return false;
        }
        self.queue.push_back(uri);
        true
    }

    // Offers each URL in order, so one page's links keep their document order
    //
    // Returns: how many of them were new
    pub fn offer_all<I>(&mut self, uris: I) -> usize
    where
        I: IntoIterator<Item = CanonicalUri>,
    {
        let mut accepted = 0;
        for uri in uris {
            if self.offer(uri) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Pops the oldest waiting URL.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<CanonicalUri> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of URLs still waiting.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Number of distinct URLs ever queued.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn has_seen(&self, uri: &str) -> bool {
        self.seen.contains(uri)
    }

    // Drops everything still waiting but keeps the seen set, so nothing
    // already queued can be queued again in this crawl
    pub(crate) fn clear_pending(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why store Strings in `seen` instead of CanonicalUri?
//    - Identity is defined by the canonical string
//    - The queue owns the URIs; the set only needs their text
//
// 2. What does HashSet::insert return?
//    - true if the value was not present before
//    - false if it was already there (and the set is unchanged)
//    - That single call does the "check and remember" step at once
//
// 3. Why does offer() take the URI by value?
//    - The queue needs to own it until next() hands it back
//    - Callers that still need it can clone before offering
// -----------------------------------------------------------------------------
