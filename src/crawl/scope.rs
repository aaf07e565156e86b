// src/crawl/scope.rs
// =============================================================================
// This module decides which discovered links belong to the crawl.
//
// Every link found on a page goes through `normalize()`:
// 1. Reject empty or unparseable input
// 2. Resolve relative links (like "/about") against the crawl root
// 3. Keep only http/https URLs that have a host
// 4. Keep only URLs on the same site as the root
// 5. Return a canonical form (lower-case host, no default port,
//    no "." or ".." segments, no #fragment)
//
// Two links are "the same page" when their canonical strings are equal.
// That is what the frontier uses to avoid visiting a page twice.
//
// Rust concepts:
// - Newtype pattern: CanonicalUri wraps Url so only this module can build one
// - Option<T>: A rejected link is simply None, never an error
// =============================================================================

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use url::{ParseError, Url};

/// An absolute, normalized http(s) URL.
///
/// Only `normalize()` can produce one, so holding a `CanonicalUri` means the
/// value has already been validated and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUri(Url);

impl CanonicalUri {
    /// The canonical string form, which is also the identity used for dedup.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }
}

impl fmt::Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CanonicalUri {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// Serialized as a plain string so JSON output reads naturally
impl Serialize for CanonicalUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How strictly a link must match the root to stay in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopePolicy {
    /// Scheme, host and port must all match the root.
    #[default]
    SameOrigin,
    /// Only the host has to match (http and https pages of one host mix).
    SameHost,
}

// Turns a raw link into a CanonicalUri, or rejects it
//
// Parameters:
//   candidate: the raw href or URL string (absolute or relative)
//   root: the crawl root, or None while the root itself is being established
//   policy: how to compare the candidate against the root
//
// Returns: Some(canonical) if the link is in scope, None otherwise
//
// Examples (root = http://ex.com/):
//   "/about"               -> Some("http://ex.com/about")
//   "HTTP://EX.COM:80/a#x" -> Some("http://ex.com/a")
//   "http://other.com/"    -> None (different site)
//   "mailto:me@ex.com"     -> None (not http/https)
pub fn normalize(
    candidate: &str,
    root: Option<&CanonicalUri>,
    policy: ScopePolicy,
) -> Option<CanonicalUri> {
    if candidate.trim().is_empty() {
        return None;
    }

    let mut url = match Url::parse(candidate) {
        Ok(url) => url,
        // Relative links can only be resolved once a root exists
        Err(ParseError::RelativeUrlWithoutBase) => root?.as_url().join(candidate).ok()?,
        Err(_) => return None,
    };

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return None,
    }

    if let Some(root) = root {
        if !in_scope(&url, root.as_url(), policy) {
            return None;
        }
    }

    // The parser already lower-cased scheme and host, dropped default ports
    // and removed dot segments; the fragment is all that is left to strip.
    url.set_fragment(None);

    Some(CanonicalUri(url))
}

fn in_scope(url: &Url, root: &Url, policy: ScopePolicy) -> bool {
    match policy {
        ScopePolicy::SameOrigin => url.origin() == root.origin(),
        ScopePolicy::SameHost => url.host_str() == root.host_str(),
    }
}
