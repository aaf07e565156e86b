// src/config.rs
// =============================================================================
// Settings for the HTTP client and the crawl scope.
//
// Defaults: a 30 second timeout and a single followed redirect per fetch.
// The CLI maps its flags onto this struct, and library users can build one
// with the with_* methods or load it from JSON (every field is optional
// thanks to #[serde(default)]).
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::crawl::ScopePolicy;
use crate::error::SpiderError;

pub const DEFAULT_USER_AGENT: &str = concat!("site-spider/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_REDIRECTS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    /// Sent as the User-Agent header on every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// How many redirects a single fetch may follow
    pub max_redirects: usize,
    /// Which discovered links count as the same site
    pub scope: ScopePolicy,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            scope: ScopePolicy::default(),
        }
    }
}

impl SpiderConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_scope(mut self, scope: ScopePolicy) -> Self {
        self.scope = scope;
        self
    }

    pub fn validate(&self) -> Result<(), SpiderError> {
        if self.timeout_secs == 0 {
            return Err(SpiderError::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(SpiderError::InvalidConfig(
                "user agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
