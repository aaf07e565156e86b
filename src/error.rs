// src/error.rs
// =============================================================================
// Errors that can stop a Spider from being built.
//
// Crawling itself never fails: bad links are dropped and failed fetches go
// to the fetch-error stage. Only construction can go wrong, for example
// when the HTTP client rejects the configured user agent.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpiderError {
    /// The configuration makes no sense (e.g. a zero timeout)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// reqwest could not build an HTTP client from the configuration
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
