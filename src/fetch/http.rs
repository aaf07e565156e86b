// src/fetch/http.rs
// =============================================================================
// This module downloads pages over HTTP.
//
// Key functionality:
// - The Transport trait: "give me this URL's page, or tell me why not"
// - HttpTransport: the real implementation, built on reqwest
// - Detects the various failure modes (404, timeout, SSL errors, etc.)
//
// A fetch never panics and never aborts the crawl. Every problem becomes a
// FetchError value that the crawler can route to the fetch-error stage.
//
// Rust concepts:
// - Traits: Transport lets tests swap the network for an in-memory site
// - async/await: The network call is the one place the crawler waits
// - Enums: FetchOutcome is either a page or a reason it failed
// =============================================================================

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect, Client};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::html::is_html;
use crate::config::SpiderConfig;
use crate::crawl::CanonicalUri;
use crate::error::SpiderError;

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code (always 2xx for pages built by HttpTransport)
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl Page {
    pub fn new(url: Url, status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            headers,
            body: body.into(),
        }
    }

    // Builds a 200 text/html page, handy for listeners that serve
    // content without touching the network
    pub fn html(uri: &CanonicalUri, body: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        Self::new(uri.as_url().clone(), 200, headers, body)
    }

    /// The raw Content-Type header, if present and valid text.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn is_html(&self) -> bool {
        is_html(self.content_type())
    }
}

/// Why a page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request timed out
    #[error("request timed out")]
    Timeout,
    /// Too many redirects (redirect loop or over the configured limit)
    #[error("too many redirects")]
    TooManyRedirects,
    /// Could not resolve hostname
    #[error("could not resolve hostname: {0}")]
    Dns(String),
    /// Host unreachable, connection refused, reset...
    #[error("connection failed: {0}")]
    Connect(String),
    /// SSL/TLS certificate error
    #[error("SSL certificate error: {0}")]
    Tls(String),
    /// The server answered with a non-2xx status
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },
    /// Headers arrived but the body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),
    /// Anything else, including listeners that produced no page at all
    #[error("{0}")]
    Other(String),
}

/// Result of one fetch: a page or a failure.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(Page),
    Failure(FetchError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn page(&self) -> Option<&Page> {
        match self {
            FetchOutcome::Success(page) => Some(page),
            FetchOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(error) => Some(error),
        }
    }
}

impl From<Result<Page, FetchError>> for FetchOutcome {
    fn from(result: Result<Page, FetchError>) -> Self {
        match result {
            Ok(page) => FetchOutcome::Success(page),
            Err(error) => FetchOutcome::Failure(error),
        }
    }
}

/// Anything that can turn a URL into a page.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, uri: &CanonicalUri) -> Result<Page, FetchError>;
}

/// The reqwest-backed transport used by default.
///
/// One client is built per spider and reused for every page, so
/// connections are pooled across the crawl.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &SpiderConfig) -> Result<Self, SpiderError> {
        config.validate()?;

        let redirects = redirect_policy(config.max_redirects);

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirects)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, uri: &CanonicalUri) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(uri.as_str())
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        debug!(url = %uri, status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(Page::new(url, status.as_u16(), headers, body))
    }
}

// Builds the redirect policy for a fetch that may follow `max_redirects` hops
//
// Zero means hand back the 3xx itself, which then counts as a non-2xx
// failure. reqwest's limit counts the requested URL as well as each hop,
// so N followed redirects needs a limit of N + 1.
fn redirect_policy(max_redirects: usize) -> redirect::Policy {
    if max_redirects == 0 {
        redirect::Policy::none()
    } else {
        redirect::Policy::limited(max_redirects.saturating_add(1))
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
// - etc.
//
// The interesting detail is often buried in the error's source chain, so
// the whole chain is searched when guessing the category.
fn categorize_error(error: reqwest::Error) -> FetchError {
    let message = error.to_string();
    let chain = source_chain(&error).to_lowercase();

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if chain.contains("certificate") || chain.contains("ssl") || chain.contains("tls") {
        FetchError::Tls(message)
    } else if error.is_connect() {
        if chain.contains("dns") || chain.contains("resolve") {
            FetchError::Dns(message)
        } else {
            FetchError::Connect(message)
        }
    } else {
        FetchError::Other(message)
    }
}

fn source_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        chain.push_str(": ");
        chain.push_str(&inner.to_string());
        source = inner.source();
    }
    chain
}
