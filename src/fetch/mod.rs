// src/fetch/mod.rs
// =============================================================================
// The leaf operations the crawler depends on.
//
// Submodules:
// - http: Downloading a page (Transport trait + reqwest implementation)
// - html: Extracting anchor hrefs from a downloaded HTML page
// =============================================================================

mod html;
mod http;

pub use html::{extract_anchor_hrefs, is_html};
pub use http::{FetchError, FetchOutcome, HttpTransport, Page, Transport};
