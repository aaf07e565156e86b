// src/fetch/html.rs
// =============================================================================
// This module pulls raw anchor hrefs out of HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// The hrefs come back exactly as written in the page: relative, absolute,
// duplicated or empty. Resolving and filtering them is the scope filter's job.
// =============================================================================

use scraper::{Html, Selector};

// Extracts the href of every <a> element, in document order
//
// Example:
//   html = "<a href='/docs'>Docs</a><a href=''>x</a><a href='/docs'>again</a>"
//   result = ["/docs", "", "/docs"]
pub fn extract_anchor_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // "a[href]" is a constant selector; if it ever failed to parse we
    // would simply find no links
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

// Checks whether a Content-Type header value describes an HTML document
//
// Only the media type before any ";" parameters is compared, ignoring case:
//   "text/html; charset=utf-8" -> true
//   "TEXT/HTML"                -> true
//   "application/json"         -> false
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case("text/html"))
        .unwrap_or(false)
}
