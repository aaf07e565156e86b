// tests/http.rs
// =============================================================================
// End-to-end crawls over real HTTP against a local wiremock server.
//
// These go through HttpTransport (reqwest), so they also check status
// handling, content types, redirects, timeouts and the User-Agent header.
// =============================================================================

use site_spider::{Event, FetchError, Spider, SpiderConfig, Stage};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();
    format!("<!doctype html><html><body><ul>{}</ul></body></html>", anchors)
}

async fn serve_html(server: &MockServer, route: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html(links), "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

// Collects (url, error) for every fetch-error event
fn record_errors(spider: &mut Spider) -> Arc<Mutex<Vec<(String, Option<FetchError>)>>> {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    spider.attach_fn(
        Stage::FetchError,
        move |event: &mut Event<'_>| {
            let url = event
                .params()
                .uri
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_default();
            sink.lock()
                .unwrap()
                .push((url, event.params().fetch_error().cloned()));
        },
        10,
    );
    errors
}

#[tokio::test]
async fn test_crawls_local_site_once_per_page() {
    let server = MockServer::start().await;
    serve_html(&server, "/", &["/about", "/contact", "https://example.org/"]).await;
    serve_html(&server, "/about", &["/", "/contact", "/about#team"]).await;
    serve_html(&server, "/contact", &["/", "/about"]).await;

    let spider = Spider::new(SpiderConfig::default()).unwrap();
    let summary = spider.crawl(Some(&server.uri())).await;

    let visited: Vec<String> = summary.visited.iter().map(|u| u.path().to_string()).collect();
    assert_eq!(visited, vec!["/", "/about", "/contact"]);
    assert!(summary.failed.is_empty());
    // expect(1) on every mock is checked when the server drops
}

#[tokio::test]
async fn test_not_found_goes_to_fetch_error() {
    let server = MockServer::start().await;
    serve_html(&server, "/", &["/missing", "/ok"]).await;
    serve_html(&server, "/ok", &[]).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_raw(html(&["/never"]), "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let mut spider = Spider::new(SpiderConfig::default()).unwrap();
    let errors = record_errors(&mut spider);
    let summary = spider.crawl(Some(&server.uri())).await;

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].0.ends_with("/missing"));
    assert_eq!(errors[0].1, Some(FetchError::HttpStatus { status: 404 }));
    assert_eq!(summary.visited.len(), 2);
    assert_eq!(summary.failed[0].message, "HTTP 404");
}

#[tokio::test]
async fn test_non_html_response_is_visited_but_not_parsed() {
    let server = MockServer::start().await;
    serve_html(&server, "/", &["/data.json"]).await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"html": "<a href=\"/hidden\">x</a>"}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let spider = Spider::new(SpiderConfig::default()).unwrap();
    let summary = spider.crawl(Some(&server.uri())).await;

    assert_eq!(summary.visited.len(), 2);
    assert_eq!(summary.discovered, 2);
}

#[tokio::test]
async fn test_slow_page_times_out_and_crawl_continues() {
    let server = MockServer::start().await;
    serve_html(&server, "/", &["/slow", "/fast"]).await;
    serve_html(&server, "/fast", &[]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html(&[]), "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut spider = Spider::new(SpiderConfig::default().with_timeout_secs(1)).unwrap();
    let errors = record_errors(&mut spider);
    let summary = spider.crawl(Some(&server.uri())).await;

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].0.ends_with("/slow"));
    assert_eq!(errors[0].1, Some(FetchError::Timeout));

    let visited: Vec<&str> = summary.visited.iter().map(|u| u.path()).collect();
    assert_eq!(visited, vec!["/", "/fast"]);
}

#[tokio::test]
async fn test_single_redirect_is_followed() {
    let server = MockServer::start().await;
    serve_html(&server, "/", &["/old"]).await;
    serve_html(&server, "/new", &[]).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .expect(1)
        .mount(&server)
        .await;

    let mut spider = Spider::new(SpiderConfig::default()).unwrap();
    let final_urls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&final_urls);
    spider.attach_fn(
        Stage::PostFetch,
        move |event: &mut Event<'_>| {
            if let Some(page) = event.params().page() {
                sink.lock().unwrap().push(page.url.path().to_string());
            }
        },
        10,
    );

    let summary = spider.crawl(Some(&server.uri())).await;

    // The frontier records the requested URL, the page knows where it ended up
    let visited: Vec<&str> = summary.visited.iter().map(|u| u.path()).collect();
    assert_eq!(visited, vec!["/", "/old"]);
    assert_eq!(*final_urls.lock().unwrap(), vec!["/", "/new"]);
}

// Serves "/" linking to "/start", which redirects to "/mid", which
// redirects to "/end": a chain of exactly two hops. The expected request
// counts for "/mid" and "/end" are checked when the server drops.
async fn redirect_chain(mid_hits: u64, end_hits: u64) -> MockServer {
    let server = MockServer::start().await;
    serve_html(&server, "/", &["/start"]).await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/mid"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mid"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/end"))
        .expect(mid_hits)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/end"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html(&[]), "text/html"))
        .expect(end_hits)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_zero_redirects_returns_the_3xx_as_a_failure() {
    let server = redirect_chain(0, 0).await;

    let mut spider = Spider::new(SpiderConfig::default().with_max_redirects(0)).unwrap();
    let errors = record_errors(&mut spider);
    let summary = spider.crawl(Some(&server.uri())).await;

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].0.ends_with("/start"));
    assert_eq!(errors[0].1, Some(FetchError::HttpStatus { status: 302 }));
    assert_eq!(summary.visited.len(), 1);
}

#[tokio::test]
async fn test_one_redirect_allowed_stops_on_the_second_hop() {
    // "/mid" is requested once, its redirect to "/end" is the one too many
    let server = redirect_chain(1, 0).await;

    let mut spider = Spider::new(SpiderConfig::default().with_max_redirects(1)).unwrap();
    let errors = record_errors(&mut spider);
    let summary = spider.crawl(Some(&server.uri())).await;

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].0.ends_with("/start"));
    assert_eq!(errors[0].1, Some(FetchError::TooManyRedirects));
    assert_eq!(summary.visited.len(), 1);
}

#[tokio::test]
async fn test_two_redirects_allowed_reaches_the_end_of_the_chain() {
    let server = redirect_chain(1, 1).await;

    let mut spider = Spider::new(SpiderConfig::default().with_max_redirects(2)).unwrap();
    let errors = record_errors(&mut spider);
    let summary = spider.crawl(Some(&server.uri())).await;

    assert!(errors.lock().unwrap().is_empty());
    let visited: Vec<&str> = summary.visited.iter().map(|u| u.path()).collect();
    assert_eq!(visited, vec!["/", "/start"]);
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "test-bot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html(&[]), "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let config = SpiderConfig::default().with_user_agent("test-bot/1.0");
    let spider = Spider::new(config).unwrap();
    let summary = spider.crawl(Some(&server.uri())).await;

    assert_eq!(summary.visited.len(), 1);
}
