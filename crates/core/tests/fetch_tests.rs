//! HTTP fetcher integration tests against a local responder
mod common;

use std::io::Write;
use std::time::Duration;

use common::{Reply, TestServer, html, response};
use flate2::Compression;
use flate2::write::GzEncoder;
use pagechat_core::*;
use rstest::rstest;

fn fetcher(timeout: u64, max_redirects: usize) -> HttpFetcher {
    HttpFetcher::new(FetchConfig {
        timeout,
        max_redirects,
        retry_backoff: Duration::from_millis(10),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_success() {
    let server = TestServer::start(|_, _| html("<h1>Hello</h1><p>World</p>")).await;

    let page = fetcher(5, 5).fetch(&server.url("/page")).await.unwrap();

    assert_eq!(page.status, 200);
    assert!(page.body.contains("<h1>Hello</h1>"));
    assert_eq!(page.final_url.path(), "/page");
    assert!(page.content_type.unwrap().starts_with("text/html"));
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_transient_failure_retried_once() {
    let server = TestServer::start(|attempt, _| if attempt == 0 { Reply::Hangup } else { html("<p>second try</p>") }).await;

    let page = fetcher(5, 5).fetch(&server.url("/")).await.unwrap();

    assert!(page.body.contains("second try"));
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_persistent_network_failure_gives_up_after_retry() {
    let server = TestServer::start(|_, _| Reply::Hangup).await;

    let result = fetcher(5, 5).fetch(&server.url("/")).await;

    assert!(matches!(result, Err(FetchError::Network(_))));
    assert_eq!(server.hits(), 2);
}

#[rstest]
#[case("404 Not Found", 404)]
#[case("500 Internal Server Error", 500)]
#[case("503 Service Unavailable", 503)]
#[tokio::test]
async fn test_status_errors_not_retried(#[case] status: &'static str, #[case] code: u16) {
    let server = TestServer::start(move |_, _| response(status, &[], b"nope")).await;

    let result = fetcher(5, 5).fetch(&server.url("/missing")).await;

    match result {
        Err(FetchError::HttpStatusError { code: got }) => assert_eq!(got, code),
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_redirect_followed_and_final_url_recorded() {
    let server = TestServer::start(|_, path| match path {
        "/start" => response("301 Moved Permanently", &[("Location", "/final")], b""),
        _ => html("<p>landed</p>"),
    })
    .await;

    let page = fetcher(5, 5).fetch(&server.url("/start")).await.unwrap();

    assert_eq!(page.requested_url.path(), "/start");
    assert_eq!(page.final_url.path(), "/final");
    assert!(page.body.contains("landed"));
}

#[tokio::test]
async fn test_redirect_loop_exceeds_limit() {
    let server = TestServer::start(|_, _| response("302 Found", &[("Location", "/loop")], b"")).await;

    let result = fetcher(5, 2).fetch(&server.url("/loop")).await;

    assert!(matches!(result, Err(FetchError::TooManyRedirects { max: 2 })));
}

#[tokio::test]
async fn test_gzip_body_is_decoded() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"<p>compressed content</p>").unwrap();
    let gz = encoder.finish().unwrap();

    let server = TestServer::start(move |_, _| {
        response(
            "200 OK",
            &[("Content-Type", "text/html"), ("Content-Encoding", "gzip")],
            &gz,
        )
    })
    .await;

    let page = fetcher(5, 5).fetch(&server.url("/")).await.unwrap();
    assert_eq!(page.body, "<p>compressed content</p>");
}

#[tokio::test]
async fn test_corrupt_encoding_is_decode_error() {
    let server = TestServer::start(|_, _| {
        response(
            "200 OK",
            &[("Content-Type", "text/html"), ("Content-Encoding", "gzip")],
            b"this is definitely not gzip data",
        )
    })
    .await;

    let result = fetcher(5, 5).fetch(&server.url("/")).await;

    assert!(matches!(result, Err(FetchError::DecodeError(_))), "got {result:?}");
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_timeout_retried_then_reported() {
    let server = TestServer::start(|_, _| Reply::Stall(Duration::from_secs(10))).await;

    let result = fetcher(1, 5).fetch(&server.url("/slow")).await;

    assert!(matches!(result, Err(FetchError::Timeout { timeout: 1 })));
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_malformed_url_never_connects() {
    let server = TestServer::start(|_, _| html("<p>unreachable</p>")).await;

    let result = fetcher(5, 5).fetch("ftp://127.0.0.1/file").await;

    assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    assert_eq!(server.hits(), 0);
}
