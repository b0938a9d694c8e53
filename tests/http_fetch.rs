//! HttpClient against a local server: status mapping, retries and timeouts

mod common;

use std::time::Duration;
use url::Url;

use common::{Route, TestServer, test_fetch_config};
use learn_module_reader::domain::PageFetcher;
use learn_module_reader::infrastructure::{FetchConfig, HttpClient, ReaderError};

fn client(config: FetchConfig) -> HttpClient {
    HttpClient::with_config(config).unwrap()
}

#[tokio::test]
async fn fetches_page_body() {
    let server = TestServer::start(vec![("/page", Route::Html("<p>hello</p>".to_string()))]).await;
    let url = Url::parse(&server.url("/page")).unwrap();

    let body = client(test_fetch_config()).fetch(&url, Duration::from_secs(5)).await.unwrap();
    assert_eq!(body, "<p>hello</p>");
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = TestServer::start(vec![("/gone", Route::Status(404))]).await;
    let url = Url::parse(&server.url("/gone")).unwrap();

    let err = client(test_fetch_config()).fetch(&url, Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, ReaderError::HttpStatus { code: 404, .. }), "unexpected error: {err:?}");
    assert_eq!(server.hits("/gone"), 1);
}

#[tokio::test]
async fn transient_status_is_retried_until_success() {
    let server = TestServer::start(vec![(
        "/busy",
        Route::Flaky {
            failures: 2,
            code: 503,
            body: "<p>finally</p>".to_string(),
        },
    )])
    .await;
    let url = Url::parse(&server.url("/busy")).unwrap();

    let body = client(test_fetch_config()).fetch(&url, Duration::from_secs(5)).await.unwrap();
    assert_eq!(body, "<p>finally</p>");
    assert_eq!(server.hits("/busy"), 3);
}

#[tokio::test]
async fn retries_are_capped() {
    let server = TestServer::start(vec![("/down", Route::Status(500))]).await;
    let url = Url::parse(&server.url("/down")).unwrap();
    let config = FetchConfig {
        max_retries: 1,
        ..test_fetch_config()
    };

    let err = client(config).fetch(&url, Duration::from_secs(5)).await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(server.hits("/down"), 2);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = TestServer::start(vec![("/slow", Route::Hang(Duration::from_secs(10)))]).await;
    let url = Url::parse(&server.url("/slow")).unwrap();
    let config = FetchConfig {
        max_retries: 0,
        ..test_fetch_config()
    };

    let err = client(config).fetch(&url, Duration::from_millis(300)).await.unwrap_err();
    match err {
        ReaderError::Network { timed_out, .. } => assert!(timed_out),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = Url::parse(&format!("http://127.0.0.1:{port}/page")).unwrap();
    let config = FetchConfig {
        max_retries: 0,
        ..test_fetch_config()
    };

    let err = client(config).fetch(&url, Duration::from_secs(2)).await.unwrap_err();
    match err {
        ReaderError::Network { timed_out, .. } => assert!(!timed_out),
        other => panic!("expected a network error, got {other:?}"),
    }
}
