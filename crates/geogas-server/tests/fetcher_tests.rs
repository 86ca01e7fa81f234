//! DocumentFetcher tests against a local wiremock server

use geogas_server::sync::{DocumentFetcher, DocumentSource, FetchError, SyncConfig};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRICES_XML: &str = r#"<places><place place_id="5"><gas_price type="regular">22.50</gas_price></place></places>"#;

fn fetcher(timeout_secs: u64) -> DocumentFetcher {
    let config = SyncConfig {
        timeout_secs,
        ..SyncConfig::default()
    };
    DocumentFetcher::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_returns_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/publicaciones/prices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(PRICES_XML, "application/xml; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/publicaciones/prices", server.uri());
    let document = fetcher(5).fetch(&url).await.unwrap();

    assert_eq!(document.body, PRICES_XML);
    assert_eq!(
        document.content_type.as_deref(),
        Some("application/xml; charset=utf-8")
    );
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let fetcher = fetcher(5);

    let err = fetcher.fetch(&format!("{}/missing", server.uri())).await.unwrap_err();
    assert!(matches!(err, FetchError::HttpStatus { code: 404 }));

    let err = fetcher.fetch(&format!("{}/broken", server.uri())).await.unwrap_err();
    assert!(matches!(err, FetchError::HttpStatus { code: 500 }));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PRICES_XML)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = fetcher(1).fetch(&server.uri()).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout { secs: 1 }));
}

#[tokio::test]
async fn test_unreachable_host_is_a_network_error() {
    let err = fetcher(5).fetch("http://127.0.0.1:1/prices").await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn test_empty_body_is_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let document = fetcher(5).fetch(&server.uri()).await.unwrap();

    assert!(document.body.is_empty());
}
