//! Manifest fetching against a mock HTTP server.

use docsource_core::IconType;
use docsource_net::http::HttpClient;
use docsource_net::{ManifestError, ManifestFetcher, NetworkError};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> ManifestFetcher<HttpClient> {
    ManifestFetcher::new(HttpClient::new().expect("Failed to build client"))
}

fn manifest_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/appInfo.json", server.uri())).unwrap()
}

#[tokio::test]
async fn test_fetch_resolves_relative_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/appInfo.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "icons": [
                {"type": "spotlight", "size": 29, "url": "icons/icon29.png"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manifest = fetcher()
        .fetch(&manifest_url(&server))
        .await
        .expect("fetch failed");

    let entry = manifest
        .select(&IconType::Spotlight)
        .expect("spotlight entry");
    assert_eq!(
        entry.url().as_str(),
        format!("{}/icons/icon29.png", server.uri())
    );
    assert!(manifest.select(&IconType::custom("settings", 29)).is_none());
}

#[tokio::test]
async fn test_fetch_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/appInfo.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>moved</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher().fetch(&manifest_url(&server)).await.unwrap_err();
    assert!(matches!(err, ManifestError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_fetch_empty_listing_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/appInfo.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"icons": []})))
        .mount(&server)
        .await;

    let err = fetcher().fetch(&manifest_url(&server)).await.unwrap_err();
    assert!(matches!(err, ManifestError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_fetch_error_status_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/appInfo.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher().fetch(&manifest_url(&server)).await.unwrap_err();
    assert_eq!(
        err,
        ManifestError::Network(NetworkError::HttpStatus {
            status: 404,
            message: None,
        })
    );
}
