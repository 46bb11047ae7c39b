//! Integration tests for icon resolution: single-flight, caching and error
//! handling.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use docsource_core::IconType;
use docsource_icon::{IconCache, IconCacheConfig, IconCacheKey, IconResolver, ResolveError};
use docsource_net::http::HttpClient;
use docsource_net::{NetworkError, Transport};
use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::Barrier;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFEST_URL: &str = "https://workingcopyapp.com/appInfo.json";
const ICON_URL: &str = "https://workingcopyapp.com/icon29.png";

fn png(size: u32) -> Bytes {
    let image = RgbaImage::from_pixel(size, size, Rgba([0, 128, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    Bytes::from(out.into_inner())
}

fn spotlight_manifest() -> Bytes {
    Bytes::from_static(br#"{"icons":[{"type":"spotlight","size":29,"url":"icon29.png"}]}"#)
}

/// In-memory transport that counts requests per URL.
#[derive(Default)]
struct FakeTransport {
    routes: Mutex<HashMap<String, Result<Bytes, NetworkError>>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl FakeTransport {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn serving_spotlight(self) -> Self {
        self.route(MANIFEST_URL, Ok(spotlight_manifest()))
            .route(ICON_URL, Ok(png(29)))
    }

    fn route(self, url: &str, response: Result<Bytes, NetworkError>) -> Self {
        self.set_route(url, response);
        self
    }

    fn set_route(&self, url: &str, response: Result<Bytes, NetworkError>) {
        self.routes.lock().insert(url.to_string(), response);
    }

    fn hits(&self, url: &str) -> usize {
        self.hits.lock().get(url).copied().unwrap_or(0)
    }

    fn total_hits(&self) -> usize {
        self.hits.lock().values().sum()
    }
}

impl Transport for FakeTransport {
    async fn fetch(&self, url: &Url) -> docsource_net::Result<Bytes> {
        *self.hits.lock().entry(url.to_string()).or_default() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let response = self.routes.lock().get(url.as_str()).cloned();
        response.unwrap_or(Err(NetworkError::HttpStatus {
            status: 404,
            message: None,
        }))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn manifest_url() -> Url {
    Url::parse(MANIFEST_URL).unwrap()
}

fn open_cache(dir: &TempDir) -> IconCache {
    IconCache::open(IconCacheConfig::default().with_cache_dir(dir.path())).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_fetch() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let transport =
        Arc::new(FakeTransport::with_delay(Duration::from_millis(100)).serving_spotlight());
    let resolver = IconResolver::new(Arc::clone(&transport), open_cache(&dir));

    const CALLERS: usize = 16;
    let barrier = Arc::new(Barrier::new(CALLERS));
    let mut tasks = Vec::new();
    for _ in 0..CALLERS {
        let resolver = resolver.clone();
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            resolver
                .resolve(&manifest_url(), &IconType::Spotlight)
                .await
        }));
    }

    for task in tasks {
        let icon = task.await.unwrap().expect("resolution failed");
        assert_eq!((icon.width(), icon.height()), (29, 29));
        assert_eq!(icon.bytes(), &png(29));
    }

    assert_eq!(transport.hits(MANIFEST_URL), 1);
    assert_eq!(transport.hits(ICON_URL), 1);
    assert_eq!(resolver.in_flight(), 0);
    assert_eq!(resolver.cache().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_without_cache() {
    let transport =
        Arc::new(FakeTransport::with_delay(Duration::from_millis(200)).serving_spotlight());
    let resolver = IconResolver::builder(Arc::clone(&transport)).build();

    let barrier = Arc::new(Barrier::new(8));
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                resolver
                    .resolve(&manifest_url(), &IconType::Spotlight)
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert_eq!(transport.hits(MANIFEST_URL), 1);
    assert_eq!(transport.hits(ICON_URL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_keys_resolve_independently() {
    let dir = TempDir::new().unwrap();
    let other_manifest = "https://example.com/appInfo.json";
    let transport = Arc::new(
        FakeTransport::with_delay(Duration::from_millis(50))
            .serving_spotlight()
            .route(other_manifest, Ok(spotlight_manifest()))
            .route("https://example.com/icon29.png", Ok(png(29))),
    );
    let resolver = IconResolver::new(Arc::clone(&transport), open_cache(&dir));

    let first = manifest_url();
    let other = Url::parse(other_manifest).unwrap();
    let (a, b) = tokio::join!(
        resolver.resolve(&first, &IconType::Spotlight),
        resolver.resolve(&other, &IconType::Spotlight),
    );

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(transport.hits(MANIFEST_URL), 1);
    assert_eq!(transport.hits(other_manifest), 1);
    assert_eq!(resolver.cache().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cache_hit_survives_restart_without_network() {
    let dir = TempDir::new().unwrap();

    {
        let transport = Arc::new(FakeTransport::default().serving_spotlight());
        let resolver = IconResolver::new(Arc::clone(&transport), open_cache(&dir));
        let icon = resolver
            .resolve(&manifest_url(), &IconType::Spotlight)
            .await
            .unwrap();
        assert!(!icon.from_cache());
    }

    // A fresh process: new cache handle on the same directory and a
    // transport that can serve nothing.
    let offline = Arc::new(FakeTransport::default());
    let resolver = IconResolver::new(Arc::clone(&offline), open_cache(&dir));

    let icon = resolver
        .resolve(&manifest_url(), &IconType::Spotlight)
        .await
        .expect("served from cache");

    assert!(icon.from_cache());
    assert_eq!(icon.width(), 29);
    assert_eq!(offline.total_hits(), 0);
}

#[tokio::test]
async fn test_network_error_is_not_cached() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(
        FakeTransport::default()
            .serving_spotlight()
            .route(MANIFEST_URL, Err(NetworkError::Timeout)),
    );
    let resolver = IconResolver::new(Arc::clone(&transport), open_cache(&dir));
    let key = IconCacheKey::new(&manifest_url(), &IconType::Spotlight);

    let err = resolver
        .resolve(&manifest_url(), &IconType::Spotlight)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::Network(NetworkError::Timeout));
    assert!(!resolver.cache().unwrap().contains(&key));

    transport.set_route(MANIFEST_URL, Ok(spotlight_manifest()));
    let icon = resolver
        .resolve(&manifest_url(), &IconType::Spotlight)
        .await
        .expect("retry succeeds");

    assert!(!icon.from_cache());
    assert_eq!(transport.hits(MANIFEST_URL), 2);
    assert!(resolver.cache().unwrap().contains(&key));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_error_reaches_every_waiter() {
    let transport = Arc::new(
        FakeTransport::with_delay(Duration::from_millis(100)).route(
            MANIFEST_URL,
            Err(NetworkError::Connection("refused".into())),
        ),
    );
    let resolver = IconResolver::builder(Arc::clone(&transport)).build();

    let barrier = Arc::new(Barrier::new(6));
    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                resolver
                    .resolve(&manifest_url(), &IconType::Spotlight)
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(
            task.await.unwrap().unwrap_err(),
            ResolveError::Network(NetworkError::Connection("refused".into()))
        );
    }
    assert_eq!(transport.hits(MANIFEST_URL), 1);
    assert_eq!(resolver.in_flight(), 0);
}

#[tokio::test]
async fn test_undecodable_icon_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(
        FakeTransport::default()
            .serving_spotlight()
            .route(ICON_URL, Ok(Bytes::from_static(b"<html>not an image</html>"))),
    );
    let resolver = IconResolver::new(Arc::clone(&transport), open_cache(&dir));

    let err = resolver
        .resolve(&manifest_url(), &IconType::Spotlight)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::Decode(_)), "got {err:?}");
    assert!(resolver.cache().unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_refetched() {
    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir);
    let key = IconCacheKey::new(&manifest_url(), &IconType::Spotlight);
    cache.put(&key, b"truncated png").unwrap();

    let transport = Arc::new(FakeTransport::default().serving_spotlight());
    let resolver = IconResolver::new(Arc::clone(&transport), cache.clone());

    let icon = resolver
        .resolve(&manifest_url(), &IconType::Spotlight)
        .await
        .unwrap();

    assert!(!icon.from_cache());
    assert_eq!(transport.hits(ICON_URL), 1);
    assert_eq!(cache.get(&key).unwrap().unwrap().bytes, png(29));
}

#[tokio::test]
async fn test_manifest_scenario_over_http() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/appInfo.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "icons": [{"type": "spotlight", "size": 29, "url": "icon29.png"}]
        })))
        // Once for spotlight, once for the type the manifest lacks.
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/icon29.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(29).to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = IconResolver::new(HttpClient::new().unwrap(), open_cache(&dir));
    let manifest = Url::parse(&format!("{}/appInfo.json", server.uri())).unwrap();

    let icon = resolver
        .resolve(&manifest, &IconType::Spotlight)
        .await
        .unwrap();
    assert_eq!(icon.width(), 29);
    assert!(
        resolver
            .cache()
            .unwrap()
            .contains(&IconCacheKey::new(&manifest, &IconType::Spotlight))
    );

    let again = resolver
        .resolve(&manifest, &IconType::Spotlight)
        .await
        .unwrap();
    assert!(again.from_cache());

    let err = resolver
        .resolve(&manifest, &IconType::custom("settings", 29))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ResolveError::NoMatchingIcon {
            icon_type: "settings".into(),
            size: 29,
        }
    );
}
