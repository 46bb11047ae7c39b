//! End-to-end tests: tag a document, read the tag back, resolve the icon.

use std::io::Cursor;

use docsource::icon::{IconCache, IconCacheConfig, IconResolver, ResolveError};
use docsource::net::http::HttpClient;
use docsource::{
    AttributeStore, DocumentSource, DocumentSourceConfig, IconType, MemoryAttributes,
    ProvenanceRecord,
};
use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn icon_png() -> Vec<u8> {
    let image = RgbaImage::from_pixel(29, 29, Rgba([40, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn serve_working_copy_manifest(server: &MockServer, manifest_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/appInfo.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "icons": [{"type": "spotlight", "size": 29, "url": "icon29.png"}]
        })))
        .expect(manifest_hits)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/icon29.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(icon_png()))
        .expect(1)
        .mount(server)
        .await;
}

fn source_with_cache(dir: &TempDir) -> DocumentSource {
    let cache = IconCache::open(IconCacheConfig::default().with_cache_dir(dir.path())).unwrap();
    DocumentSource::with_parts(
        AttributeStore::new(MemoryAttributes::new()),
        IconResolver::new(HttpClient::new().unwrap(), cache),
    )
}

#[tokio::test]
async fn test_working_copy_round_trip() {
    let server = MockServer::start().await;
    serve_working_copy_manifest(&server, 2).await;

    let dir = TempDir::new().unwrap();
    let source = source_with_cache(&dir);

    let record = ProvenanceRecord::new(
        "com.appliedphasor.working-copy",
        "Working Copy",
        "libgit2/doc/README.md",
        format!("{}/appInfo.json", server.uri()),
    )
    .unwrap();

    source.write_provenance(&record, "README.md").unwrap();
    let read = source.read_provenance("README.md").expect("record present");
    assert_eq!(read, record);
    assert_eq!(read.application_name(), "Working Copy");

    let icon = source
        .resolve_icon_for(&read, &IconType::Spotlight)
        .await
        .unwrap();
    assert_eq!((icon.width(), icon.height()), (29, 29));
    assert!(!icon.from_cache());

    let again = source
        .resolve_icon(read.manifest_url_parsed(), &IconType::Spotlight)
        .await
        .unwrap();
    assert!(again.from_cache());

    let err = source
        .resolve_icon_for(&read, &IconType::custom("settings", 29))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoMatchingIcon { .. }));
}

#[tokio::test]
async fn test_untagged_and_removed_documents() {
    let dir = TempDir::new().unwrap();
    let source = source_with_cache(&dir);

    assert!(source.read_provenance("notes.txt").is_none());
    assert!(source.read_provenance_checked("notes.txt").unwrap().is_none());

    let record = ProvenanceRecord::new(
        "com.example.editor",
        "Editor",
        "notes.txt",
        "https://example.com/appInfo.json",
    )
    .unwrap();
    source.write_provenance(&record, "notes.txt").unwrap();
    assert!(source.remove_provenance("notes.txt").unwrap());
    assert!(source.read_provenance("notes.txt").is_none());
}

#[tokio::test]
async fn test_new_from_config() {
    let dir = TempDir::new().unwrap();
    let config = DocumentSourceConfig::from_toml_str(&format!(
        "[cache]\ndir = {:?}\nmax_entries = 8\n\n[http]\ntimeout_secs = 5\n",
        dir.path().join("icons")
    ))
    .unwrap();

    let source = DocumentSource::new(&config).unwrap();
    let cache = source.resolver().cache().expect("cache configured");

    assert_eq!(cache.cache_dir(), dir.path().join("icons"));
    assert_eq!(cache.config().max_entries, Some(8));
    assert!(cache.is_empty());
}
