//! End-to-end pipeline tests over a temporary directory tree.

use flate2::read::{GzDecoder, ZlibDecoder};
use http_body_util::BodyExt;
use hyper::Response;
use staticd::config::{AppState, Config};
use staticd::handler::router::{route_request, RequestContext};
use staticd::http::cache::CacheStrategy;
use staticd::http::Body;
use std::io::Read;
use tempfile::TempDir;

fn test_state(root: &TempDir, strategy: CacheStrategy) -> AppState {
    let mut config = Config::default();
    config.root.directory = root.path().to_string_lossy().into_owned();
    config.cache.strategy = strategy;
    config.logging.access_log = false;
    AppState::new(config).unwrap()
}

fn request(path: &str) -> RequestContext {
    RequestContext {
        raw_path: path.to_string(),
        path: path.to_string(),
        if_none_match: None,
        if_modified_since: None,
        accept_encoding: None,
    }
}

async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn serves_file_bytes_with_cache_headers() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let resp = route_request(&request("/a.txt"), &state).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(resp.headers().get("Cache-Control").unwrap(), "no-cache");
    assert!(resp.headers().contains_key("ETag"));
    assert_eq!(body_bytes(resp).await, b"hello");
}

#[tokio::test]
async fn replayed_etag_returns_304_with_empty_body() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let first = route_request(&request("/a.txt"), &state).await;
    let etag = first.headers().get("ETag").unwrap().to_str().unwrap().to_string();

    let mut ctx = request("/a.txt");
    ctx.if_none_match = Some(etag);
    let second = route_request(&ctx, &state).await;
    assert_eq!(second.status(), 304);
    assert!(body_bytes(second).await.is_empty());
}

#[tokio::test]
async fn stale_etag_serves_full_body() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let mut ctx = request("/a.txt");
    ctx.if_none_match = Some("\"something-else\"".to_string());
    let resp = route_request(&ctx, &state).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_bytes(resp).await, b"hello");
}

#[tokio::test]
async fn replayed_last_modified_returns_304() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::LastModified);

    let first = route_request(&request("/a.txt"), &state).await;
    assert_eq!(first.status(), 200);
    let modified = first
        .headers()
        .get("Last-Modified")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(modified.ends_with("GMT"));
    assert_eq!(body_bytes(first).await, b"hello");

    let mut ctx = request("/a.txt");
    ctx.if_modified_since = Some(modified);
    let second = route_request(&ctx, &state).await;
    assert_eq!(second.status(), 304);
    assert!(body_bytes(second).await.is_empty());
}

#[tokio::test]
async fn missing_path_returns_404_not_found() {
    let root = TempDir::new().unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let resp = route_request(&request("/missing"), &state).await;
    assert_eq!(resp.status(), 404);
    assert_eq!(body_bytes(resp).await, b"NOT Found");
}

#[tokio::test]
async fn traversal_path_returns_404() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let resp = route_request(&request("/../a.txt"), &state).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn directory_listing_links_every_child() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    std::fs::create_dir(root.path().join("sub")).unwrap();
    std::fs::write(root.path().join("sub").join("inner.txt"), "x").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let resp = route_request(&request("/"), &state).await;
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers().get("Content-Type").unwrap().to_str().unwrap();
    assert!(content_type.contains("text/html"));

    let html = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(html.contains("<a href=\"/a.txt\">a.txt</a>"));
    assert!(html.contains("<a href=\"/sub\">sub</a>"));
    // Only immediate children appear
    assert!(!html.contains("inner.txt"));
}

#[tokio::test]
async fn subdirectory_listing_joins_request_path() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("sub")).unwrap();
    std::fs::write(root.path().join("sub").join("inner.txt"), "x").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let resp = route_request(&request("/sub"), &state).await;
    let html = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(html.contains("<a href=\"/sub/inner.txt\">inner.txt</a>"));
}

#[tokio::test]
async fn broken_listing_template_returns_500() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("sub")).unwrap();
    let mut state = test_state(&root, CacheStrategy::Etag);
    state.template = "<%= no_such_key %>".to_string();

    let resp = route_request(&request("/sub"), &state).await;
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn gzip_negotiated_body_decompresses_to_file_bytes() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello hello hello").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let mut ctx = request("/a.txt");
    ctx.accept_encoding = Some("gzip".to_string());
    let resp = route_request(&ctx, &state).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("Content-Encoding").unwrap(), "gzip");

    let compressed = body_bytes(resp).await;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"hello hello hello");
}

#[tokio::test]
async fn streamed_deflate_body_decompresses_to_file_bytes() {
    let root = TempDir::new().unwrap();
    let payload = "streaming payload ".repeat(10_000);
    std::fs::write(root.path().join("big.txt"), &payload).unwrap();
    let state = test_state(&root, CacheStrategy::LastModified);

    let mut ctx = request("/big.txt");
    ctx.accept_encoding = Some("deflate".to_string());
    let resp = route_request(&ctx, &state).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("Content-Encoding").unwrap(), "deflate");

    let compressed = body_bytes(resp).await;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut out = String::new();
    decoder.read_to_string(&mut out).unwrap();
    assert_eq!(out, payload);
}

#[tokio::test]
async fn first_listed_coding_wins() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let mut ctx = request("/a.txt");
    ctx.accept_encoding = Some("deflate, gzip".to_string());
    let resp = route_request(&ctx, &state).await;
    assert_eq!(resp.headers().get("Content-Encoding").unwrap(), "deflate");
}

#[tokio::test]
async fn unsupported_coding_serves_identity() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::Etag);

    let mut ctx = request("/a.txt");
    ctx.accept_encoding = Some("br".to_string());
    let resp = route_request(&ctx, &state).await;
    assert!(!resp.headers().contains_key("Content-Encoding"));
    assert_eq!(body_bytes(resp).await, b"hello");
}

#[tokio::test]
async fn compression_can_be_disabled() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let mut config = Config::default();
    config.root.directory = root.path().to_string_lossy().into_owned();
    config.http.compression = false;
    config.logging.access_log = false;
    let state = AppState::new(config).unwrap();

    let mut ctx = request("/a.txt");
    ctx.accept_encoding = Some("gzip".to_string());
    let resp = route_request(&ctx, &state).await;
    assert!(!resp.headers().contains_key("Content-Encoding"));
    assert_eq!(body_bytes(resp).await, b"hello");
}

#[tokio::test]
async fn streaming_strategy_serves_plain_file() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello").unwrap();
    let state = test_state(&root, CacheStrategy::LastModified);

    let resp = route_request(&request("/a.txt"), &state).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("Cache-Control").unwrap(), "no-cache");
    assert_eq!(body_bytes(resp).await, b"hello");
}
