//! End-to-end tests of the HTTP surface against in-memory collaborators.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use reconkit::api::build_router;
use reconkit::app::AppState;
use reconkit::config::ServerConfig;
use reconkit::core::cache::{cache_key, JsonFileCache, MemoryCache, ResultCache};
use reconkit::core::models::{CacheEntry, CtEntry, RecordKind, SubdomainReport};
use reconkit::core::scanner::ct_source::{CtFetchError, CtLogSource};
use reconkit::core::scanner::dns_verifier::DnsProbe;

// ============================================================================
// Fakes
// ============================================================================

struct FakeSource {
    rows: Vec<CtEntry>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeSource {
    fn with_rows(rows: Vec<CtEntry>) -> Arc<Self> {
        Arc::new(Self { rows, fail: false, calls: AtomicUsize::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { rows: Vec::new(), fail: true, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl CtLogSource for FakeSource {
    async fn fetch(&self, _domain: &str) -> Result<Vec<CtEntry>, CtFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CtFetchError::Status(reqwest::StatusCode::BAD_GATEWAY));
        }
        Ok(self.rows.clone())
    }
}

/// Resolves A and AAAA for every host except those starting with "dead" or a digit,
/// with a little host-dependent latency.
struct FakeResolver {
    queries: AtomicUsize,
}

#[async_trait]
impl DnsProbe for FakeResolver {
    async fn resolve(&self, host: &str, kind: RecordKind, _timeout: Duration) -> Result<(), String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(host.len() as u64 % 5)).await;

        let dead = host.starts_with("dead") || host.starts_with(|c: char| c.is_ascii_digit());
        if !dead && kind != RecordKind::Cname {
            Ok(())
        } else {
            Err("NXDOMAIN".to_string())
        }
    }
}

/// Fails every query after a fixed delay.
struct SlowResolver {
    delay: Duration,
    queries: AtomicUsize,
}

#[async_trait]
impl DnsProbe for SlowResolver {
    async fn resolve(&self, _host: &str, _kind: RecordKind, _timeout: Duration) -> Result<(), String> {
        tokio::time::sleep(self.delay).await;
        self.queries.fetch_add(1, Ordering::SeqCst);
        Err("SERVFAIL".to_string())
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        dns_timeout_ms: 50,
        ..ServerConfig::default()
    }
}

fn app_with(source: Arc<FakeSource>, cache: Arc<dyn ResultCache>) -> (axum::Router, Arc<FakeResolver>) {
    let resolver = Arc::new(FakeResolver { queries: AtomicUsize::new(0) });
    (app_with_probe(source, resolver.clone(), cache), resolver)
}

fn app_with_probe(source: Arc<FakeSource>, probe: Arc<dyn DnsProbe>, cache: Arc<dyn ResultCache>) -> axum::Router {
    let state = AppState::new(test_config(), source, probe, cache);
    build_router(Arc::new(state))
}

async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn sample_rows() -> Vec<CtEntry> {
    vec![
        CtEntry::new("www.example.com\nmail.example.com"),
        CtEntry::new("bad entry with space"),
        CtEntry::new("*.example.com"),
    ]
}

fn hosts(body: &Value) -> Vec<String> {
    body["subdomains"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["host"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Enumeration endpoint
// ============================================================================

#[tokio::test]
async fn enumerates_verifies_and_scores() {
    let (app, _) = app_with(FakeSource::with_rows(sample_rows()), Arc::new(MemoryCache::new()));

    let (status, body) = post_json(app, "/api/recon/subdomains", r#"{"domain": "Example.com"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["domain"], "example.com");
    assert_eq!(body["total_raw"], 4);
    assert_eq!(body["total_clean"], 3);
    assert_eq!(hosts(&body), vec!["*.example.com", "mail.example.com", "www.example.com"]);

    let wildcard = &body["subdomains"][0];
    assert_eq!(wildcard["wildcard"], true);
    assert_eq!(wildcard["resolves"], false);
    assert_eq!(wildcard["records"], serde_json::json!([]));
    assert_eq!(wildcard["confidence"], "medium");

    let www = &body["subdomains"][2];
    assert_eq!(www["resolves"], true);
    assert_eq!(www["records"], serde_json::json!(["A", "AAAA"]));
    assert_eq!(www["confidence"], "high");
}

#[tokio::test]
async fn numeric_dead_hosts_score_low() {
    let rows = vec![CtEntry::new("123.example.com\ndead.example.com")];
    let (app, _) = app_with(FakeSource::with_rows(rows), Arc::new(MemoryCache::new()));

    let (_, body) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    assert_eq!(body["subdomains"][0]["host"], "123.example.com");
    assert_eq!(body["subdomains"][0]["confidence"], "low");
    assert_eq!(body["subdomains"][1]["confidence"], "medium");
}

#[tokio::test]
async fn large_batch_returns_every_candidate_once_and_sorted() {
    let names: Vec<String> = (0..25).rev().map(|i| format!("node{:02}.example.com", i)).collect();
    let rows = vec![CtEntry::new(&names.join("\n"))];
    let (app, _) = app_with(FakeSource::with_rows(rows), Arc::new(MemoryCache::new()));

    let (_, body) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    let hosts = hosts(&body);
    assert_eq!(hosts.len(), 25);
    assert_eq!(hosts.iter().collect::<HashSet<_>>().len(), 25);
    let mut sorted = hosts.clone();
    sorted.sort_by_key(|h| h.to_lowercase());
    assert_eq!(hosts, sorted);
    assert_eq!(body["total_clean"], 25);
}

#[tokio::test]
async fn missing_domain_is_a_400() {
    let (app, _) = app_with(FakeSource::with_rows(sample_rows()), Arc::new(MemoryCache::new()));

    let (status, body) = post_json(app, "/api/recon/subdomains", "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a valid domain name (e.g., example.com)");
}

#[tokio::test]
async fn invalid_domain_is_a_400_and_never_fetches() {
    let source = FakeSource::with_rows(sample_rows());
    let (app, _) = app_with(source.clone(), Arc::new(MemoryCache::new()));

    let (status, body) = post_json(app, "/api/recon/subdomains", r#"{"domain": "not a domain!"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid domain format. Please provide a valid domain name.");
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_failure_returns_zeroed_report() {
    let (app, _) = app_with(FakeSource::failing(), Arc::new(MemoryCache::new()));

    let (status, body) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["domain"], "example.com");
    assert_eq!(body["total_raw"], 0);
    assert_eq!(body["total_clean"], 0);
    assert_eq!(body["subdomains"], serde_json::json!([]));
    assert!(body["error"].as_str().unwrap().starts_with("Failed to fetch from crt.sh"));
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let source = FakeSource::with_rows(sample_rows());
    let cache = Arc::new(MemoryCache::new());
    let (app, resolver) = app_with(source.clone(), cache.clone());

    let (_, first) = post_json(app.clone(), "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;
    let queries_after_first = resolver.queries.load(Ordering::SeqCst);
    let (_, second) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    assert_eq!(first, second);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.queries.load(Ordering::SeqCst), queries_after_first);
}

#[tokio::test]
async fn fresh_entry_is_returned_verbatim() {
    let cache = Arc::new(MemoryCache::new());
    let stored = SubdomainReport::new("example.com", 99, Vec::new());
    let written = Utc::now() - chrono::Duration::hours(23) - chrono::Duration::minutes(59);
    cache.put(&cache_key("example.com"), CacheEntry::new(stored, written)).await;
    let source = FakeSource::with_rows(sample_rows());
    let (app, _) = app_with(source.clone(), cache);

    let (_, body) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    assert_eq!(body["total_raw"], 99);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stale_entry_triggers_refetch() {
    let cache = Arc::new(MemoryCache::new());
    let stored = SubdomainReport::new("example.com", 99, Vec::new());
    let written = Utc::now() - chrono::Duration::hours(24) - chrono::Duration::minutes(1);
    cache.put(&cache_key("example.com"), CacheEntry::new(stored, written)).await;
    let source = FakeSource::with_rows(sample_rows());
    let (app, _) = app_with(source.clone(), cache.clone());

    let (_, body) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    assert_eq!(body["total_raw"], 4);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get(&cache_key("example.com")).await.unwrap().data.total_raw, 4);
}

#[tokio::test]
async fn file_cache_persists_across_app_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache").join("subdomain_cache.json");

    let first_source = FakeSource::with_rows(sample_rows());
    let (app, _) = app_with(first_source.clone(), Arc::new(JsonFileCache::new(&path)));
    let (_, first) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    let second_source = FakeSource::with_rows(Vec::new());
    let (app, _) = app_with(second_source.clone(), Arc::new(JsonFileCache::new(&path)));
    let (_, second) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    assert_eq!(first, second);
    assert_eq!(second_source.calls.load(Ordering::SeqCst), 0);

    let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk["subdomains_example.com"]["data"]["total_clean"], 3);
}

#[tokio::test]
async fn failed_fetch_is_not_cached() {
    let cache = Arc::new(MemoryCache::new());
    let (app, _) = app_with(FakeSource::failing(), cache.clone());

    let (status, _) = post_json(app, "/api/recon/subdomains", r#"{"domain": "example.com"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(cache.len().await, 0);
}

#[tokio::test]
async fn client_disconnect_does_not_cancel_the_scan() {
    let names: Vec<String> = (0..30).map(|i| format!("h{:02}.example.com", i)).collect();
    let source = FakeSource::with_rows(vec![CtEntry::new(&names.join("\n"))]);
    let resolver = Arc::new(SlowResolver { delay: Duration::from_millis(30), queries: AtomicUsize::new(0) });
    let cache = Arc::new(MemoryCache::new());
    let app = app_with_probe(source, resolver.clone(), cache.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/recon/subdomains")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"domain": "example.com"}"#))
        .unwrap();
    let in_flight = tokio::spawn(app.oneshot(request));
    tokio::time::sleep(Duration::from_millis(50)).await;
    in_flight.abort();
    assert!(in_flight.await.unwrap_err().is_cancelled());
    assert_eq!(cache.len().await, 0);

    let filled = tokio::time::timeout(Duration::from_secs(10), async {
        while cache.len().await == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    assert!(filled.is_ok(), "scan was cancelled with its caller");
    assert_eq!(resolver.queries.load(Ordering::SeqCst), 90);
    let entry = cache.get(&cache_key("example.com")).await.unwrap();
    assert_eq!(entry.data.total_clean, 30);
}

#[tokio::test]
async fn disguised_hosts_are_rejected_before_fetching() {
    let source = FakeSource::with_rows(sample_rows());
    let (app, _) = app_with(source.clone(), Arc::new(MemoryCache::new()));

    for domain in ["admin@example.com", "10", "exa%6Dple.com"] {
        let body = serde_json::json!({ "domain": domain }).to_string();
        let (status, reply) = post_json(app.clone(), "/api/recon/subdomains", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{domain}");
        assert_eq!(reply["error"], "Invalid domain format. Please provide a valid domain name.");
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Auxiliary endpoints
// ============================================================================

#[tokio::test]
async fn quick_listing_skips_verification() {
    let rows = vec![
        CtEntry::new("www.example.com\nmail.example.com"),
        CtEntry::new("API.example.com"),
    ];
    let (app, resolver) = app_with(FakeSource::with_rows(rows), Arc::new(MemoryCache::new()));

    let (status, body) = post_json(app, "/api/tools/subdomain", r#"{"domain": "example.com"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["subdomains"], serde_json::json!(["api.example.com", "www.example.com"]));
    assert_eq!(resolver.queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn quick_listing_errors() {
    let (app, _) = app_with(FakeSource::failing(), Arc::new(MemoryCache::new()));
    let (status, body) = post_json(app.clone(), "/api/tools/subdomain", r#"{"domain": "example.com"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, body) = post_json(app, "/api/tools/subdomain", r#"{"nope": 1}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing or invalid 'domain'");
}

#[tokio::test]
async fn dns_lookup_rejects_bad_input() {
    let (app, _) = app_with(FakeSource::with_rows(Vec::new()), Arc::new(MemoryCache::new()));

    let (status, body) = post_json(app, "/api/recon/dns", r#"{"domain": ""}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide a valid domain name (e.g., example.com)");
}

#[tokio::test]
async fn home_and_health_respond() {
    let (app, _) = app_with(FakeSource::with_rows(Vec::new()), Arc::new(MemoryCache::new()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
