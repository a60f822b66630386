#![allow(clippy::unwrap_used)]
// Integration tests for the API and hybrid dashboard backends using wiremock.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use neotalk_api::{NeoTalkClient, TransportConfig};
use neotalk_core::storage::{
    ApiDashboardStorage, HybridDashboardStorage, LocalDashboardStorage, MemoryStore,
};
use neotalk_core::{Dashboard, DashboardStorage, StorageBackend, StorageKind};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<NeoTalkClient>) {
    let server = MockServer::start().await;
    let client = NeoTalkClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    (server, Arc::new(client))
}

fn local() -> Arc<LocalDashboardStorage> {
    Arc::new(LocalDashboardStorage::new(Arc::new(MemoryStore::default())))
}

fn hybrid(client: Arc<NeoTalkClient>, local: Arc<LocalDashboardStorage>) -> HybridDashboardStorage {
    HybridDashboardStorage::new(local, Arc::new(ApiDashboardStorage::new(client)))
}

fn remote_dashboard(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "layout": { "columns": 12, "row_height": 60 },
        "components": [],
        "created_at": 1_760_000_000_000_i64,
        "updated_at": 1_760_000_000_000_i64
    })
}

// ── API backend ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_sync_creates_unknown_dashboard() {
    let (server, client) = setup().await;
    let dashboard = Dashboard::new("Fresh");

    Mock::given(method("GET"))
        .and(path(format!("/api/dashboards/{}", dashboard.id)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "not found" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards"))
        .and(body_partial_json(json!({ "id": dashboard.id, "name": "Fresh" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": remote_dashboard(&dashboard.id, "Fresh")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stored = ApiDashboardStorage::new(client).sync(&dashboard).await.unwrap();
    assert_eq!(stored.backend, StorageBackend::Api);
    assert_eq!(stored.data.id, dashboard.id);
}

#[tokio::test]
async fn test_api_sync_creates_when_lookup_fails() {
    let (server, client) = setup().await;
    let dashboard = Dashboard::new("Retry");

    Mock::given(method("GET"))
        .and(path(format!("/api/dashboards/{}", dashboard.id)))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "db hiccup" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards"))
        .and(body_partial_json(json!({ "id": dashboard.id })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(remote_dashboard(&dashboard.id, "Retry")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stored = ApiDashboardStorage::new(client).sync(&dashboard).await.unwrap();
    assert_eq!(stored.backend, StorageBackend::Api);
    assert_eq!(stored.data.name, "Retry");
}

#[tokio::test]
async fn test_api_sync_updates_known_dashboard() {
    let (server, client) = setup().await;
    let mut dashboard = Dashboard::new("Known");
    dashboard.name = "Known v2".into();

    Mock::given(method("GET"))
        .and(path(format!("/api/dashboards/{}", dashboard.id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(remote_dashboard(&dashboard.id, "Known")),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/dashboards/{}", dashboard.id)))
        .and(body_partial_json(json!({ "name": "Known v2" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let stored = ApiDashboardStorage::new(client).sync(&dashboard).await.unwrap();
    assert_eq!(stored.data.name, "Known v2");
}

#[tokio::test]
async fn test_api_save_and_clear_are_noops() {
    let (server, client) = setup().await;
    let storage = ApiDashboardStorage::new(client);

    storage.save(&[Dashboard::new("x")]).await.unwrap();
    storage.clear().await.unwrap();
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(storage.kind(), StorageKind::Api);
}

#[tokio::test]
async fn test_api_availability_follows_health() {
    let (server, client) = setup().await;
    let storage = ApiDashboardStorage::new(client);
    assert!(!storage.is_available().await);

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;
    assert!(storage.is_available().await);
}

// ── Hybrid backend ──────────────────────────────────────────────────

#[tokio::test]
async fn test_hybrid_load_falls_back_to_local() {
    let (server, client) = setup().await;
    let cache = local();
    let offline = Dashboard::new("Cached");
    cache.sync(&offline).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "db down" })))
        .mount(&server)
        .await;

    let loaded = hybrid(client, cache).load().await.unwrap();
    assert_eq!(loaded.backend, StorageBackend::Local);
    assert_eq!(loaded.data, vec![offline]);
}

#[tokio::test]
async fn test_hybrid_load_warms_local_cache() {
    let (server, client) = setup().await;
    let cache = local();

    Mock::given(method("GET"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dashboards": [remote_dashboard("r1", "Remote")]
        })))
        .mount(&server)
        .await;

    let loaded = hybrid(client, Arc::clone(&cache)).load().await.unwrap();
    assert_eq!(loaded.backend, StorageBackend::Api);
    assert_eq!(loaded.data[0].name, "Remote");

    let cached = cache.load().await.unwrap().data;
    assert_eq!(cached, loaded.data);
}

#[tokio::test]
async fn test_hybrid_sync_writes_local_then_mirrors() {
    let (server, client) = setup().await;
    let cache = local();
    let dashboard = Dashboard::new("Mirrored");

    Mock::given(method("GET"))
        .and(path(format!("/api/dashboards/{}", dashboard.id)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let storage = hybrid(client, Arc::clone(&cache));
    let stored = storage.sync(&dashboard).await.unwrap();
    assert_eq!(stored.backend, StorageBackend::Local);
    assert_eq!(cache.load().await.unwrap().data, vec![dashboard]);

    storage.flush().await;
}

#[tokio::test]
async fn test_hybrid_delete_survives_api_failure() {
    let (server, client) = setup().await;
    let cache = local();
    let dashboard = Dashboard::new("Doomed");
    cache.sync(&dashboard).await.unwrap();

    Mock::given(method("DELETE"))
        .and(path(format!("/api/dashboards/{}", dashboard.id)))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let storage = hybrid(client, Arc::clone(&cache));
    storage.delete(&dashboard.id).await.unwrap();
    storage.flush().await;
    assert!(cache.load().await.unwrap().data.is_empty());
}
