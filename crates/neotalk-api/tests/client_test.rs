#![allow(clippy::unwrap_used)]
// Integration tests for `NeoTalkClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use neotalk_api::{DashboardDto, Error, NeoTalkClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, NeoTalkClient) {
    let server = MockServer::start().await;
    let client = NeoTalkClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn dashboard_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Greenhouse",
        "layout": { "columns": 12, "row_height": 60 },
        "components": [{
            "id": "c1",
            "type": "value-card",
            "position": { "x": 0, "y": 0, "w": 3, "h": 2 },
            "data_source": { "type": "device", "deviceId": "sensor-1", "property": "temperature" }
        }],
        "created_at": 1_760_000_000_000_i64,
        "updated_at": 1_760_000_001_000_i64
    })
}

// ── Dashboards ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_dashboards_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([dashboard_json("d1")])))
        .mount(&server)
        .await;

    let dashboards = client.list_dashboards().await.unwrap();
    assert_eq!(dashboards.len(), 1);
    assert_eq!(dashboards[0].id, "d1");
    assert_eq!(dashboards[0].components[0].component_type, "value-card");
}

#[tokio::test]
async fn test_list_dashboards_wrapped() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "dashboards": [dashboard_json("d1"), dashboard_json("d2")] }
        })))
        .mount(&server)
        .await;

    let dashboards = client.list_dashboards().await.unwrap();
    let ids: Vec<&str> = dashboards.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["d1", "d2"]);
}

#[tokio::test]
async fn test_list_dashboards_unexpected_shape() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 0 })))
        .mount(&server)
        .await;

    let result = client.list_dashboards().await;
    assert!(
        matches!(result, Err(Error::UnexpectedShape { .. })),
        "expected UnexpectedShape, got: {result:?}"
    );
}

#[tokio::test]
async fn test_find_dashboard_missing_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboards/ghost"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })),
        )
        .mount(&server)
        .await;

    assert!(client.find_dashboard("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_dashboard_unwraps_data() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboards/d1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": dashboard_json("d1") })),
        )
        .mount(&server)
        .await;

    let dto = client.get_dashboard("d1").await.unwrap();
    assert_eq!(dto.name, "Greenhouse");
    assert_eq!(dto.updated_at, 1_760_000_001_000);
}

#[tokio::test]
async fn test_create_dashboard_falls_back_to_sent_entity() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/dashboards"))
        .and(body_partial_json(json!({ "id": "d9", "name": "Greenhouse" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let sent: DashboardDto = serde_json::from_value(dashboard_json("d9")).unwrap();
    let stored = client.create_dashboard(&sent).await.unwrap();
    assert_eq!(stored, sent);
}

#[tokio::test]
async fn test_update_and_delete_dashboard() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/dashboards/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_json("d1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/dashboards/d1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sent: DashboardDto = serde_json::from_value(dashboard_json("d1")).unwrap();
    client.update_dashboard("d1", &sent).await.unwrap();
    client.delete_dashboard("d1").await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_dashboards().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_server_error_message_is_extracted() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboards"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "storage offline" },
            "code": "storage_unavailable"
        })))
        .mount(&server)
        .await;

    match client.list_dashboards().await {
        Err(Error::Api { status, message, code }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "storage offline");
            assert_eq!(code.as_deref(), Some("storage_unavailable"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Extensions ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_extension_components() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/extensions/weather/components"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "components": [{
                "type": "weather-card",
                "name": "Weather Card",
                "category": "business",
                "bundle_url": "/api/extensions/weather/assets/weather-card.js",
                "global_name": "WeatherCardComponent",
                "size_constraints": { "min_w": 2, "min_h": 2, "default_w": 4, "default_h": 3 }
            }]
        })))
        .mount(&server)
        .await;

    let components = client.extension_components("weather").await.unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].component_type, "weather-card");
    assert_eq!(components[0].global_name.as_deref(), Some("WeatherCardComponent"));
    assert_eq!(components[0].size_constraints.default_w, Some(4));
}

#[tokio::test]
async fn test_dashboard_component_catalog() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/extensions/dashboard-components"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "type": "weather-card", "name": "Weather", "bundleUrl": "/w.js", "extensionId": "weather" },
                { "type": "tank-level", "name": "Tank", "bundleUrl": "/t.js", "extension_id": "tanks" }
            ]
        })))
        .mount(&server)
        .await;

    let components = client.dashboard_components().await.unwrap();
    let owners: Vec<_> = components
        .iter()
        .map(|c| c.extension_id.as_deref().unwrap())
        .collect();
    assert_eq!(owners, ["weather", "tanks"]);
}

// ── Transport ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_token("s3cret".to_string().into());
    let client = NeoTalkClient::new(&server.uri(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    client.health().await.unwrap();
}
