// Integration tests for `RestClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use safewatch_wire::{Error, RestClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let client = RestClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_dashboard_stats() {
    let (server, client) = setup().await;

    let body = json!({
        "active_tourists": 120,
        "active_alerts": 3,
        "iot_devices": 45,
        "recent_alerts": []
    });

    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let stats = client.fetch_dashboard_stats().await.unwrap();
    assert_eq!(stats.active_tourists, 120);
    assert_eq!(stats.active_alerts, 3);
    assert_eq!(stats.iot_devices, 45);
}

#[tokio::test]
async fn test_fetch_tourists() {
    let (server, client) = setup().await;

    let body = json!({
        "tourists": [
            { "tourist_id": "t_001", "name": "A. Traveler", "status": "active" },
            { "tourist_id": "t_002" }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/tourists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let tourists = client.fetch_tourists().await.unwrap();
    assert_eq!(tourists.len(), 2);
    assert_eq!(tourists[0].tourist_id, "t_001");
    assert_eq!(tourists[0].name.as_deref(), Some("A. Traveler"));
    assert!(tourists[1].status.is_none());
}

// ── Error paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_error_surfaces_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.fetch_dashboard_stats().await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/tourists"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not-json"))
        .mount(&server)
        .await;

    let err = client.fetch_tourists().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}
