//! Integration tests for the `/api/v1/data-sources` endpoints.
//!
//! The manager runs over an in-memory store with fake connectors (see
//! `common::fake_connectors`), so no database or network is needed.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post_json, put_json};
use serde_json::json;
use tagdeck_core::status::ConnectionStatus;

fn broker() -> serde_json::Value {
    json!({
        "name": "Line 1 broker",
        "source_type": "MQTT",
        "endpoint": "mqtt://line1:1883",
    })
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_201_with_disconnected_status() {
    let app = common::build_offline_app().await;

    let response = post_json(app.clone(), "/api/v1/data-sources", broker()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["name"], "Line 1 broker");
    assert_eq!(json["data"]["status"], "Disconnected");
    assert!(json["data"]["last_update"].is_null());

    let response = get(app.clone(), &format!("/api/v1/data-sources/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], id);

    let list = body_json(get(app, "/api/v1/data-sources").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn legacy_type_spelling_is_stored_canonically() {
    let app = common::build_offline_app().await;

    let response = post_json(
        app,
        "/api/v1/data-sources",
        json!({ "name": "api", "source_type": "rest_api", "endpoint": "https://plant.example/api" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["source_type"], "HTTPS");
}

#[tokio::test]
async fn duplicate_name_returns_409_regardless_of_case() {
    let app = common::build_offline_app().await;
    post_json(app.clone(), "/api/v1/data-sources", broker()).await;

    let mut again = broker();
    again["name"] = json!("LINE 1 BROKER");
    let response = post_json(app, "/api/v1/data-sources", again).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "DUPLICATE_NAME");
}

#[tokio::test]
async fn invalid_create_returns_every_violation() {
    let app = common::build_offline_app().await;

    let response = post_json(
        app,
        "/api/v1/data-sources",
        json!({ "name": " ", "source_type": "Modbus", "endpoint": "plc.local" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0], "Name is required");
    assert!(details[1].as_str().unwrap().contains("IP:PORT"));
}

#[tokio::test]
async fn unknown_id_returns_404() {
    let app = common::build_offline_app().await;

    let response = get(app.clone(), "/api/v1/data-sources/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = delete(app.clone(), "/api/v1/data-sources/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(app, "/api/v1/data-sources/999/test", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Validate endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validate_reports_violations_without_saving() {
    let app = common::build_offline_app().await;

    let response = post_json(
        app.clone(),
        "/api/v1/data-sources/validate",
        json!({ "name": "ws", "type": "WebSocket", "endpoint": "http://nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["valid"], false);
    assert_eq!(
        json["data"]["violations"][0],
        "WebSocket endpoint must start with ws:// or wss://"
    );

    let list = body_json(get(app, "/api/v1/data-sources").await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn validate_accepts_a_complete_candidate() {
    let app = common::build_offline_app().await;

    let json = body_json(post_json(app, "/api/v1/data-sources/validate", broker()).await).await;

    assert_eq!(json["data"]["valid"], true);
    assert!(json["data"]["violations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn validate_treats_missing_fields_as_empty() {
    let app = common::build_offline_app().await;

    let json = body_json(post_json(app, "/api/v1/data-sources/validate", json!({})).await).await;

    assert_eq!(json["data"]["valid"], false);
    let violations = json["data"]["violations"].as_array().unwrap();
    assert!(violations.contains(&json!("Name is required")));
    assert!(violations.contains(&json!("Endpoint is required")));
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_patches_only_present_fields() {
    let app = common::build_offline_app().await;
    let created = body_json(post_json(app.clone(), "/api/v1/data-sources", broker()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = put_json(
        app,
        &format!("/api/v1/data-sources/{id}"),
        json!({ "endpoint": "mqtts://line1:8883" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["endpoint"], "mqtts://line1:8883");
    assert_eq!(json["data"]["name"], "Line 1 broker");
}

#[tokio::test]
async fn update_rejects_endpoint_for_stored_type() {
    let app = common::build_offline_app().await;
    let created = body_json(post_json(app.clone(), "/api/v1/data-sources", broker()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = put_json(
        app,
        &format!("/api/v1/data-sources/{id}"),
        json!({ "endpoint": "10.0.0.5:502" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_returns_204_and_frees_the_name() {
    let app = common::build_offline_app().await;
    let created = body_json(post_json(app.clone(), "/api/v1/data-sources", broker()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = delete(app.clone(), &format!("/api/v1/data-sources/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(app, "/api/v1/data-sources", broker()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Connection tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_connection_success_marks_connected() {
    let (manager, store) = common::memory_manager().await;
    let app = common::build_test_app(common::unreachable_pool(), manager);
    let created = body_json(post_json(app.clone(), "/api/v1/data-sources", broker()).await).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = post_json(app.clone(), &format!("/api/v1/data-sources/{id}/test"), json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["message"], "Connected to mqtt://line1:1883");
    assert_eq!(json["data"]["data"]["endpoint"], "mqtt://line1:1883");

    let statuses: Vec<ConnectionStatus> = store
        .status_history(id)
        .await
        .iter()
        .map(|w| w.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            ConnectionStatus::Disconnected,
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
        ]
    );

    let saved = body_json(get(app, &format!("/api/v1/data-sources/{id}")).await).await;
    assert_eq!(saved["data"]["status"], "Connected");
}

#[tokio::test]
async fn test_connection_failure_is_200_and_marks_error() {
    let (manager, store) = common::memory_manager().await;
    let app = common::build_test_app(common::unreachable_pool(), manager);
    let created = body_json(
        post_json(
            app.clone(),
            "/api/v1/data-sources",
            json!({ "name": "plc", "source_type": "Modbus", "endpoint": "10.0.0.1:502" }),
        )
        .await,
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = post_json(app, &format!("/api/v1/data-sources/{id}/test"), json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert!(json["data"].get("data").is_none());

    let history = store.status_history(id).await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].status, ConnectionStatus::Connecting);
    assert_eq!(history[2].status, ConnectionStatus::Error);
    assert!(history[2].at > history[1].at);
}

#[tokio::test]
async fn candidate_test_runs_without_saving() {
    let app = common::build_offline_app().await;

    let response = post_json(
        app.clone(),
        "/api/v1/data-sources/test",
        json!({ "name": "probe", "source_type": "OPC UA", "endpoint": "opc.tcp://plc:4840" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["success"], true);

    let list = body_json(get(app, "/api/v1/data-sources").await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn candidate_test_without_connector_fails_softly() {
    let app = common::build_offline_app().await;

    let response = post_json(
        app,
        "/api/v1/data-sources/test",
        json!({ "name": "s7", "source_type": "S7", "endpoint": "10.0.0.2:102" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(json["data"]["message"], "No connector registered for S7");
}

#[tokio::test]
async fn candidate_test_validates_first() {
    let app = common::build_offline_app().await;

    let response = post_json(
        app,
        "/api/v1/data-sources/test",
        json!({ "name": "probe", "source_type": "OPC UA", "endpoint": "tcp://plc" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
