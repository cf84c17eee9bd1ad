//! HTTP-level tests: the full router over in-memory stores and a scripted advisor.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tara_api::{create_app, AppState, TaraConfig};
use tara_core::{AdvisoryResult, AdvisoryService, ProfileAttributes, ProfileStore, TaraError};
use tara_store::{MemoryProfileStore, StaticRuleStore};
use tempfile::TempDir;
use tower::ServiceExt;

/// Asks for income unless the profile already carries one.
struct IncomeAdvisor;

#[async_trait]
impl AdvisoryService for IncomeAdvisor {
    async fn advise(
        &self,
        _origin: &str,
        _destination: &str,
        profile: &ProfileAttributes,
    ) -> Result<AdvisoryResult, TaraError> {
        let mut outstanding_fields = BTreeMap::new();
        if !profile.contains_key("income") {
            outstanding_fields.insert("income".to_string(), "Proof of funds".to_string());
        }
        Ok(AdvisoryResult {
            forms: vec!["Schengen visa application".to_string()],
            outstanding_fields,
            ..AdvisoryResult::default()
        })
    }
}

fn test_app() -> (axum::Router, Arc<MemoryProfileStore>) {
    let rules = StaticRuleStore::new()
        .with_rule("IN", "FR", "visa required")
        .with_rule("FR", "DE", "visa free");
    let profiles = Arc::new(MemoryProfileStore::new());
    let state = AppState::new(Arc::new(rules), profiles.clone(), Arc::new(IncomeAdvisor)).unwrap();
    (create_app(state), profiles)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn check_body(user_id: Option<&str>, nationalities: Value, context: Value) -> Value {
    json!({
        "request_type": "travel_check",
        "country": "France",
        "type": "Work",
        "profile": {
            "user_id": user_id,
            "displayName": "Asha",
            "nationalities": nationalities,
        },
        "context": context,
    })
}

// =============================================================================
// /tourism/check
// =============================================================================

#[tokio::test]
async fn test_check_without_citizenship_asks_for_it() {
    let (app, _) = test_app();

    let (status, body) =
        send(&app, post_json("/tourism/check", check_body(None, json!([]), Value::Null))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "INCOMPLETE");
    assert_eq!(body["reason"], "missing_identity");
    assert_eq!(body["needs_more_info"], true);
    assert!(body["awaiting_feedback"]["citizenship"].is_string());
    assert!(body["visa_requirement"].is_null());
    assert_eq!(body["data_source"], "Hybrid (DB + Mistral AI)");
}

#[tokio::test]
async fn test_check_persists_citizenship_and_returns_guidance() {
    let (app, profiles) = test_app();

    let (status, body) = send(
        &app,
        post_json("/tourism/check", check_body(Some("u1"), json!(["India"]), Value::Null)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "INCOMPLETE");
    assert_eq!(body["reason"], "advisory_needs_more");
    assert_eq!(body["visa_requirement"], "visa required");
    assert_eq!(body["origin"], "India");
    assert_eq!(body["forms"][0], "Schengen visa application");
    assert_eq!(body["user_has_stored_profile"], false);
    assert!(!body["documents"].as_array().unwrap().is_empty());
    assert_eq!(body["steps"][2]["id"], "1a");
    assert_eq!(body["steps"][0]["isCompleted"], false);

    let stored = profiles.get("u1").await.unwrap().unwrap();
    assert_eq!(stored.citizenship_code(), Some("IN"));
}

#[tokio::test]
async fn test_check_completes_when_context_fills_gap() {
    let (app, _) = test_app();

    let (_, body) = send(
        &app,
        post_json(
            "/tourism/check",
            check_body(Some("u1"), json!([{"country": "India", "code": "in"}]), json!({"income": "50000"})),
        ),
    )
    .await;

    assert_eq!(body["status"], "COMPLETE");
    assert!(body.get("reason").is_none());
    assert_eq!(body["needs_more_info"], false);
    assert_eq!(body["message"], "Complete travel guidance generated successfully.");
}

#[tokio::test]
async fn test_check_blank_destination_is_error() {
    let (app, _) = test_app();
    let mut request = check_body(Some("u1"), json!(["India"]), Value::Null);
    request["country"] = json!("  ");

    let (status, body) = send(&app, post_json("/tourism/check", request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ERROR");
    assert!(body["error_details"].as_str().unwrap().starts_with("INPUT/"));
}

#[tokio::test]
async fn test_check_malformed_body_rejected() {
    let (app, _) = test_app();

    let (status, _) = send(&app, post_json("/tourism/check", json!({"country": 42}))).await;
    assert!(status.is_client_error());
}

// =============================================================================
// Profiles and history
// =============================================================================

#[tokio::test]
async fn test_profile_lookup_and_explicit_update() {
    let (app, _) = test_app();

    let (_, body) = send(&app, get("/profile/u2")).await;
    assert_eq!(body["status"], "not_found");

    let (status, body) = send(
        &app,
        post_json("/profile/update", json!({"user_id": "u2", "citizenship": "France", "citizenship_code": "fr"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (_, body) = send(&app, get("/profile/u2")).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["profile"]["citizenship_code"], "FR");

    // stored citizenship wins over what a later request supplies
    let mut request = check_body(Some("u2"), json!(["Germany"]), Value::Null);
    request["country"] = json!("Denmark");
    let (_, body) = send(&app, post_json("/tourism/check", request)).await;
    assert_eq!(body["origin"], "France");
    assert_eq!(body["visa_requirement"], "visa free");
    assert_eq!(body["citizenship_was_stored"], true);
}

#[tokio::test]
async fn test_update_requires_user_id_and_fields() {
    let (app, _) = test_app();

    let (status, body) =
        send(&app, post_json("/profile/update", json!({"user_id": " ", "citizenship": "India"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, body) = send(&app, post_json("/profile/update", json!({"user_id": "u7"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    let (_, body) = send(&app, get("/profile/u7")).await;
    assert_eq!(body["status"], "not_found");
}

#[tokio::test]
async fn test_update_code_without_name_keeps_stored_citizenship() {
    let (app, profiles) = test_app();
    send(
        &app,
        post_json("/profile/update", json!({"user_id": "u8", "citizenship": "France", "citizenship_code": "FR"})),
    )
    .await;

    let (status, body) =
        send(&app, post_json("/profile/update", json!({"user_id": "u8", "citizenship_code": "DE"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let stored = profiles.get("u8").await.unwrap().unwrap();
    assert_eq!(stored.citizenship.as_deref(), Some("France"));
    assert_eq!(stored.citizenship_code(), Some("FR"));
}

#[tokio::test]
async fn test_history_newest_first_with_limit() {
    let (app, _) = test_app();
    for nationality in [json!([]), json!(["India"]), json!(["India"])] {
        send(&app, post_json("/tourism/check", check_body(Some("u3"), nationality, Value::Null))).await;
    }

    let (status, body) = send(&app, get("/profile/u3/history?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["interactions"][0]["destination"], "FR");

    let (_, body) = send(&app, get("/profile/u3/history")).await;
    let interactions = body["interactions"].as_array().unwrap();
    assert_eq!(interactions.len(), 3);
    assert_eq!(interactions[2]["origin"], "");
    assert_eq!(interactions[2]["destination"], "FR");
}

// =============================================================================
// Diagnostics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], tara_core::TARA_VERSION);
}

#[tokio::test]
async fn test_debug_request_interprets_identity() {
    let (app, _) = test_app();
    let request = json!({
        "country": "Japan",
        "type": "Tourism",
        "profile": {"email": "a@example.com", "nationalities": ["Kenya"]},
    });

    let (_, body) = send(&app, post_json("/debug/request", request)).await;
    assert_eq!(body["interpretation"]["user_id"], "a@example.com");
    assert_eq!(body["interpretation"]["has_citizenship"], true);
    assert_eq!(body["interpretation"]["destination_code"], "JA");
    assert_eq!(body["received_data"]["request_type"], "travel_check");
}

#[tokio::test]
async fn test_metrics_count_checks_by_status() {
    let (app, _) = test_app();
    send(&app, post_json("/tourism/check", check_body(None, json!([]), Value::Null))).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("tara_requests_total{status=\"INCOMPLETE\"} 1"));
}

// =============================================================================
// Startup wiring
// =============================================================================

fn memory_config(prompts_path: Option<String>) -> TaraConfig {
    TaraConfig::from_lookup(|key| match key {
        "TARA_DB_PATH" => Some(":memory:".to_string()),
        "TARA_PROMPTS_PATH" => prompts_path.clone(),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_from_config_uses_prompts_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prompts.yaml");
    std::fs::write(
        &path,
        "version: \"1.1\"\ntemplates:\n  expert_advice:\n    description: Custom\n    template: \"{{origin}} to {{destination}}\"\n",
    )
    .unwrap();

    let config = memory_config(Some(path.to_string_lossy().into_owned()));
    assert!(AppState::from_config(&config).await.is_ok());

    let missing = memory_config(Some(dir.path().join("absent.yaml").to_string_lossy().into_owned()));
    assert!(AppState::from_config(&missing).await.is_err());

    assert!(AppState::from_config(&memory_config(None)).await.is_ok());
}
