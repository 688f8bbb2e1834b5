// Holler — HTTP API integration tests
//
// Drives the real router in-process with a fresh store per test. No broker
// process and no sockets: requests go straight through the tower service.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request as HttpRequest, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use holler::notify::NoopNotify;
use holler::server::{router, AppState};
use holler::store::RequestStore;

fn broker() -> (Router, Arc<RequestStore>, mpsc::Receiver<()>) {
    let store = Arc::new(RequestStore::new());
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let state = AppState::new(
        Arc::clone(&store),
        Arc::new(NoopNotify),
        shutdown_tx,
        "http://127.0.0.1:9131".to_string(),
    );
    (router(state), store, shutdown_rx)
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            HttpRequest::builder()
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, path, body.to_string()).await
}

async fn post_raw(app: &Router, path: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            HttpRequest::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ─── Health and UI ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (app, _, _rx) = broker();
    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_serves_ui_html() {
    let (app, _, _rx) = broker();
    let response = app
        .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("text/html"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.contains("holler"));
    assert!(html.contains("/api/pending"));
}

// ─── Ask / answer flow ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_question_flow() {
    let (app, _, _rx) = broker();

    let (status, body) = post(
        &app,
        "/api/ask",
        json!({
            "question": "What DB?",
            "agent": "test-bot",
            "task": "choosing infra",
            "context": "We need a database",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 12);

    let (status, pending) = get(&app, "/api/pending").await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], id.as_str());
    assert_eq!(pending[0]["question"], "What DB?");
    assert_eq!(pending[0]["agent"], "test-bot");
    assert_eq!(pending[0]["status"], "pending");

    let (status, info) = get(&app, &format!("/api/status/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["status"], "pending");

    let (status, body) = post(&app, "/api/answer", json!({ "id": id, "answer": "Postgres" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, info) = get(&app, &format!("/api/status/{id}")).await;
    assert_eq!(info["status"], "answered");
    assert_eq!(info["answer"], "Postgres");

    let (_, pending) = get(&app, "/api/pending").await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_multiple_agents_answer_middle_one() {
    let (app, _, _rx) = broker();

    let (_, d1) = post(&app, "/api/ask", json!({ "question": "q1", "agent": "agent-a" })).await;
    let (_, d2) = post(&app, "/api/ask", json!({ "question": "q2", "agent": "agent-b" })).await;
    let (_, d3) = post(&app, "/api/ask", json!({ "question": "q3", "agent": "agent-c" })).await;

    let (_, pending) = get(&app, "/api/pending").await;
    assert_eq!(pending.as_array().unwrap().len(), 3);

    post(&app, "/api/answer", json!({ "id": d2["id"], "answer": "done" })).await;

    let (_, pending) = get(&app, "/api/pending").await;
    let remaining: Vec<&str> = pending
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&d1["id"].as_str().unwrap()));
    assert!(remaining.contains(&d3["id"].as_str().unwrap()));
}

#[tokio::test]
async fn test_minimal_ask_only_question() {
    let (app, _, _rx) = broker();
    let (status, body) = post(&app, "/api/ask", json!({ "question": "yes or no?" })).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let (_, info) = get(&app, &format!("/api/status/{id}")).await;
    assert!(info["context"].is_null());
    assert!(info["agent"].is_null());
    assert!(info["task"].is_null());
    assert_eq!(info["request_type"], "question");
    assert!(info["command"].is_null());
}

// ─── Error handling ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ask_missing_question() {
    let (app, _, _rx) = broker();
    let (status, body) = post(&app, "/api/ask", json!({ "agent": "bot" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("missing question"));
}

#[tokio::test]
async fn test_ask_empty_object() {
    let (app, _, _rx) = broker();
    let (status, _) = post(&app, "/api/ask", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_unparseable_body() {
    let (app, _, _rx) = broker();
    let (status, body) = post_raw(&app, "/api/ask", "not json at all".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid request body"));
}

#[tokio::test]
async fn test_answer_missing_fields() {
    let (app, _, _rx) = broker();
    let (status, body) = post(&app, "/api/answer", json!({ "id": "aabbccddeeff" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_answer_unknown_id() {
    let (app, _, _rx) = broker();
    let (status, _) = post(
        &app,
        "/api/answer",
        json!({ "id": "aabbccddeeff", "answer": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_answer_twice_is_not_found() {
    let (app, _, _rx) = broker();
    let (_, d) = post(&app, "/api/ask", json!({ "question": "q" })).await;
    let id = d["id"].as_str().unwrap().to_string();

    let (status, _) = post(&app, "/api/answer", json!({ "id": id, "answer": "first" })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/api/answer", json!({ "id": id, "answer": "second" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, info) = get(&app, &format!("/api/status/{id}")).await;
    assert_eq!(info["answer"], "first");
}

#[tokio::test]
async fn test_status_malformed_id() {
    let (app, _, _rx) = broker();
    let (status, _) = get(&app, "/api/status/INVALID!!").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_unknown_id() {
    let (app, _, _rx) = broker();
    let (status, _) = get(&app, "/api/status/aabbccddeeff").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _, _rx) = broker();
    let (status, body) = get(&app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

// ─── Permission flow ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_permission_approve_flow() {
    let (app, _, _rx) = broker();

    let (status, body) = post(
        &app,
        "/api/ask",
        json!({
            "question": "Delete temp files?",
            "command": "rm -rf /tmp/*",
            "request_type": "permission",
            "agent": "cleanup-bot",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let (_, pending) = get(&app, "/api/pending").await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["request_type"], "permission");
    assert_eq!(pending[0]["command"], "rm -rf /tmp/*");

    let verdict = json!({ "decision": "approved", "comment": "" }).to_string();
    let (status, _) = post(&app, "/api/answer", json!({ "id": id, "answer": verdict })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, info) = get(&app, &format!("/api/status/{id}")).await;
    assert_eq!(info["status"], "answered");
    let parsed: Value = serde_json::from_str(info["answer"].as_str().unwrap()).unwrap();
    assert_eq!(parsed["decision"], "approved");
}

#[tokio::test]
async fn test_permission_deny_flow() {
    let (app, _, _rx) = broker();

    let (_, body) = post(
        &app,
        "/api/ask",
        json!({
            "question": "Drop database?",
            "command": "DROP DATABASE prod",
            "request_type": "permission",
            "agent": "db-bot",
        }),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let verdict = json!({ "decision": "denied", "comment": "too dangerous" }).to_string();
    post(&app, "/api/answer", json!({ "id": id, "answer": verdict })).await;

    let (_, info) = get(&app, &format!("/api/status/{id}")).await;
    let parsed: Value = serde_json::from_str(info["answer"].as_str().unwrap()).unwrap();
    assert_eq!(parsed["decision"], "denied");
    assert_eq!(parsed["comment"], "too dangerous");
}

#[tokio::test]
async fn test_permission_missing_command_is_400() {
    let (app, _, _rx) = broker();
    let (status, body) = post(
        &app,
        "/api/ask",
        json!({ "question": "do something", "request_type": "permission" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("command"));
}

// ─── Admission control ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_capacity_limit_and_slot_reuse() {
    let (app, _, _rx) = broker();

    let mut first_id = String::new();
    for i in 0..100 {
        let (status, body) = post(&app, "/api/ask", json!({ "question": format!("q{i}") })).await;
        assert_eq!(status, StatusCode::OK);
        if i == 0 {
            first_id = body["id"].as_str().unwrap().to_string();
        }
    }

    let (status, body) = post(&app, "/api/ask", json!({ "question": "overflow" })).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("too many pending"));

    let (status, _) = post(
        &app,
        "/api/answer",
        json!({ "id": first_id, "answer": "done" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/api/ask", json!({ "question": "fits" })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/api/ask", json!({ "question": "still full" })).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

// ─── Origin policy ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_loopback_origin_is_annotated() {
    let (app, _, _rx) = broker();
    let response = app
        .oneshot(
            HttpRequest::builder()
                .uri("/api/pending")
                .header(header::ORIGIN, "http://localhost:5500")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let allow = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok());
    assert_eq!(allow, Some("http://localhost:5500"));
}

#[tokio::test]
async fn test_foreign_origin_is_not_annotated() {
    let (app, _, _rx) = broker();
    let response = app
        .oneshot(
            HttpRequest::builder()
                .uri("/api/pending")
                .header(header::ORIGIN, "http://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_preflight_allows_loopback_methods() {
    let (app, _, _rx) = broker();
    let response = app
        .oneshot(
            HttpRequest::builder()
                .method("OPTIONS")
                .uri("/api/ask")
                .header(header::ORIGIN, "http://127.0.0.1:9131")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://127.0.0.1:9131")
    );
    let methods = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(methods.contains("POST"));
}

// ─── Shutdown ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_shutdown_endpoint_signals() {
    let (app, _, mut rx) = broker();
    let (status, body) = post(&app, "/api/shutdown", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "shutting down");
    assert!(rx.try_recv().is_ok(), "shutdown signal should be queued");
}
