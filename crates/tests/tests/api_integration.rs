use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use copilot_api::build_app;
use serde_json::json;
use tower::ServiceExt;

fn kb_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../kb")
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app(kb_root()).await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_requires_api_key() {
    let app = build_app(kb_root()).await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "text": "What's our leave policy?" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_returns_structured_outcome() {
    let app = build_app(kb_root()).await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-copilot-key")
        .body(Body::from(
            json!({ "text": "What's our leave policy?" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(parsed["intent"], "leave");
    assert_eq!(parsed["escalated"], false);
    assert!(parsed["response"].as_str().unwrap().contains("Leave"));
    assert!(parsed["session_id"].as_str().is_some());
}

#[tokio::test]
async fn sensitive_chat_escalates() {
    let app = build_app(kb_root()).await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-copilot-key")
        .body(Body::from(
            json!({ "text": "I'm dealing with harassment at work" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(parsed["escalated"], true);
    assert!(parsed["response"]
        .as_str()
        .unwrap()
        .contains("Escalation to HR"));
}

#[tokio::test]
async fn reset_clears_a_session() {
    let app = build_app(kb_root()).await.expect("app should build");

    let chat = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-copilot-key")
        .body(Body::from(
            json!({ "session_id": "it-session", "text": "payslip please" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(chat).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let reset = Request::builder()
        .method("POST")
        .uri("/v1/reset")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-copilot-key")
        .body(Body::from(json!({ "session_id": "it-session" }).to_string()))
        .unwrap();
    let response = app.oneshot(reset).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["cleared"], true);
}

#[tokio::test]
async fn kb_search_finds_policy_documents() {
    let app = build_app(kb_root()).await.expect("app should build");

    let request = Request::builder()
        .uri("/v1/kb/search?q=annual%20leave")
        .header("x-api-key", "dev-copilot-key")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let hits: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(!hits.as_array().unwrap().is_empty());
}
