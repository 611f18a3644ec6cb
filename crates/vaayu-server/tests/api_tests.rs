//! API tests for the backend proxy, with the AI service and FCM mocked.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vaayu_server::{build_router, AiClient, AppState, DocumentStore, FcmSender};

fn state_for(ai: &MockServer, fcm: &MockServer) -> AppState {
    AppState {
        ai: AiClient::new(&ai.uri()).unwrap(),
        push: FcmSender::with_url(&fcm.uri(), "test-key".to_string()).unwrap(),
        docs: DocumentStore::in_memory().unwrap(),
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn decide_returns_upstream_decision() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/get-alert-action"))
        .and(body_partial_json(json!({
            "forecast": {"rain": true},
            "userContext": {"userId": "u1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "action": "SEVERE_ALERT",
            "message": "Take cover"
        })))
        .mount(&ai)
        .await;

    let app = build_router(state_for(&ai, &fcm));
    let response = app
        .oneshot(post_json(
            "/alerts/decide",
            json!({"forecast": {"rain": true}, "userContext": {"userId": "u1"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["action"], "SEVERE_ALERT");
    assert_eq!(body["message"], "Take cover");
}

#[tokio::test]
async fn decide_falls_back_when_upstream_fails() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/get-alert-action"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ai)
        .await;

    let app = build_router(state_for(&ai, &fcm));
    let response = app
        .oneshot(post_json(
            "/alerts/decide",
            json!({"forecast": {}, "userContext": {}}),
        ))
        .await
        .unwrap();

    // The fallback is a contract: upstream failure must not surface.
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["action"], "STANDARD_ALERT");
    assert_eq!(body["message"], "Stay alert.");
}

#[tokio::test]
async fn send_alert_dispatches_push() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "to": "device-1",
            "notification": {"body": "Stay alert."},
            "data": {"action": "STANDARD_ALERT"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fcm)
        .await;

    let app = build_router(state_for(&ai, &fcm));
    let response = app
        .oneshot(post_json(
            "/alerts/send",
            json!({
                "deviceToken": "device-1",
                "alert": {"action": "STANDARD_ALERT", "message": "Stay alert."}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "sent");
}

#[tokio::test]
async fn send_alert_reports_push_failure() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fcm)
        .await;

    let app = build_router(state_for(&ai, &fcm));
    let response = app
        .oneshot(post_json(
            "/alerts/send",
            json!({
                "deviceToken": "device-1",
                "alert": {"action": "STANDARD_ALERT", "message": "Stay alert."}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn feedback_persists_document_and_forwards_reward() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/update-policy"))
        .and(body_partial_json(json!({
            "userId": "u1",
            "alertId": "a1",
            "reward": -1
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ai)
        .await;

    let state = state_for(&ai, &fcm);
    let docs = state.docs.clone();
    let app = build_router(state);

    let response = app
        .oneshot(post_json(
            "/feedback",
            json!({"userId": "u1", "alertId": "a1", "wasHelpful": false}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);

    let stored = docs.list("user_feedback").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["alertId"], "a1");
    assert_eq!(stored[0]["wasHelpful"], false);
}

#[tokio::test]
async fn feedback_succeeds_even_when_reward_forwarding_fails() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/update-policy"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ai)
        .await;

    let state = state_for(&ai, &fcm);
    let docs = state.docs.clone();
    let app = build_router(state);

    let response = app
        .oneshot(post_json(
            "/feedback",
            json!({"userId": "u1", "alertId": "a1", "wasHelpful": true}),
        ))
        .await
        .unwrap();

    // Local persistence decides the result; forwarding failure is logged
    // and swallowed.
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(docs.count("user_feedback").await.unwrap(), 1);
}

#[tokio::test]
async fn weather_rejects_invalid_coordinates_with_200_error_body() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;
    let app = build_router(state_for(&ai, &fcm));

    for uri in [
        "/weather?lat=abc&lon=73.86",
        "/weather?lat=18.52",
        "/weather",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "uri: {uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid lat/lon", "uri: {uri}");
    }
}

#[tokio::test]
async fn weather_proxies_prediction() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_partial_json(json!({
            "latitude": 18.52,
            "longitude": 73.86
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"temperature": 25.0, "condition": "clear"})),
        )
        .mount(&ai)
        .await;

    let app = build_router(state_for(&ai, &fcm));
    let response = app
        .oneshot(get("/weather?lat=18.52&lon=73.86"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["temperature"], 25.0);
}

#[tokio::test]
async fn weather_upstream_failure_is_bad_gateway() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ai)
        .await;

    let app = build_router(state_for(&ai, &fcm));
    let response = app
        .oneshot(get("/weather?lat=18.52&lon=73.86"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn health_endpoint() {
    let ai = MockServer::start().await;
    let fcm = MockServer::start().await;
    let app = build_router(state_for(&ai, &fcm));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
