//! HTTP API: the thin proxy surface consumed by the mobile client.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ai::{AiClient, AlertDecision};
use crate::docs::DocumentStore;
use crate::push::FcmSender;

/// Collection receiving feedback documents.
const FEEDBACK_COLLECTION: &str = "user_feedback";

#[derive(Clone)]
pub struct AppState {
    pub ai: AiClient,
    pub push: FcmSender,
    pub docs: DocumentStore,
}

/// API error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/alerts/decide", post(decide_alert))
        .route("/alerts/send", post(send_alert))
        .route("/feedback", post(submit_feedback))
        .route("/weather", get(weather))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct DecideRequest {
    #[serde(default)]
    forecast: Value,
    #[serde(rename = "userContext", default)]
    user_context: Value,
}

/// `POST /alerts/decide`: alert action for a forecast and user context.
///
/// Never fails on upstream trouble; the fallback decision is part of the
/// response contract.
async fn decide_alert(
    State(state): State<AppState>,
    Json(request): Json<DecideRequest>,
) -> Json<AlertDecision> {
    let decision = state
        .ai
        .alert_action(&request.forecast, &request.user_context)
        .await;
    Json(decision)
}

#[derive(Debug, Deserialize)]
struct SendAlertRequest {
    #[serde(rename = "deviceToken")]
    device_token: String,
    alert: AlertDecision,
}

/// `POST /alerts/send`: dispatch an alert to a device.
async fn send_alert(
    State(state): State<AppState>,
    Json(request): Json<SendAlertRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .push
        .send(
            &request.device_token,
            &request.alert.message,
            &json!({ "action": request.alert.action }),
        )
        .await
        .map_err(|e| {
            tracing::error!("Push dispatch failed: {}", e);
            ApiError::new(StatusCode::BAD_GATEWAY, "push dispatch failed")
        })?;

    Ok(Json(json!({ "status": "sent" })))
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "alertId")]
    alert_id: String,
    #[serde(rename = "wasHelpful")]
    was_helpful: bool,
    #[serde(default)]
    metadata: Option<Value>,
}

/// `POST /feedback`: persist feedback and forward the reward signal.
///
/// Reward forwarding failure is logged and swallowed: once the document is
/// persisted the submission has succeeded from the client's point of view.
async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Value>, ApiError> {
    let document = json!({
        "userId": request.user_id.clone(),
        "alertId": request.alert_id.clone(),
        "wasHelpful": request.was_helpful,
        "metadata": request.metadata.clone().unwrap_or_else(|| json!({})),
        "timestamp": chrono::Utc::now(),
    });

    state
        .docs
        .add(FEEDBACK_COLLECTION, &document)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist feedback: {}", e);
            ApiError::internal("failed to persist feedback")
        })?;

    let reward = json!({
        "userId": request.user_id,
        "alertId": request.alert_id,
        "reward": if request.was_helpful { 1 } else { -1 },
        "metadata": request.metadata,
    });
    if let Err(e) = state.ai.update_policy(&reward).await {
        tracing::warn!("Failed to forward reward to trainer: {}", e);
    }

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    lat: Option<String>,
    lon: Option<String>,
    ts: Option<String>,
}

/// `GET /weather?lat=&lon=&ts=`: forecast from the prediction model.
///
/// Invalid coordinates answer 200 with an error body; existing clients
/// depend on that exact shape.
async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<Value>, ApiError> {
    let latitude = query.lat.as_deref().and_then(|v| v.parse::<f64>().ok());
    let longitude = query.lon.as_deref().and_then(|v| v.parse::<f64>().ok());

    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Ok(Json(json!({ "error": "Invalid lat/lon" })));
    };

    let forecast = state
        .ai
        .predict(latitude, longitude, query.ts)
        .await
        .map_err(|e| {
            tracing::error!("Prediction upstream failed: {}", e);
            ApiError::new(StatusCode::BAD_GATEWAY, "prediction service unavailable")
        })?;

    Ok(Json(forecast))
}
