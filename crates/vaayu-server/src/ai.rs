//! Client for the AI prediction/decision service.
//!
//! The decision call never surfaces an error: an unreachable or failing
//! upstream yields the fixed fallback action. That fallback is part of the
//! proxy's contract with the mobile client, not a best-effort nicety.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 15;

pub const FALLBACK_ACTION: &str = "STANDARD_ALERT";
pub const FALLBACK_MESSAGE: &str = "Stay alert.";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    Url(String),
}

/// The action decided for an alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertDecision {
    pub action: String,
    pub message: String,
}

impl AlertDecision {
    pub fn fallback() -> Self {
        Self {
            action: FALLBACK_ACTION.to_string(),
            message: FALLBACK_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DecisionBody<'a> {
    forecast: &'a Value,
    #[serde(rename = "userContext")]
    user_context: &'a Value,
}

#[derive(Debug, Serialize)]
struct PredictBody {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

/// AI service client.
#[derive(Debug, Clone)]
pub struct AiClient {
    base_url: Url,
    client: Client,
}

impl AiClient {
    pub fn new(base_url: &str) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url).map_err(|e| UpstreamError::Url(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, UpstreamError> {
        self.base_url
            .join(path)
            .map_err(|e| UpstreamError::Url(e.to_string()))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Forecast from the prediction model.
    pub async fn predict(
        &self,
        latitude: f64,
        longitude: f64,
        timestamp: Option<String>,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint("predict")?;
        let body = PredictBody {
            latitude,
            longitude,
            timestamp,
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Alert action for a forecast and user context. Infallible by
    /// contract: upstream failure produces the fixed fallback.
    pub async fn alert_action(&self, forecast: &Value, user_context: &Value) -> AlertDecision {
        match self.try_alert_action(forecast, user_context).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!("Alert decision upstream failed, using fallback: {}", e);
                AlertDecision::fallback()
            }
        }
    }

    async fn try_alert_action(
        &self,
        forecast: &Value,
        user_context: &Value,
    ) -> Result<AlertDecision, UpstreamError> {
        let url = self.endpoint("get-alert-action")?;
        let body = DecisionBody {
            forecast,
            user_context,
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Forward a reward signal to the trainer.
    pub async fn update_policy(&self, payload: &Value) -> Result<(), UpstreamError> {
        let url = self.endpoint("update-policy")?;

        let response = self.client.post(url).json(payload).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
