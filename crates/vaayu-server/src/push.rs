//! Push dispatch via FCM.
//!
//! Fire-and-forget from the caller's perspective: the proxy reports whether
//! the dispatch request was accepted, nothing about device delivery.

use std::time::Duration;

use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub const DEFAULT_FCM_URL: &str = "https://fcm.googleapis.com/fcm/send";

const REQUEST_TIMEOUT_SECS: u64 = 15;

const NOTIFICATION_TITLE: &str = "Vaayu Alert";

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Push rejected: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    Url(String),
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    to: &'a str,
    notification: FcmNotification<'a>,
    data: &'a Value,
}

/// FCM HTTP client.
#[derive(Debug, Clone)]
pub struct FcmSender {
    url: Url,
    server_key: String,
    client: Client,
}

impl FcmSender {
    pub fn new(server_key: String) -> Result<Self, PushError> {
        Self::with_url(DEFAULT_FCM_URL, server_key)
    }

    /// Point the sender at a non-default endpoint (tests).
    pub fn with_url(url: &str, server_key: String) -> Result<Self, PushError> {
        let url = Url::parse(url).map_err(|e| PushError::Url(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            url,
            server_key,
            client,
        })
    }

    /// Send a push message to a device token.
    pub async fn send(&self, token: &str, body: &str, data: &Value) -> Result<(), PushError> {
        let message = FcmMessage {
            to: token,
            notification: FcmNotification {
                title: NOTIFICATION_TITLE,
                body,
            },
            data,
        };

        let response = self
            .client
            .post(self.url.clone())
            .header(
                header::AUTHORIZATION,
                format!("key={}", self.server_key),
            )
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Push dispatched to device token ending {}", tail(token));
        Ok(())
    }
}

/// Last few characters of a token for log lines; never the full token.
fn tail(token: &str) -> &str {
    let len = token.len();
    &token[len.saturating_sub(6)..]
}
