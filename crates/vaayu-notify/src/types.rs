use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vaayu_weather::Location;

/// Notification categories shown in the in-app list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WeatherAlert,
    FeedbackRequest,
    FeedbackSuccess,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// An entry in the persisted in-app notification list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

/// A delivered alert waiting for its feedback-prompt window.
///
/// Lifecycle: created on push receipt, eligible between one hour and one
/// day of age, consumed when feedback is submitted, silently dropped after
/// a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFeedbackItem {
    pub alert_id: String,
    pub received_at: DateTime<Utc>,
    pub feedback_requested: bool,
    pub payload: Value,
}

/// A user's verdict on an alert, durable until delivered.
///
/// `synced` stays false until the remote delivery succeeds; records are
/// never deleted because a send failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub alert_id: String,
    pub user_id: String,
    pub was_helpful: bool,
    #[serde(default)]
    pub location: Option<Location>,
    pub timestamp: DateTime<Utc>,
    pub synced: bool,
}

/// The reward scalar forwarded to the recommendation trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSignal {
    pub alert_id: String,
    pub user_id: String,
    /// +1 for helpful, -1 for not helpful.
    pub reward: i32,
    #[serde(default)]
    pub location: Option<Location>,
    pub timestamp: DateTime<Utc>,
}

impl RewardSignal {
    pub fn for_record(record: &FeedbackRecord) -> Self {
        Self {
            alert_id: record.alert_id.clone(),
            user_id: record.user_id.clone(),
            reward: if record.was_helpful { 1 } else { -1 },
            location: record.location.clone(),
            timestamp: record.timestamp,
        }
    }
}

/// An inbound push notification as delivered by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Value,
}

impl PushMessage {
    /// Whether this push carries a weather alert (`data.type`).
    pub fn is_weather_alert(&self) -> bool {
        self.data.get("type").and_then(Value::as_str) == Some("weather_alert")
    }

    pub fn alert_id(&self) -> Option<&str> {
        self.data.get("alertId").and_then(Value::as_str)
    }
}
