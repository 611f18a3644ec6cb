//! Weather alert taxonomy and lifetime rules.
//!
//! Two independent time predicates apply to an alert:
//! - **activity**: an alert counts toward the active set only while younger
//!   than 24 hours, regardless of its type;
//! - **display expiry**: each type carries its own auto-expire horizon used
//!   by dismissal heuristics.
//! The two must not be conflated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Location;

/// Hard activity window applied whenever the active-alert set is read.
pub const ACTIVE_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    WeatherWarning,
    SevereWeather,
    FloodWarning,
    HeatWave,
    ColdWave,
    Thunderstorm,
    HeavyRain,
    Cyclone,
    FogWarning,
    AirQuality,
    UvWarning,
    #[default]
    General,
}

impl AlertType {
    /// Default priority assigned to alerts of this type.
    pub fn priority(&self) -> AlertPriority {
        match self {
            Self::SevereWeather | Self::FloodWarning | Self::Thunderstorm => {
                AlertPriority::Critical
            }
            Self::Cyclone => AlertPriority::Emergency,
            Self::WeatherWarning | Self::HeatWave | Self::ColdWave | Self::HeavyRain => {
                AlertPriority::Warning
            }
            Self::FogWarning | Self::AirQuality | Self::UvWarning | Self::General => {
                AlertPriority::Advisory
            }
        }
    }

    /// Display auto-expire horizon for this type.
    pub fn auto_expire(&self) -> Duration {
        let hours = match self {
            Self::Thunderstorm => 2,
            Self::SevereWeather => 3,
            Self::WeatherWarning | Self::HeavyRain => 6,
            Self::FogWarning => 8,
            Self::FloodWarning | Self::UvWarning | Self::General => 12,
            Self::HeatWave | Self::ColdWave | Self::Cyclone | Self::AirQuality => 24,
        };
        Duration::hours(hours)
    }
}

/// Variant order doubles as the severity scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    #[default]
    Low,
    Moderate,
    High,
    Severe,
    Extreme,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    #[default]
    Advisory,
    Warning,
    Critical,
    Emergency,
}

/// A weather alert as delivered by the decision backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: AlertSeverity,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Alert {
    /// True while the alert counts toward the active set (24 h hard filter).
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp < Duration::hours(ACTIVE_WINDOW_HOURS)
    }

    /// True once the per-type display horizon has passed.
    pub fn is_display_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp > self.kind.auto_expire()
    }

    /// Human-readable age, e.g. "Just now", "5m ago", "3h ago", "2d ago".
    pub fn format_age(&self, now: DateTime<Utc>) -> String {
        let minutes = (now - self.timestamp).num_minutes();
        if minutes < 1 {
            return "Just now".to_string();
        }
        if minutes < 60 {
            return format!("{}m ago", minutes);
        }
        let hours = minutes / 60;
        if hours < 24 {
            return format!("{}h ago", hours);
        }
        format!("{}d ago", hours / 24)
    }
}

/// Filter `alerts` down to the active set, preserving upstream order.
pub fn active_alerts(alerts: &[Alert], now: DateTime<Utc>) -> Vec<Alert> {
    alerts.iter().filter(|a| a.is_active(now)).cloned().collect()
}
