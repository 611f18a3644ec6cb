//! Weather-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid URL: {0}")]
    Url(String),
}

impl WeatherError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Api { status, .. } if *status >= 500 => {
                "Weather service is having trouble. Showing cached data if available.".to_string()
            }
            Self::Api { .. } => "Weather request failed. Please try again.".to_string(),
            Self::Parse(_) => "Received unexpected weather data.".to_string(),
            Self::Cache(_) => "Weather data may be outdated.".to_string(),
            Self::Url(_) => "Weather service is misconfigured.".to_string(),
        }
    }

    /// Whether the failure is worth a fallback to cached data.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = WeatherError::Api {
            status: 503,
            message: "down".into(),
        };
        assert!(err.user_message().contains("cached"));

        let err = WeatherError::Parse("bad json".into());
        assert!(err.user_message().contains("unexpected"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(WeatherError::Api {
            status: 500,
            message: String::new()
        }
        .is_transient());
        assert!(!WeatherError::Parse("x".into()).is_transient());
    }
}
