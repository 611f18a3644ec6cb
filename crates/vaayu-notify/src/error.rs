//! Notification/feedback error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Storage error: {0}")]
    Store(#[from] vaayu_store::StoreError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Invalid URL: {0}")]
    Url(String),
}

impl NotifyError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => "Couldn't save locally. Your feedback will be retried.".to_string(),
            Self::Network(_) => {
                "Network error. Your feedback is saved and will sync later.".to_string()
            }
            Self::Api { .. } => {
                "The server rejected the request. Your feedback will be retried.".to_string()
            }
            Self::Dispatch(_) => "Couldn't deliver the notification.".to_string(),
            Self::Url(_) => "Notification service is misconfigured.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_mention_retry_for_deferrable_failures() {
        let err = NotifyError::Api {
            status: 500,
            message: "oops".into(),
        };
        assert!(err.user_message().contains("retried"));
    }
}
