//! HTTP client for the Vaayu backend proxy.
//!
//! The backend fronts the weather/AI prediction service; this client only
//! knows the proxy's endpoints. Individual calls carry no retry: fetch
//! failures degrade to cached data at the manager level.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::alert::Alert;
use crate::error::WeatherError;
use crate::types::{CurrentConditions, ForecastBundle};

/// Client-side request timeout. Keeps the UI out of indefinite "loading"
/// states when the backend stalls.
const REQUEST_TIMEOUT_SECS: u64 = 15;

const FORECAST_DAYS: u32 = 7;

#[derive(Debug, Serialize)]
struct CoordinatesBody {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct ForecastBody {
    latitude: f64,
    longitude: f64,
    days: u32,
}

/// Weather backend API client.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: Url,
    client: Arc<Client>,
}

impl WeatherClient {
    /// Create a client against the backend at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, WeatherError> {
        let base_url = Url::parse(base_url).map_err(|e| WeatherError::Url(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, WeatherError> {
        self.base_url
            .join(path)
            .map_err(|e| WeatherError::Url(e.to_string()))
    }

    /// Check response status and extract error body text.
    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, WeatherError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Current conditions for the given coordinates.
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<CurrentConditions, WeatherError> {
        tracing::debug!("Fetching current conditions for {},{}", latitude, longitude);

        let url = self.endpoint("weather/current")?;
        let body = CoordinatesBody {
            latitude,
            longitude,
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = self.check_response(response).await?;
        let current = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        Ok(current)
    }

    /// Seven-day forecast bundle for the given coordinates.
    pub async fn forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastBundle, WeatherError> {
        tracing::debug!("Fetching forecast for {},{}", latitude, longitude);

        let url = self.endpoint("weather/forecast")?;
        let body = ForecastBody {
            latitude,
            longitude,
            days: FORECAST_DAYS,
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = self.check_response(response).await?;
        let forecast = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        Ok(forecast)
    }

    /// Active alert recommendations for the given coordinates.
    pub async fn alerts(&self, latitude: f64, longitude: f64) -> Result<Vec<Alert>, WeatherError> {
        tracing::debug!("Fetching alerts for {},{}", latitude, longitude);

        let url = self.endpoint("alerts/recommendation")?;
        let body = CoordinatesBody {
            latitude,
            longitude,
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = self.check_response(response).await?;
        let alerts = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        Ok(alerts)
    }

    /// Raw AI model forecast passthrough.
    pub async fn ai_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<serde_json::Value, WeatherError> {
        let url = self.endpoint("ai/predict")?;
        let body = CoordinatesBody {
            latitude,
            longitude,
        };

        let response = self.client.post(url).json(&body).send().await?;
        let response = self.check_response(response).await?;
        let prediction = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        Ok(prediction)
    }
}
