use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::Alert;

/// Geographic location with an optional resolved address.
///
/// A new fix always produces a new value; locations are never mutated in
/// place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub address: Option<AddressInfo>,
    pub timestamp: DateTime<Utc>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            address: None,
            timestamp,
        }
    }

    /// True when both coordinates are present and plausible. Fetches for a
    /// location without usable coordinates are silently skipped.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// Reverse-geocoded address details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressInfo {
    pub city: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub formatted: Option<String>,
}

/// Current weather conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: String,
}

/// Hourly forecast entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub condition: String,
    pub precipitation_chance: u8,
}

/// Daily forecast entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: String,
    pub precipitation_chance: u8,
}

/// Forecast data bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastBundle {
    #[serde(default)]
    pub hourly: Vec<HourlyForecast>,
    #[serde(default)]
    pub daily: Vec<DailyForecast>,
}

/// One complete, internally consistent set of weather data for a single
/// location and fetch cycle. This is the unit of caching: the snapshot is
/// replaced whole or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub forecast: ForecastBundle,
    pub alerts: Vec<Alert>,
    pub location: Location,
    pub fetched_at: DateTime<Utc>,
}

/// Short-term temperature direction derived from the hourly forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherTrend {
    Warming,
    Cooling,
    Stable,
}
