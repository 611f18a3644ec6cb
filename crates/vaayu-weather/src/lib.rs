//! Weather data layer for the Vaayu client.
//!
//! Location tracking, backend API client, alert taxonomy, and the
//! cache/freshness manager that reconciles network-fetched and locally
//! cached weather state.

pub mod alert;
pub mod client;
pub mod error;
pub mod geocode;
pub mod location;
pub mod manager;
pub mod types;

pub use alert::{Alert, AlertPriority, AlertSeverity, AlertType};
pub use client::WeatherClient;
pub use error::WeatherError;
pub use geocode::reverse_geocode;
pub use location::{LocationProvider, PositionFix, PositionSource, WatchHandle};
pub use manager::{RefreshHandle, WeatherManager, WeatherUpdate};
pub use types::{
    AddressInfo, CurrentConditions, DailyForecast, ForecastBundle, HourlyForecast, Location,
    WeatherSnapshot, WeatherTrend,
};
