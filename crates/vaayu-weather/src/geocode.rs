//! Reverse geocoding: convert coordinates to address details.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::types::AddressInfo;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "Vaayu/0.1.0 (weather alerting client)";

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    #[serde(rename = "state_district")]
    state_district: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
    postcode: Option<String>,
}

/// Reverse geocode coordinates to address details.
/// Returns `None` on failure or timeout; the caller falls back to bare
/// coordinates.
pub async fn reverse_geocode(latitude: f64, longitude: f64) -> Option<AddressInfo> {
    let client = match Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to create geocoding client: {}", e);
            return None;
        }
    };

    let url = format!(
        "{}?lat={}&lon={}&format=json&addressdetails=1&layer=address&zoom=10",
        NOMINATIM_URL, latitude, longitude
    );

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Reverse geocode request failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Reverse geocode returned status {}", response.status());
        return None;
    }

    let body: NominatimResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Reverse geocode parse error: {}", e);
            return None;
        }
    };

    let addr = body.address?;

    // Prefer city > town > village > municipality for the primary place name
    let city = addr
        .city
        .or(addr.town)
        .or(addr.village)
        .or(addr.municipality);

    let info = AddressInfo {
        city,
        district: addr.state_district.or(addr.county),
        state: addr.state.clone(),
        country: addr.country.clone(),
        postal_code: addr.postcode,
        formatted: None,
    };

    let formatted = format_address(&info);
    let info = AddressInfo {
        formatted,
        ..info
    };

    if info.city.is_none() && info.state.is_none() && info.country.is_none() {
        return None;
    }

    tracing::info!("Reverse geocoded to: {:?}", info.formatted);
    Some(info)
}

/// Join the present address parts into a display string.
fn format_address(info: &AddressInfo) -> Option<String> {
    let parts: Vec<&str> = [&info.city, &info.district, &info.state, &info.country]
        .iter()
        .filter_map(|p| p.as_deref())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_format_address_joins_present_parts() {
        let info = AddressInfo {
            city: Some("Pune".to_string()),
            district: None,
            state: Some("Maharashtra".to_string()),
            country: Some("India".to_string()),
            postal_code: None,
            formatted: None,
        };
        assert_eq!(
            format_address(&info).as_deref(),
            Some("Pune, Maharashtra, India")
        );
    }

    #[test]
    fn test_format_address_empty() {
        assert!(format_address(&AddressInfo::default()).is_none());
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test -p vaayu-weather -- --ignored
    async fn test_reverse_geocode_pune() {
        let addr = reverse_geocode(18.5204, 73.8567).await;
        assert!(addr.is_some());
        let addr = addr.unwrap();
        assert!(addr
            .formatted
            .unwrap_or_default()
            .to_lowercase()
            .contains("pune"));
    }
}
