//! IP-based geolocation.
//!
//! Queries a third-party JSON endpoint that answers with the caller's
//! approximate `latitude` and `longitude`. The endpoint is defined in
//! `services/ip_geolocation.toml` and can be overridden with
//! `TOUCH_GRASS_IP_GEOLOCATION_URL`.

use std::time::Duration;

use serde::Deserialize;

use crate::{GeolocationError, Location, LocationPreference, LocationPreferences};

const SERVICE_TOML: &str = include_str!("../services/ip_geolocation.toml");

/// Environment variable overriding the endpoint URL.
pub const URL_ENV: &str = "TOUCH_GRASS_IP_GEOLOCATION_URL";

/// IP geolocation endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IpGeolocationService {
    /// Unique identifier (e.g., `"ipapi"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Endpoint URL returning `{ "latitude": .., "longitude": .. }`.
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl IpGeolocationService {
    /// Returns the embedded service definition.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(SERVICE_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse IP geolocation service: {e}"))
    }

    /// Returns the embedded definition with [`URL_ENV`] applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut service = Self::embedded();
        if let Ok(url) = std::env::var(URL_ENV) {
            log::info!("Using IP geolocation endpoint from {URL_ENV}: {url}");
            service.url = url;
        }
        service
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize)]
struct IpLocationResponse {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// Looks up the caller's coarse location from its IP address.
///
/// # Errors
///
/// Returns [`GeolocationError::Status`] carrying the status text when the
/// endpoint answers with a non-success status, and
/// [`GeolocationError::InvalidLocationData`] when the body lacks usable
/// coordinates.
pub async fn get_location_from_ip(
    client: &reqwest::Client,
    service: &IpGeolocationService,
) -> Result<Location, GeolocationError> {
    let resp = client
        .get(&service.url)
        .timeout(service.timeout())
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let status_text = status
            .canonical_reason()
            .map_or_else(|| status.as_str().to_string(), str::to_string);
        log::warn!("IP geolocation via {} failed: {status}", service.name);
        return Err(GeolocationError::Status { status_text });
    }

    let body = resp.text().await?;
    parse_response(&body)
}

/// Persists the `"ip"` preference, then looks up the IP-derived location.
///
/// A failure to persist is logged and does not prevent the lookup.
///
/// # Errors
///
/// Returns [`GeolocationError`] if the lookup fails.
pub async fn get_ip_based_location(
    preferences: &LocationPreferences,
    client: &reqwest::Client,
    service: &IpGeolocationService,
) -> Result<Location, GeolocationError> {
    if let Err(e) = preferences.set_location_preference(Some(LocationPreference::Ip)) {
        log::warn!("Failed to persist IP location preference: {e}");
    }

    get_location_from_ip(client, service).await
}

fn parse_response(body: &str) -> Result<Location, GeolocationError> {
    let response: IpLocationResponse = serde_json::from_str(body).map_err(|e| {
        log::debug!("Unparseable IP geolocation response: {e}");
        GeolocationError::InvalidLocationData
    })?;

    match (response.latitude, response.longitude) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Ok(Location {
            lat,
            lng,
            is_precise: false,
        }),
        _ => Err(GeolocationError::InvalidLocationData),
    }
}
