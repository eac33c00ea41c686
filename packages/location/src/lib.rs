#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location preference and acquisition helpers.
//!
//! Callers use these to obtain the coordinate fed into outdoor space
//! detection:
//!
//! 1. **Preference** — a persisted `"precise"` / `"ip"` choice
//!    ([`preference`]).
//! 2. **IP geolocation** — a coarse fix from a third-party JSON endpoint
//!    configured in `services/ip_geolocation.toml` ([`ip`]).
//! 3. **Device geolocation** — a precise single-shot fix with a 5 second
//!    timeout and no cached positions ([`device`]).
//!
//! Acquisition failures are returned as [`GeolocationError`] unmodified so
//! the caller can choose its own fallback.

pub mod device;
pub mod ip;
pub mod paths;
pub mod preference;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use device::{
    DevicePosition, DevicePositionSource, PositionOptions, request_precise_location,
    try_precise_location,
};
pub use ip::{IpGeolocationService, get_ip_based_location, get_location_from_ip};
pub use preference::{
    FileStore, LocationPreference, LocationPreferences, MemoryStore, PreferenceError,
    PreferenceStore,
};

/// An acquired location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    /// `true` for device fixes, `false` for IP-derived ones.
    pub is_precise: bool,
}

/// Errors from location acquisition.
#[derive(Debug, Error)]
pub enum GeolocationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The IP geolocation endpoint answered with a non-success status.
    #[error("Failed to get location from IP: {status_text}")]
    Status {
        /// The response's status text (e.g. "Service Unavailable").
        status_text: String,
    },

    /// The endpoint answered without usable coordinates.
    #[error("Invalid location data received")]
    InvalidLocationData,

    /// No device geolocation capability is available.
    #[error("Geolocation is not supported on this device")]
    Unsupported,

    /// The user denied the location permission.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix arrived before the timeout.
    #[error("Timed out after {timeout:?} waiting for a location fix")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The platform could not determine a position.
    #[error("Location unavailable: {message}")]
    Unavailable {
        /// Platform-supplied description.
        message: String,
    },
}

/// Acquires a location according to the stored preference.
///
/// Returns `Ok(None)` when no preference is stored, leaving the caller to
/// ask the user.
///
/// # Errors
///
/// Returns [`GeolocationError`] if the preferred acquisition fails.
pub async fn resolve_location(
    preferences: &LocationPreferences,
    client: &reqwest::Client,
    service: &IpGeolocationService,
    device: Option<&dyn DevicePositionSource>,
) -> Result<Option<Location>, GeolocationError> {
    match preferences.get_location_preference() {
        Some(LocationPreference::Precise) => request_precise_location(device).await.map(Some),
        Some(LocationPreference::Ip) => get_location_from_ip(client, service).await.map(Some),
        None => {
            log::debug!("No location preference stored");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct FixedDevice;

    #[async_trait::async_trait]
    impl DevicePositionSource for FixedDevice {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<DevicePosition, GeolocationError> {
            Ok(DevicePosition {
                latitude: 51.5074,
                longitude: -0.1278,
                accuracy_m: Some(8.0),
            })
        }
    }

    fn service(url: String) -> IpGeolocationService {
        IpGeolocationService {
            url,
            ..IpGeolocationService::embedded()
        }
    }

    #[tokio::test]
    async fn no_preference_resolves_to_none() {
        let preferences = LocationPreferences::new(Arc::new(MemoryStore::default()));
        let location = resolve_location(
            &preferences,
            &reqwest::Client::new(),
            &service("http://127.0.0.1:9/".to_string()),
            Some(&FixedDevice),
        )
        .await
        .unwrap();

        assert!(location.is_none());
    }

    #[tokio::test]
    async fn precise_preference_uses_device() {
        let preferences = LocationPreferences::new(Arc::new(MemoryStore::default()));
        preferences
            .set_location_preference(Some(LocationPreference::Precise))
            .unwrap();

        let location = resolve_location(
            &preferences,
            &reqwest::Client::new(),
            &service("http://127.0.0.1:9/".to_string()),
            Some(&FixedDevice),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(location.is_precise);
        assert!((location.lat - 51.5074).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ip_preference_uses_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "latitude": 48.8566, "longitude": 2.3522 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let preferences = LocationPreferences::new(Arc::new(MemoryStore::default()));
        preferences
            .set_location_preference(Some(LocationPreference::Ip))
            .unwrap();

        let location = resolve_location(
            &preferences,
            &reqwest::Client::new(),
            &service(server.uri()),
            None,
        )
        .await
        .unwrap()
        .unwrap();

        assert!(!location.is_precise);
        assert!((location.lng - 2.3522).abs() < 1e-9);
    }

    #[test]
    fn location_serializes_camel_case() {
        let json = serde_json::to_value(Location {
            lat: 1.0,
            lng: 2.0,
            is_precise: false,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "lat": 1.0, "lng": 2.0, "isPrecise": false })
        );
    }
}
