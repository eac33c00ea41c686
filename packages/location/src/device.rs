//! Precise device geolocation.
//!
//! The platform position API is abstracted as [`DevicePositionSource`].
//! Requests always ask for high accuracy, never accept a cached position,
//! and give up after [`PRECISE_TIMEOUT`]. The timeout is enforced here at
//! the call site as well, so a source that ignores its options still
//! cannot hang the caller.

use std::time::Duration;

use crate::{GeolocationError, Location, LocationPreference, LocationPreferences};

/// How long to wait for a device fix.
pub const PRECISE_TIMEOUT: Duration = Duration::from_secs(5);

/// Options passed to the platform position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest acceptable cached position; zero disables caching.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// High accuracy, [`PRECISE_TIMEOUT`], no cached positions.
    #[must_use]
    pub const fn precise() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: PRECISE_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// A single position fix from the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters, if reported.
    pub accuracy_m: Option<f64>,
}

/// Platform geolocation capability.
#[async_trait::async_trait]
pub trait DevicePositionSource: Send + Sync {
    /// Requests one position fix.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError::PermissionDenied`] when the user refuses,
    /// or another [`GeolocationError`] when no fix can be produced.
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<DevicePosition, GeolocationError>;
}

/// Requests a precise location from the device.
///
/// `device` is `None` on platforms without geolocation.
///
/// # Errors
///
/// Returns [`GeolocationError::Unsupported`] without a device,
/// [`GeolocationError::Timeout`] when no fix arrives in time, or the
/// device's own error.
pub async fn request_precise_location(
    device: Option<&dyn DevicePositionSource>,
) -> Result<Location, GeolocationError> {
    let device = device.ok_or(GeolocationError::Unsupported)?;
    let options = PositionOptions::precise();

    let position = tokio::time::timeout(options.timeout, device.current_position(&options))
        .await
        .map_err(|_| GeolocationError::Timeout {
            timeout: options.timeout,
        })??;

    log::debug!(
        "Device fix ({}, {}) accuracy {:?}m",
        position.latitude,
        position.longitude,
        position.accuracy_m
    );

    Ok(Location {
        lat: position.latitude,
        lng: position.longitude,
        is_precise: true,
    })
}

/// Requests a precise location and, on success, persists the `"precise"`
/// preference.
///
/// # Errors
///
/// Returns the same errors as [`request_precise_location`]. The preference
/// is left untouched on failure.
pub async fn try_precise_location(
    preferences: &LocationPreferences,
    device: Option<&dyn DevicePositionSource>,
) -> Result<Location, GeolocationError> {
    let location = request_precise_location(device).await?;

    if let Err(e) = preferences.set_location_preference(Some(LocationPreference::Precise)) {
        log::warn!("Failed to persist precise location preference: {e}");
    }

    Ok(location)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::MemoryStore;

    enum Behavior {
        Fix,
        Deny,
        Hang,
    }

    struct FakeDevice {
        behavior: Behavior,
        seen: Mutex<Option<PositionOptions>>,
    }

    impl FakeDevice {
        const fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl DevicePositionSource for FakeDevice {
        async fn current_position(
            &self,
            options: &PositionOptions,
        ) -> Result<DevicePosition, GeolocationError> {
            *self.seen.lock().unwrap() = Some(*options);
            match self.behavior {
                Behavior::Fix => Ok(DevicePosition {
                    latitude: -33.8688,
                    longitude: 151.2093,
                    accuracy_m: Some(5.0),
                }),
                Behavior::Deny => Err(GeolocationError::PermissionDenied),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(GeolocationError::Unavailable {
                        message: "never reached".to_string(),
                    })
                }
            }
        }
    }

    #[tokio::test]
    async fn returns_precise_fix_with_precise_options() {
        let device = FakeDevice::new(Behavior::Fix);
        let location = request_precise_location(Some(&device)).await.unwrap();

        assert!(location.is_precise);
        assert!((location.lat - -33.8688).abs() < 1e-9);

        let seen = device.seen.lock().unwrap().unwrap();
        assert!(seen.enable_high_accuracy);
        assert_eq!(seen.timeout, Duration::from_secs(5));
        assert_eq!(seen.maximum_age, Duration::ZERO);
    }

    #[tokio::test]
    async fn missing_device_is_unsupported() {
        let err = request_precise_location(None).await.unwrap_err();
        assert!(matches!(err, GeolocationError::Unsupported));
    }

    #[tokio::test]
    async fn denial_propagates() {
        let device = FakeDevice::new(Behavior::Deny);
        let err = request_precise_location(Some(&device)).await.unwrap_err();
        assert!(matches!(err, GeolocationError::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_device_times_out() {
        let device = FakeDevice::new(Behavior::Hang);
        let err = request_precise_location(Some(&device)).await.unwrap_err();
        assert!(matches!(
            err,
            GeolocationError::Timeout { timeout } if timeout == PRECISE_TIMEOUT
        ));
    }

    #[tokio::test]
    async fn try_precise_persists_on_success_only() {
        let preferences = LocationPreferences::new(Arc::new(MemoryStore::default()));

        let denied = FakeDevice::new(Behavior::Deny);
        assert!(try_precise_location(&preferences, Some(&denied)).await.is_err());
        assert_eq!(preferences.get_location_preference(), None);

        let device = FakeDevice::new(Behavior::Fix);
        try_precise_location(&preferences, Some(&device))
            .await
            .unwrap();
        assert_eq!(
            preferences.get_location_preference(),
            Some(LocationPreference::Precise)
        );
    }
}
