//! Google Places nearby search provider.
//!
//! Each search result's `geometry.viewport` becomes the record's boundary
//! box. The endpoint is defined in `services/google_places.toml`; the API
//! key comes from `GOOGLE_MAPS_API_KEY`.
//!
//! See <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use serde::Deserialize;
use touch_grass_geometry::BoundaryBox;
use touch_grass_places_models::PlaceRecord;

use crate::{PlaceLookup, PlaceLookupError};

const SERVICE_TOML: &str = include_str!("../../services/google_places.toml");

/// Environment variable holding the Places API key.
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Nearby search endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesService {
    /// Unique identifier (e.g., `"google_places"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Nearby search URL.
    pub base_url: String,
    /// Search radius in meters.
    pub radius_m: u32,
}

impl PlacesService {
    /// Returns the embedded service definition.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the config is embedded).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(SERVICE_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse place lookup service 'google_places': {e}"))
    }
}

#[derive(Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<NearbyPlace>,
}

#[derive(Deserialize)]
struct NearbyPlace {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    geometry: Option<NearbyGeometry>,
}

#[derive(Deserialize)]
struct NearbyGeometry {
    #[serde(default)]
    viewport: Option<BoundaryBox>,
}

/// Place lookup against the Google Places nearby search endpoint.
pub struct GooglePlacesLookup {
    client: reqwest::Client,
    service: PlacesService,
    api_key: String,
}

impl GooglePlacesLookup {
    #[must_use]
    pub const fn new(client: reqwest::Client, service: PlacesService, api_key: String) -> Self {
        Self {
            client,
            service,
            api_key,
        }
    }

    /// Creates a lookup using the embedded service and the API key from
    /// [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`PlaceLookupError::Config`] if the API key is not set.
    pub fn from_env(client: reqwest::Client) -> Result<Self, PlaceLookupError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| PlaceLookupError::Config {
            message: format!("{API_KEY_ENV} environment variable not set"),
        })?;
        Ok(Self::new(client, PlacesService::embedded(), api_key))
    }

    #[must_use]
    pub const fn service(&self) -> &PlacesService {
        &self.service
    }
}

#[async_trait::async_trait]
impl PlaceLookup for GooglePlacesLookup {
    type Map = ();

    async fn lookup(
        &self,
        lat: f64,
        lng: f64,
        _map: &(),
    ) -> Result<Vec<PlaceRecord>, PlaceLookupError> {
        let location = format!("{lat},{lng}");
        let radius = self.service.radius_m.to_string();

        let resp = self
            .client
            .get(&self.service.base_url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlaceLookupError::Status {
                status: status.to_string(),
                message,
            });
        }

        let body = resp.text().await?;
        parse_response(&body)
    }
}

/// Parses a nearby search response body into place records.
fn parse_response(body: &str) -> Result<Vec<PlaceRecord>, PlaceLookupError> {
    let response: NearbySearchResponse =
        serde_json::from_str(body).map_err(|e| PlaceLookupError::Parse {
            message: format!("Failed to parse nearby search response: {e}"),
        })?;

    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => {}
        other => {
            return Err(PlaceLookupError::Status {
                status: other.to_string(),
                message: response.error_message.unwrap_or_default(),
            });
        }
    }

    Ok(response
        .results
        .into_iter()
        .map(|place| PlaceRecord {
            name: place.name,
            types: place.types,
            boundaries: place
                .geometry
                .and_then(|g| g.viewport)
                .into_iter()
                .collect(),
            is_manual_override: false,
        })
        .collect())
}
