//! Place lookup over a fixed list of records.
//!
//! Records are usually loaded from a TOML file with one `[[places]]` table
//! per record. Every record is returned for every coordinate; the analysis
//! decides which boundaries contain the point.

use std::path::Path;

use serde::Deserialize;
use touch_grass_places_models::PlaceRecord;

use crate::{PlaceLookup, PlaceLookupError};

#[derive(Deserialize)]
struct PlaceFile {
    #[serde(default)]
    places: Vec<PlaceRecord>,
}

/// Serves the same records for every lookup.
#[derive(Debug, Clone, Default)]
pub struct StaticPlaceLookup {
    places: Vec<PlaceRecord>,
}

impl StaticPlaceLookup {
    #[must_use]
    pub const fn new(places: Vec<PlaceRecord>) -> Self {
        Self { places }
    }

    /// Parses records from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceLookupError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, PlaceLookupError> {
        let file: PlaceFile =
            toml::de::from_str(toml_str).map_err(|e| PlaceLookupError::Parse {
                message: format!("Invalid place file: {e}"),
            })?;
        Ok(Self::new(file.places))
    }

    /// Loads records from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceLookupError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, PlaceLookupError> {
        let contents = std::fs::read_to_string(path)?;
        let lookup = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded {} places from {}",
            lookup.places.len(),
            path.display()
        );
        Ok(lookup)
    }

    #[must_use]
    pub fn places(&self) -> &[PlaceRecord] {
        &self.places
    }
}

#[async_trait::async_trait]
impl PlaceLookup for StaticPlaceLookup {
    type Map = ();

    async fn lookup(
        &self,
        _lat: f64,
        _lng: f64,
        _map: &(),
    ) -> Result<Vec<PlaceRecord>, PlaceLookupError> {
        Ok(self.places.clone())
    }
}
