#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Places analysis for outdoor space detection.
//!
//! Given a coordinate, asks a [`PlaceLookup`] provider for nearby place
//! records, tests the coordinate against each record's boundary boxes,
//! classifies the matching records with the space taxonomy, and produces a
//! [`ClassificationResult`] with a confidence score and explanations.
//!
//! Place lookup providers live in [`lookup`]:
//!
//! 1. **Static** — a fixed list of records loaded from TOML, for offline
//!    use and tests.
//! 2. **Google Places** — the nearby search endpoint, mapping each
//!    result's viewport to a boundary box.

pub mod analysis;
pub mod calibration;
pub mod lookup;

use thiserror::Error;

pub use analysis::{PlacesAnalyzer, classify_records, manual_override_result};
pub use calibration::{Calibration, CalibrationError, ConfidenceBand};
pub use touch_grass_places_models::{ClassificationResult, Explanations, PlaceRecord};

/// Errors from place lookup providers.
///
/// Providers must reject with one of these rather than return an empty
/// list when the request itself failed; an empty list means "no places".
#[derive(Debug, Error)]
pub enum PlaceLookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a failure status.
    #[error("Place lookup failed with status {status}: {message}")]
    Status {
        /// HTTP status or provider status code.
        status: String,
        /// Provider-supplied detail, if any.
        message: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider is not configured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// Reading a place file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`BoundaryAnalyzer`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The place lookup collaborator rejected.
    #[error("Place lookup failed: {0}")]
    Lookup(#[from] PlaceLookupError),
}

/// External collaborator that returns nearby place records for a
/// coordinate.
#[async_trait::async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Map handle passed through from the caller untouched.
    type Map: Send + Sync + ?Sized;

    /// Returns the place records near `(lat, lng)`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceLookupError`] on transport or parsing failure.
    async fn lookup(
        &self,
        lat: f64,
        lng: f64,
        map: &Self::Map,
    ) -> Result<Vec<PlaceRecord>, PlaceLookupError>;
}

/// Produces a detailed [`ClassificationResult`] for a coordinate.
///
/// [`PlacesAnalyzer`] is the production implementation; the trait is the
/// seam the outdoor space orchestrator depends on.
#[async_trait::async_trait]
pub trait BoundaryAnalyzer: Send + Sync {
    /// Map handle passed through to the place lookup.
    type Map: Send + Sync + ?Sized;

    /// Classifies the coordinate against nearby place boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the place lookup fails.
    async fn analyze_boundaries(
        &self,
        lat: f64,
        lng: f64,
        map: &Self::Map,
        is_manual_override: bool,
    ) -> Result<ClassificationResult, AnalysisError>;
}
