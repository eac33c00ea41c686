#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place records and classification result types.
//!
//! [`PlaceRecord`] is what a place-lookup provider hands back for a
//! coordinate. [`ClassificationResult`] is the detailed output of the places
//! analysis, and [`OutdoorDetectionResult`] is the normalized projection
//! exposed to callers.

use serde::{Deserialize, Serialize};
use touch_grass_geometry::BoundaryBox;
use touch_grass_space_models::OutdoorSpaceCategory;

/// A nearby place with its type tags and boundary boxes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    /// Display name, when the provider supplies one.
    #[serde(default)]
    pub name: Option<String>,
    /// Place type tags (e.g. `"park"`, `"shopping_mall"`).
    #[serde(default)]
    pub types: Vec<String>,
    /// Zero or more boundaries approximating the place's extent.
    #[serde(default)]
    pub boundaries: Vec<BoundaryBox>,
    /// Set when the record was injected by a manual override.
    #[serde(default)]
    pub is_manual_override: bool,
}

impl PlaceRecord {
    /// Returns the name to use in user-facing explanations.
    ///
    /// Falls back to the first type tag in sentence case
    /// (`"shopping_mall"` becomes `"Shopping mall"`), then to
    /// `"This place"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            return name.to_string();
        }

        self.types
            .first()
            .map(|t| humanize_tag(t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "This place".to_string())
    }
}

fn humanize_tag(tag: &str) -> String {
    let spaced = tag.trim().replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// User-facing sentences supporting and opposing the decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanations {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// Detailed output of a single places analysis.
///
/// `confidence` is not clamped at this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_outdoors: bool,
    pub is_in_building: bool,
    pub in_boundary: bool,
    pub confidence: i32,
    /// Short machine-oriented reason codes, in decision order.
    pub reasons: Vec<String>,
    pub explanations: Explanations,
    pub place_types: Vec<String>,
    pub space_category: OutdoorSpaceCategory,
    /// Signed margin to the nearest boundary edge in degrees; negative
    /// means outside.
    pub distance_to_edge: Option<f64>,
}

/// Diagnostic fields carried alongside an [`OutdoorDetectionResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub in_boundary: bool,
    pub is_in_building: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_to_edge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_category: Option<OutdoorSpaceCategory>,
}

/// The public result of an outdoor space detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdoorDetectionResult {
    pub is_outdoors: bool,
    /// Always within `0..=100`.
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub explanations: Explanations,
    pub debug_info: DebugInfo,
}
