#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Public entry point for outdoor space detection.
//!
//! [`analyze_outdoor_space`] either short-circuits on a manual override or
//! delegates to a [`BoundaryAnalyzer`], clamps the confidence into
//! `0..=100`, and projects the detailed result into an
//! [`OutdoorDetectionResult`]. It always resolves: any error or panic from
//! the analyzer becomes the fallback result. There are no retries; callers
//! re-invoke on the next user action.

use std::panic::AssertUnwindSafe;

use futures::FutureExt as _;
use touch_grass_places::{BoundaryAnalyzer, ClassificationResult, manual_override_result};
use touch_grass_places_models::{DebugInfo, Explanations, OutdoorDetectionResult};

/// Reason code carried by the fallback result.
pub const DETECTION_FAILED: &str = "Detection failed";

/// Detects whether `(lat, lng)` is in a qualifying outdoor space.
///
/// `map` is passed through to the analyzer untouched. With
/// `is_manual_override` set the analyzer is never called.
pub async fn analyze_outdoor_space<A>(
    analyzer: &A,
    lat: f64,
    lng: f64,
    map: &A::Map,
    is_manual_override: bool,
) -> OutdoorDetectionResult
where
    A: BoundaryAnalyzer + ?Sized,
{
    if is_manual_override {
        log::debug!("Manual override enabled for ({lat}, {lng})");
        return override_result();
    }

    let analysis = AssertUnwindSafe(analyzer.analyze_boundaries(lat, lng, map, false))
        .catch_unwind()
        .await;

    match analysis {
        Ok(Ok(result)) => project(result),
        Ok(Err(e)) => {
            log::warn!("Outdoor space detection failed for ({lat}, {lng}): {e}");
            fallback_result()
        }
        Err(_) => {
            log::warn!("Outdoor space analysis panicked for ({lat}, {lng})");
            fallback_result()
        }
    }
}

/// The result returned for a manual override.
#[must_use]
pub fn override_result() -> OutdoorDetectionResult {
    let result = manual_override_result();

    OutdoorDetectionResult {
        is_outdoors: result.is_outdoors,
        confidence: clamp_confidence(result.confidence),
        reasons: result.reasons,
        explanations: result.explanations,
        debug_info: DebugInfo {
            in_boundary: result.in_boundary,
            is_in_building: result.is_in_building,
            ..DebugInfo::default()
        },
    }
}

/// The safe result returned when analysis fails.
#[must_use]
pub fn fallback_result() -> OutdoorDetectionResult {
    OutdoorDetectionResult {
        is_outdoors: false,
        confidence: 0,
        reasons: vec![DETECTION_FAILED.to_string()],
        explanations: Explanations {
            positive: Vec::new(),
            negative: vec![
                "Sorry, we were unable to analyze your location. Please try again.".to_string(),
            ],
        },
        debug_info: DebugInfo::default(),
    }
}

/// Clamps a raw confidence into `0..=100`.
#[must_use]
pub fn clamp_confidence(raw: i32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        raw.clamp(0, 100) as u8
    }
}

fn project(result: ClassificationResult) -> OutdoorDetectionResult {
    OutdoorDetectionResult {
        is_outdoors: result.is_outdoors,
        confidence: clamp_confidence(result.confidence),
        reasons: result.reasons,
        explanations: result.explanations,
        debug_info: DebugInfo {
            in_boundary: result.in_boundary,
            is_in_building: result.is_in_building,
            place_types: Some(result.place_types),
            distance_to_edge: result.distance_to_edge,
            space_category: Some(result.space_category),
        },
    }
}
