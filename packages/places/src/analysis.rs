//! Boundary analysis over nearby place records.
//!
//! Every record with a boundary containing the coordinate contributes its
//! type tags. The taxonomy runs over the merged tags, so an indoor record
//! (a visitor center) nested inside an outdoor one (a park) resolves to
//! [`OutdoorSpaceCategory::Exclusion`] at that point.

use touch_grass_geometry::{Coordinate, contains_point, distance_to_edge};
use touch_grass_places_models::{ClassificationResult, Explanations, PlaceRecord};
use touch_grass_space::{OutdoorSpaceCategory, classify};

use crate::{AnalysisError, BoundaryAnalyzer, Calibration, PlaceLookup};

/// Places analysis backed by a [`PlaceLookup`] provider.
pub struct PlacesAnalyzer<L> {
    lookup: L,
    calibration: Calibration,
}

impl<L: PlaceLookup> PlacesAnalyzer<L> {
    /// Creates an analyzer using the embedded calibration.
    #[must_use]
    pub fn new(lookup: L) -> Self {
        Self::with_calibration(lookup, Calibration::default())
    }

    #[must_use]
    pub const fn with_calibration(lookup: L, calibration: Calibration) -> Self {
        Self {
            lookup,
            calibration,
        }
    }

    #[must_use]
    pub const fn lookup(&self) -> &L {
        &self.lookup
    }

    #[must_use]
    pub const fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}

#[async_trait::async_trait]
impl<L: PlaceLookup> BoundaryAnalyzer for PlacesAnalyzer<L> {
    type Map = L::Map;

    async fn analyze_boundaries(
        &self,
        lat: f64,
        lng: f64,
        map: &Self::Map,
        is_manual_override: bool,
    ) -> Result<ClassificationResult, AnalysisError> {
        if is_manual_override {
            log::debug!("Manual override set, skipping place lookup for ({lat}, {lng})");
            return Ok(manual_override_result());
        }

        let records = self.lookup.lookup(lat, lng, map).await?;
        log::debug!(
            "Place lookup returned {} records for ({lat}, {lng})",
            records.len()
        );

        let result = classify_records(&records, Coordinate::new(lat, lng), &self.calibration);
        log::debug!(
            "Classified ({lat}, {lng}) as {} (outdoors={}, confidence={})",
            result.space_category,
            result.is_outdoors,
            result.confidence
        );

        Ok(result)
    }
}

/// The fixed result for a manual override.
#[must_use]
pub fn manual_override_result() -> ClassificationResult {
    ClassificationResult {
        is_outdoors: true,
        is_in_building: false,
        in_boundary: true,
        confidence: 100,
        reasons: Vec::new(),
        explanations: Explanations {
            positive: vec!["Manual override enabled".to_string()],
            negative: Vec::new(),
        },
        place_types: Vec::new(),
        space_category: OutdoorSpaceCategory::Unknown,
        distance_to_edge: None,
    }
}

/// A record with at least one boundary containing the point.
struct BoundaryMatch<'a> {
    record: &'a PlaceRecord,
    category: OutdoorSpaceCategory,
    /// Deepest margin over the containing boundaries.
    depth: Option<f64>,
}

impl BoundaryMatch<'_> {
    fn name(&self) -> String {
        self.record.display_name()
    }
}

/// Classifies `point` against already-fetched place records.
///
/// Pure: records are only read.
#[must_use]
pub fn classify_records(
    records: &[PlaceRecord],
    point: Coordinate,
    calibration: &Calibration,
) -> ClassificationResult {
    if records.iter().any(|r| r.is_manual_override) {
        log::debug!("Place lookup returned a manual override record");
        return manual_override_result();
    }

    let matches: Vec<BoundaryMatch<'_>> = records
        .iter()
        .filter_map(|record| match_record(record, point))
        .collect();

    if matches.is_empty() {
        return not_in_boundary(records, point, calibration);
    }

    let place_types = merged_types(&matches);
    let space_category = classify(&place_types);
    let depth = matches
        .iter()
        .filter_map(|m| m.depth)
        .reduce(f64::max);

    let mut result = ClassificationResult {
        is_outdoors: false,
        is_in_building: false,
        in_boundary: true,
        confidence: 0,
        reasons: vec!["in_boundary".to_string()],
        explanations: Explanations::default(),
        place_types,
        space_category,
        distance_to_edge: depth,
    };

    match space_category {
        OutdoorSpaceCategory::Exclusion => {
            let indoor = matches
                .iter()
                .find(|m| m.category == OutdoorSpaceCategory::Exclusion)
                .unwrap_or(&matches[0]);

            result.is_in_building = true;
            result.reasons.push("in_building".to_string());
            result
                .explanations
                .negative
                .push(format!("{} is likely an indoor area", indoor.name()));

            for outdoor in matches.iter().filter(|m| m.category.is_outdoor()) {
                result
                    .explanations
                    .positive
                    .push(format!("You are within the boundary of {}", outdoor.name()));
            }

            // Close to the building's edge means more likely to be outside it.
            let signal = -calibration.inside_signal(indoor.depth);
            result.confidence = calibration.exclusion.score(signal);
        }
        OutdoorSpaceCategory::Primary => {
            let best = best_match(&matches, OutdoorSpaceCategory::Primary);

            result.is_outdoors = true;
            result.reasons.push("primary_outdoor_space".to_string());
            result
                .explanations
                .positive
                .push(format!("You are in {}, a recognized outdoor space", best.name()));
            push_edge_warning(&mut result, &best, calibration);

            result.confidence = calibration
                .primary
                .score(calibration.inside_signal(best.depth));
        }
        OutdoorSpaceCategory::Secondary => {
            let best = best_match(&matches, OutdoorSpaceCategory::Secondary);

            result.is_outdoors = true;
            result.reasons.push("secondary_outdoor_space".to_string());
            result
                .explanations
                .positive
                .push(format!("You are at {}, which is likely outdoors", best.name()));
            result.explanations.negative.push(format!(
                "{} is a weaker outdoor signal than a park or nature reserve",
                best.name()
            ));
            push_edge_warning(&mut result, &best, calibration);

            result.confidence = calibration
                .secondary
                .score(calibration.inside_signal(best.depth));
        }
        OutdoorSpaceCategory::Unknown => {
            result.reasons.push("unrecognized_place_type".to_string());
            for m in &matches {
                result
                    .explanations
                    .negative
                    .push(format!("{} is not a recognized outdoor space", m.name()));
            }
            result.confidence = calibration.outside.base;
        }
    }

    result
}

fn match_record(record: &PlaceRecord, point: Coordinate) -> Option<BoundaryMatch<'_>> {
    let mut contained = false;
    let mut depth: Option<f64> = None;

    for bbox in &record.boundaries {
        if contains_point(bbox, point) {
            contained = true;
            if let Some(d) = distance_to_edge(bbox, point) {
                depth = Some(depth.map_or(d, |current| current.max(d)));
            }
        }
    }

    contained.then(|| BoundaryMatch {
        record,
        category: classify(&record.types),
        depth,
    })
}

/// Type tags of all matches, first occurrence order, without duplicates.
fn merged_types(matches: &[BoundaryMatch<'_>]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for tag in matches.iter().flat_map(|m| &m.record.types) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}

/// The deepest match of `category`.
///
/// Falls back to the deepest match overall, which only happens when the
/// category came from tags spread across several records.
fn best_match<'a>(
    matches: &'a [BoundaryMatch<'a>],
    category: OutdoorSpaceCategory,
) -> BoundaryMatch<'a> {
    let deepest = |a: &&BoundaryMatch<'_>, b: &&BoundaryMatch<'_>| {
        a.depth
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&b.depth.unwrap_or(f64::NEG_INFINITY))
    };

    let best = matches
        .iter()
        .filter(|m| m.category == category)
        .max_by(deepest)
        .or_else(|| matches.iter().max_by(deepest))
        .unwrap_or(&matches[0]);

    BoundaryMatch {
        record: best.record,
        category: best.category,
        depth: best.depth,
    }
}

fn push_edge_warning(
    result: &mut ClassificationResult,
    best: &BoundaryMatch<'_>,
    calibration: &Calibration,
) {
    if best.depth.is_some_and(|d| d < calibration.edge_margin_deg) {
        result.reasons.push("near_boundary_edge".to_string());
        result
            .explanations
            .negative
            .push(format!("You are close to the edge of {}", best.name()));
    }
}

fn not_in_boundary(
    records: &[PlaceRecord],
    point: Coordinate,
    calibration: &Calibration,
) -> ClassificationResult {
    let closest_miss = records
        .iter()
        .flat_map(|r| &r.boundaries)
        .filter_map(|bbox| distance_to_edge(bbox, point))
        .reduce(f64::max);

    let mut reasons = vec!["not_in_boundary".to_string()];
    if records.is_empty() {
        reasons.push("no_places_found".to_string());
    }

    ClassificationResult {
        is_outdoors: false,
        is_in_building: false,
        in_boundary: false,
        confidence: calibration
            .outside
            .score(calibration.outside_signal(closest_miss)),
        reasons,
        explanations: Explanations {
            positive: Vec::new(),
            negative: vec!["You are not in a recognized outdoor area".to_string()],
        },
        place_types: Vec::new(),
        space_category: OutdoorSpaceCategory::Unknown,
        distance_to_edge: closest_miss,
    }
}
