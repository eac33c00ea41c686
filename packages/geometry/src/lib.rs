#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rectangular boundary geometry for place containment checks.
//!
//! Place-lookup providers describe a place's extent as an axis-aligned
//! northeast/southwest box. Corner values may arrive either as plain
//! numbers or as zero-argument providers backed by a live map overlay, so
//! every corner field is a [`NumericSource`] that is re-evaluated on each
//! geometry test.

use std::fmt;
use std::sync::Arc;

use geo::{Coord, Intersects, Rect};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    const fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(value: Coordinate) -> Self {
        Self::new(value.lng, value.lat)
    }
}

/// A numeric boundary value that is either a literal or a deferred provider.
///
/// Providers are never cached: map SDK objects can move between calls, so
/// the value is read fresh every time [`NumericSource::value`] is called.
#[derive(Clone)]
pub enum NumericSource {
    /// A plain number.
    Literal(f64),
    /// A zero-argument accessor evaluated on demand.
    Provider(Arc<dyn Fn() -> f64 + Send + Sync>),
}

impl NumericSource {
    /// Wraps a closure as a deferred numeric provider.
    #[must_use]
    pub fn provider(f: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(f))
    }

    /// Evaluates the current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Literal(v) => *v,
            Self::Provider(f) => f(),
        }
    }
}

impl From<f64> for NumericSource {
    fn from(value: f64) -> Self {
        Self::Literal(value)
    }
}

impl fmt::Debug for NumericSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

impl Serialize for NumericSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for NumericSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::Literal)
    }
}

/// One corner of a [`BoundaryBox`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corner {
    pub lat: NumericSource,
    pub lng: NumericSource,
}

impl Corner {
    #[must_use]
    pub fn new(lat: impl Into<NumericSource>, lng: impl Into<NumericSource>) -> Self {
        Self {
            lat: lat.into(),
            lng: lng.into(),
        }
    }

    /// Reads both fields once. Non-finite values make the corner unusable.
    fn resolve(&self) -> Option<Coord<f64>> {
        let lat = self.lat.value();
        let lng = self.lng.value();

        if lat.is_finite() && lng.is_finite() {
            Some(Coord { x: lng, y: lat })
        } else {
            log::trace!("Ignoring non-finite boundary corner ({lat}, {lng})");
            None
        }
    }
}

/// An axis-aligned place boundary given by its northeast and southwest
/// corners.
///
/// Either corner may be missing when the upstream record is malformed; such
/// a box never contains any point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundaryBox {
    #[serde(default)]
    pub northeast: Option<Corner>,
    #[serde(default)]
    pub southwest: Option<Corner>,
}

impl BoundaryBox {
    #[must_use]
    pub const fn new(northeast: Corner, southwest: Corner) -> Self {
        Self {
            northeast: Some(northeast),
            southwest: Some(southwest),
        }
    }

    /// Evaluates all four corner fields into a normalized rectangle.
    ///
    /// Swapped corners are normalized so that the minimum is always the
    /// southwest point. Returns `None` when a corner is missing or
    /// non-finite.
    #[must_use]
    pub fn resolve(&self) -> Option<Rect<f64>> {
        let northeast = self.northeast.as_ref()?.resolve()?;
        let southwest = self.southwest.as_ref()?.resolve()?;
        Some(Rect::new(southwest, northeast))
    }
}

/// Returns `true` when `point` lies inside `bbox`, edges included.
///
/// Malformed boxes contain nothing.
#[must_use]
pub fn contains_point(bbox: &BoundaryBox, point: Coordinate) -> bool {
    bbox.resolve()
        .is_some_and(|rect| rect.intersects(&geo::Point::from(point).0))
}

/// Cheap signed distance from `point` to the nearest edge of `bbox`, in
/// degrees.
///
/// This is the smallest of the four margins to each edge: positive inside,
/// zero on an edge, negative outside. It is a relative signal only, not a
/// geodesic distance. Returns `None` for malformed boxes and non-finite
/// points.
#[must_use]
pub fn distance_to_edge(bbox: &BoundaryBox, point: Coordinate) -> Option<f64> {
    if !point.is_finite() {
        return None;
    }

    let rect = bbox.resolve()?;
    let min = rect.min();
    let max = rect.max();

    let margins = [
        point.lat - min.y,
        max.y - point.lat,
        point.lng - min.x,
        max.x - point.lng,
    ];

    Some(margins.into_iter().fold(f64::INFINITY, f64::min))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn central_park() -> BoundaryBox {
        BoundaryBox::new(Corner::new(40.800, -73.949), Corner::new(40.764, -73.981))
    }

    #[test]
    fn contains_interior_point() {
        assert!(contains_point(
            &central_park(),
            Coordinate::new(40.7829, -73.9654)
        ));
    }

    #[test]
    fn edges_are_inclusive() {
        let bbox = central_park();
        assert!(contains_point(&bbox, Coordinate::new(40.800, -73.960)));
        assert!(contains_point(&bbox, Coordinate::new(40.764, -73.981)));
        assert!(contains_point(&bbox, Coordinate::new(40.780, -73.949)));
    }

    #[test]
    fn rejects_outside_point() {
        let bbox = central_park();
        assert!(!contains_point(&bbox, Coordinate::new(40.7580, -73.9855)));
        assert!(!contains_point(&bbox, Coordinate::new(40.780, -73.940)));
    }

    #[test]
    fn swapped_corners_are_normalized() {
        let bbox = BoundaryBox::new(Corner::new(40.764, -73.981), Corner::new(40.800, -73.949));
        assert!(contains_point(&bbox, Coordinate::new(40.7829, -73.9654)));
    }

    #[test]
    fn missing_corner_contains_nothing() {
        let bbox = BoundaryBox {
            northeast: Some(Corner::new(40.800, -73.949)),
            southwest: None,
        };
        assert!(!contains_point(&bbox, Coordinate::new(40.7829, -73.9654)));
        assert!(distance_to_edge(&bbox, Coordinate::new(40.7829, -73.9654)).is_none());
        assert!(!contains_point(
            &BoundaryBox::default(),
            Coordinate::new(0.0, 0.0)
        ));
    }

    #[test]
    fn non_finite_corner_contains_nothing() {
        let bbox = BoundaryBox::new(Corner::new(f64::NAN, -73.949), Corner::new(40.764, -73.981));
        assert!(!contains_point(&bbox, Coordinate::new(40.7829, -73.9654)));
    }

    #[test]
    fn providers_are_evaluated_on_every_check() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let north = NumericSource::provider(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            40.800
        });
        let bbox = BoundaryBox::new(
            Corner {
                lat: north,
                lng: NumericSource::provider(|| -73.949),
            },
            Corner::new(40.764, -73.981),
        );

        assert!(contains_point(&bbox, Coordinate::new(40.7829, -73.9654)));
        assert!(contains_point(&bbox, Coordinate::new(40.7829, -73.9654)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn provider_changes_are_observed() {
        let north = Arc::new(std::sync::Mutex::new(40.800));
        let reader = north.clone();
        let bbox = BoundaryBox::new(
            Corner::new(
                NumericSource::provider(move || *reader.lock().unwrap()),
                -73.949,
            ),
            Corner::new(40.764, -73.981),
        );
        let point = Coordinate::new(40.790, -73.960);

        assert!(contains_point(&bbox, point));
        *north.lock().unwrap() = 40.780;
        assert!(!contains_point(&bbox, point));
    }

    #[test]
    fn distance_is_positive_inside_and_negative_outside() {
        let bbox = BoundaryBox::new(Corner::new(1.0, 1.0), Corner::new(0.0, 0.0));

        let inside = distance_to_edge(&bbox, Coordinate::new(0.5, 0.25)).unwrap();
        assert!((inside - 0.25).abs() < 1e-12);

        let on_edge = distance_to_edge(&bbox, Coordinate::new(1.0, 0.5)).unwrap();
        assert!(on_edge.abs() < 1e-12);

        let outside = distance_to_edge(&bbox, Coordinate::new(0.5, 1.5)).unwrap();
        assert!((outside - -0.5).abs() < 1e-12);
    }

    #[test]
    fn non_finite_point_has_no_distance() {
        let bbox = BoundaryBox::new(Corner::new(1.0, 1.0), Corner::new(0.0, 0.0));

        assert!(distance_to_edge(&bbox, Coordinate::new(f64::NAN, f64::NAN)).is_none());
        assert!(distance_to_edge(&bbox, Coordinate::new(f64::NAN, 0.5)).is_none());
        assert!(distance_to_edge(&bbox, Coordinate::new(0.5, f64::INFINITY)).is_none());
        assert!(!contains_point(&bbox, Coordinate::new(f64::NAN, 0.5)));
    }

    #[test]
    fn deserializes_literal_corners() {
        let bbox: BoundaryBox = serde_json::from_value(serde_json::json!({
            "northeast": { "lat": 1.0, "lng": 1.0 },
            "southwest": { "lat": 0.0, "lng": 0.0 }
        }))
        .unwrap();
        assert!(contains_point(&bbox, Coordinate::new(0.5, 0.5)));

        let partial: BoundaryBox = toml::from_str("[northeast]\nlat = 1.0\nlng = 1.0\n").unwrap();
        assert!(partial.southwest.is_none());
    }
}
