#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place-type taxonomy.
//!
//! Maps the type tags attached to a place record (e.g. `"park"`,
//! `"shopping_mall"`) to an [`OutdoorSpaceCategory`]. The three vocabularies
//! are static tag lists and precedence is fixed: exclusion, then primary,
//! then secondary. Exclusion wins over everything else so that a building
//! inside a park reads as indoor at that point.

pub use touch_grass_space_models::OutdoorSpaceCategory;

/// Indoor venues and structures.
pub const EXCLUSION_TYPES: &[&str] = &[
    "shopping_mall",
    "department_store",
    "store",
    "supermarket",
    "grocery_or_supermarket",
    "convenience_store",
    "restaurant",
    "cafe",
    "bar",
    "night_club",
    "movie_theater",
    "bowling_alley",
    "casino",
    "gym",
    "library",
    "museum",
    "art_gallery",
    "aquarium",
    "hospital",
    "doctor",
    "dentist",
    "pharmacy",
    "bank",
    "lodging",
    "hotel",
    "school",
    "primary_school",
    "secondary_school",
    "university",
    "church",
    "mosque",
    "synagogue",
    "hindu_temple",
    "place_of_worship",
    "local_government_office",
    "city_hall",
    "courthouse",
    "post_office",
    "subway_station",
    "train_station",
    "airport",
    "parking",
    "building",
    "premise",
    "subpremise",
    "visitor_center",
];

/// Unambiguous outdoor destinations.
pub const PRIMARY_TYPES: &[&str] = &[
    "park",
    "national_park",
    "state_park",
    "city_park",
    "dog_park",
    "nature_reserve",
    "wildlife_refuge",
    "campground",
    "rv_park",
    "hiking_area",
    "trail",
    "trailhead",
    "natural_feature",
    "beach",
    "forest",
    "garden",
    "botanical_garden",
    "playground",
];

/// Places that are plausibly outdoors but lack a specific outdoor tag.
pub const SECONDARY_TYPES: &[&str] = &[
    "plaza",
    "town_square",
    "tourist_attraction",
    "point_of_interest",
    "landmark",
    "historical_landmark",
    "monument",
    "zoo",
    "amusement_park",
    "stadium",
    "golf_course",
    "marina",
    "cemetery",
];

/// Classifies a set of place type tags.
///
/// Matching is exact on the lowercased, trimmed tag. Returns
/// [`OutdoorSpaceCategory::Unknown`] when no tag is recognized.
#[must_use]
pub fn classify<I, S>(place_types: I) -> OutdoorSpaceCategory
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tags: Vec<String> = place_types
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .collect();

    let category = if any_in(&tags, EXCLUSION_TYPES) {
        OutdoorSpaceCategory::Exclusion
    } else if any_in(&tags, PRIMARY_TYPES) {
        OutdoorSpaceCategory::Primary
    } else if any_in(&tags, SECONDARY_TYPES) {
        OutdoorSpaceCategory::Secondary
    } else {
        OutdoorSpaceCategory::Unknown
    };

    log::trace!("Classified {tags:?} as {category}");

    category
}

/// Checks if any of `tags` is listed in `vocabulary`.
fn any_in(tags: &[String], vocabulary: &[&str]) -> bool {
    tags.iter().any(|tag| vocabulary.contains(&tag.as_str()))
}
