#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Outdoor space category types.
//!
//! Every place the engine inspects is reduced to exactly one
//! [`OutdoorSpaceCategory`]. The category is always derived from place type
//! tags at classification time and never stored.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How strongly a place reads as a qualifying outdoor space.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OutdoorSpaceCategory {
    /// Unambiguous outdoor destinations (parks, reserves, campgrounds, trails)
    Primary,
    /// Plausible but weaker outdoor signal (plazas, tourist attractions)
    Secondary,
    /// Indoor venues, even when inside an outdoor boundary (malls, buildings)
    Exclusion,
    /// No matching boundary or unrecognized types
    #[default]
    Unknown,
}

impl OutdoorSpaceCategory {
    /// Whether a point in a place of this category counts as outdoors.
    #[must_use]
    pub const fn is_outdoor(self) -> bool {
        matches!(self, Self::Primary | Self::Secondary)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Primary, Self::Secondary, Self::Exclusion, Self::Unknown]
    }
}
