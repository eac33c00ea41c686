//! Place lookup providers.

pub mod google;
pub mod static_places;

pub use google::{GooglePlacesLookup, PlacesService};
pub use static_places::StaticPlaceLookup;
