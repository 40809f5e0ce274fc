//! Railway station chainage.
//!
//! Stations are matched by name to point features of a GeoJSON export, then
//! projected onto the rail line to find their distance from its start.

pub mod chainage;
pub mod error;
pub mod geo;
pub mod osm;
pub mod stations;

pub use chainage::{chainage, locate, LinePosition, Polyline};
pub use error::GeoError;
pub use geo::{distance, GeoPoint};
