//! Airport graph records
//!
//! This module defines the nodes and edges the crawler produces:
//!
//! - `AirportCode`: the key of the graph and the unit of frontier membership
//! - `Airport`: a node, owning its outgoing `Route`s
//! - `Route`: an edge to a destination, with distance, duration and carriers
//! - `Carrier`: an airline operating a route
//!
//! Field order in the record structs is the JSON key order, which is kept
//! alphabetical so the output files come out with sorted keys.

mod code;
mod distance;
mod records;

pub use code::AirportCode;
pub use distance::{great_circle_km, GeoPoint, EARTH_RADIUS_KM};
pub use records::{Airport, Carrier, CarrierMap, Route};
