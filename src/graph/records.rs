use crate::graph::AirportCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Process-wide carrier code → carrier name mapping
pub type CarrierMap = BTreeMap<String, String>;

/// An airline operating a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    /// Carrier IATA code (`null` when the source has none)
    pub iata: Option<String>,

    /// Carrier display name
    pub name: Option<String>,
}

impl Carrier {
    /// Returns the `(code, name)` pair for the global carrier mapping, or
    /// `None` unless both are present and non-empty
    pub fn mapping_entry(&self) -> Option<(&str, &str)> {
        let iata = self.iata.as_deref().filter(|code| !code.is_empty())?;
        let name = self.name.as_deref().filter(|name| !name.is_empty())?;
        Some((iata, name))
    }
}

/// An outgoing edge from an airport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Carriers flying this route (passenger, active)
    pub carriers: Vec<Carrier>,

    /// Destination airport
    pub iata: AirportCode,

    /// Great-circle distance in kilometres
    pub km: u32,

    /// Typical flight duration in minutes
    pub min: u32,
}

/// An airport node with its outgoing routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub city_name: Option<String>,
    pub continent: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub display_name: Option<String>,

    /// Elevation; absent when the source gives nothing or zero
    pub elevation: Option<i64>,

    pub iata: Option<String>,
    pub icao: Option<String>,

    /// Latitude as published by the source (decimal degrees)
    pub latitude: Option<String>,

    /// Longitude as published by the source (decimal degrees)
    pub longitude: Option<String>,

    pub name: Option<String>,

    #[serde(default)]
    pub routes: Vec<Route>,

    pub timezone: Option<String>,
}
