//! Airport page extractor
//!
//! Destination pages carry their data in one inline script made of
//! `window.<key> = <json>;` assignments. This module:
//! - locates that script (the one mentioning `window.airport`)
//! - walks its `window.<key> = <json>` assignments, decoding one JSON value
//!   per key
//! - picks out the `airport` and `routes` payloads
//! - projects them into an `Airport` with its `Route`s and `Carrier`s
//!
//! Any missing or malformed field is an `ExtractionError`; the caller treats
//! every extraction error as transient and retries the page.

use crate::graph::{great_circle_km, Airport, AirportCode, Carrier, CarrierMap, GeoPoint, Route};
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Text that identifies the metadata script
pub const METADATA_MARKER: &str = "window.airport";

/// Prefix of every assignment inside the metadata script
const ASSIGNMENT_PREFIX: &str = "window.";

/// Errors raised while extracting an airport page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No script block contains window.airport")]
    MetadataNotFound,

    #[error("{0} script blocks contain window.airport, expected exactly one")]
    AmbiguousMetadata(usize),

    #[error("Metadata has no `{0}` assignment")]
    MissingAssignment(&'static str),

    #[error("Invalid JSON in `{key}` assignment: {source}")]
    Json {
        key: &'static str,
        source: serde_json::Error,
    },

    #[error("Expected `{key}` to be {expected}")]
    UnexpectedShape {
        key: String,
        expected: &'static str,
    },

    #[error("Missing field `{field}` in {context}")]
    MissingField {
        context: String,
        field: &'static str,
    },

    #[error("Invalid field `{field}` in {context}: {message}")]
    InvalidField {
        context: String,
        field: &'static str,
        message: String,
    },
}

/// Result type for extraction
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Everything one destinations page contributes to the graph
#[derive(Debug, Clone, PartialEq)]
pub struct AirportPage {
    /// The airport, with its outgoing routes
    pub airport: Airport,

    /// Carriers observed on this page that belong in the global mapping
    pub carriers: CarrierMap,

    /// Destination code of every route, in route order
    pub destinations: Vec<AirportCode>,
}

/// Extracts an airport page from a raw HTML body
///
/// # Example
///
/// ```no_run
/// use route_ripple::crawler::extract_airport_page;
///
/// # let body = String::new();
/// let page = extract_airport_page(&body).unwrap();
/// println!("{} routes", page.airport.routes.len());
/// ```
pub fn extract_airport_page(body: &str) -> ExtractionResult<AirportPage> {
    let script = locate_metadata_script(body)?;
    let mut assignments: HashMap<&str, serde_json::Result<Value>> =
        parse_assignments(&script).into_iter().collect();

    let airport_value = decode_assignment(&mut assignments, "airport")?;
    let routes_value = decode_assignment(&mut assignments, "routes")?;

    let airport_fields = airport_value
        .as_object()
        .ok_or_else(|| ExtractionError::UnexpectedShape {
            key: "airport".to_string(),
            expected: "an object",
        })?;
    let route_entries = routes_value
        .as_array()
        .ok_or_else(|| ExtractionError::UnexpectedShape {
            key: "routes".to_string(),
            expected: "an array",
        })?;

    let mut airport = project_airport(airport_fields)?;
    let mut carriers = CarrierMap::new();
    let mut destinations = Vec::with_capacity(route_entries.len());

    if !route_entries.is_empty() {
        let origin = GeoPoint::new(
            parse_coordinate(airport.latitude.as_deref(), "latitude", "airport", 90.0)?,
            parse_coordinate(airport.longitude.as_deref(), "longitude", "airport", 180.0)?,
        );

        for (index, entry) in route_entries.iter().enumerate() {
            let route = project_route(entry, index, origin, &mut carriers)?;
            destinations.push(route.iata.clone());
            airport.routes.push(route);
        }
    }

    tracing::trace!(
        routes = airport.routes.len(),
        carriers = carriers.len(),
        "Extracted airport page"
    );

    Ok(AirportPage {
        airport,
        carriers,
        destinations,
    })
}

/// Finds the text of the single script block containing the metadata marker
fn locate_metadata_script(body: &str) -> ExtractionResult<String> {
    let document = Html::parse_document(body);
    let Ok(selector) = Selector::parse("script") else {
        return Err(ExtractionError::MetadataNotFound);
    };

    let mut matches: Vec<String> = document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .filter(|text| text.contains(METADATA_MARKER))
        .collect();

    match matches.len() {
        0 => Err(ExtractionError::MetadataNotFound),
        1 => Ok(matches.remove(0)),
        n => Err(ExtractionError::AmbiguousMetadata(n)),
    }
}

/// Parses a metadata script into `(key, value)` assignments
///
/// Each `window.<key> =` is followed by exactly one JSON value, decoded in
/// place; scanning resumes after the value, so text inside JSON strings is
/// never mistaken for another assignment. A payload that is not JSON (for
/// example `window.dataLayer || []`) yields an `Err` for its key and scanning
/// resumes right after the `=`.
pub fn parse_assignments(script: &str) -> Vec<(&str, serde_json::Result<Value>)> {
    let mut assignments = Vec::new();
    let mut rest = script;

    while let Some(start) = rest.find(ASSIGNMENT_PREFIX) {
        let after = &rest[start + ASSIGNMENT_PREFIX.len()..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(after.len());
        let (key, tail) = after.split_at(key_len);

        let Some(payload) = tail.trim_start().strip_prefix('=') else {
            rest = tail;
            continue;
        };
        if key.is_empty() || payload.starts_with('=') {
            rest = payload;
            continue;
        }

        let mut values = serde_json::Deserializer::from_str(payload).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) => {
                rest = &payload[values.byte_offset()..];
                assignments.push((key, Ok(value)));
            }
            Some(Err(e)) => {
                rest = payload;
                assignments.push((key, Err(e)));
            }
            None => rest = payload,
        }
    }

    assignments
}

fn decode_assignment(
    assignments: &mut HashMap<&str, serde_json::Result<Value>>,
    key: &'static str,
) -> ExtractionResult<Value> {
    assignments
        .remove(key)
        .ok_or(ExtractionError::MissingAssignment(key))?
        .map_err(|source| ExtractionError::Json { key, source })
}

fn project_airport(fields: &Map<String, Value>) -> ExtractionResult<Airport> {
    const CONTEXT: &str = "airport";

    Ok(Airport {
        city_name: text_field(fields, "city_name", CONTEXT)?,
        continent: text_field(fields, "continent", CONTEXT)?,
        country: text_field(fields, "country", CONTEXT)?,
        country_code: text_field(fields, "country_code", CONTEXT)?,
        display_name: text_field(fields, "display_name", CONTEXT)?,
        elevation: elevation_field(fields, CONTEXT)?,
        iata: text_field(fields, "IATA", CONTEXT)?,
        icao: text_field(fields, "ICAO", CONTEXT)?,
        latitude: text_field(fields, "latitude", CONTEXT)?,
        longitude: text_field(fields, "longitude", CONTEXT)?,
        name: text_field(fields, "name", CONTEXT)?,
        routes: Vec::new(),
        timezone: text_field(fields, "timezone", CONTEXT)?,
    })
}

fn project_route(
    entry: &Value,
    index: usize,
    origin: GeoPoint,
    carrier_map: &mut CarrierMap,
) -> ExtractionResult<Route> {
    let context = format!("routes[{}]", index);
    let fields = entry
        .as_object()
        .ok_or_else(|| ExtractionError::UnexpectedShape {
            key: context.clone(),
            expected: "an object",
        })?;

    let destination = match required(fields, "iata_to", &context)? {
        Value::String(code) if !code.is_empty() => AirportCode::from(code.as_str()),
        other => {
            return Err(invalid(
                &context,
                "iata_to",
                format!("expected a non-empty string, got {}", other),
            ))
        }
    };

    let dest_context = format!("{}.airport", context);
    let dest_fields = required(fields, "airport", &context)?
        .as_object()
        .ok_or_else(|| invalid(&context, "airport", "expected an object".to_string()))?;
    let dest_point = GeoPoint::new(
        parse_coordinate(
            text_field(dest_fields, "latitude", &dest_context)?.as_deref(),
            "latitude",
            &dest_context,
            90.0,
        )?,
        parse_coordinate(
            text_field(dest_fields, "longitude", &dest_context)?.as_deref(),
            "longitude",
            &dest_context,
            180.0,
        )?,
    );

    let minutes = integer_field(fields, "common_duration", &context)?;

    let airline_routes = required(fields, "airlineroutes", &context)?
        .as_array()
        .ok_or_else(|| invalid(&context, "airlineroutes", "expected an array".to_string()))?;

    let mut carriers = Vec::new();
    for (airline_index, airline_route) in airline_routes.iter().enumerate() {
        let airline_context = format!("{}.airlineroutes[{}]", context, airline_index);
        let airline = airline_route
            .get("airline")
            .ok_or_else(|| ExtractionError::MissingField {
                context: airline_context.clone(),
                field: "airline",
            })?
            .as_object()
            .ok_or_else(|| invalid(&airline_context, "airline", "expected an object".to_string()))?;

        if let Some(carrier) = qualifying_carrier(airline, &airline_context)? {
            if let Some((iata, name)) = carrier.mapping_entry() {
                if let Some(previous) = carrier_map.insert(iata.to_string(), name.to_string()) {
                    if previous != name {
                        tracing::debug!(
                            carrier = iata,
                            %previous,
                            current = name,
                            "Carrier name changed, keeping latest"
                        );
                    }
                }
            }
            carriers.push(carrier);
        }
    }

    Ok(Route {
        carriers,
        iata: destination,
        km: great_circle_km(origin, dest_point),
        min: minutes,
    })
}

/// Returns the carrier if it is an active passenger airline
///
/// Inactive airlines, and airlines flagged neither scheduled nor
/// non-scheduled passenger (cargo, charter-only), are filtered out.
fn qualifying_carrier(
    airline: &Map<String, Value>,
    context: &str,
) -> ExtractionResult<Option<Carrier>> {
    let active = is_flag_set(required(airline, "active", context)?);
    let scheduled = is_flag_set(required(airline, "is_scheduled_passenger", context)?);
    let charter = is_flag_set(required(airline, "is_nonscheduled_passenger", context)?);

    if !(active && (scheduled || charter)) {
        return Ok(None);
    }

    Ok(Some(Carrier {
        iata: text_field(airline, "IATA", context)?,
        name: text_field(airline, "name", context)?,
    }))
}

/// A flag is set when it is `"1"`, `1` or `true`
fn is_flag_set(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => s.trim() == "1",
        _ => false,
    }
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
    context: &str,
) -> ExtractionResult<&'a Value> {
    fields
        .get(field)
        .ok_or_else(|| ExtractionError::MissingField {
            context: context.to_string(),
            field,
        })
}

fn invalid(context: &str, field: &'static str, message: String) -> ExtractionError {
    ExtractionError::InvalidField {
        context: context.to_string(),
        field,
        message,
    }
}

/// Reads a text attribute; null becomes None, numbers become their decimal text
fn text_field(
    fields: &Map<String, Value>,
    field: &'static str,
    context: &str,
) -> ExtractionResult<Option<String>> {
    match required(fields, field, context)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(invalid(
            context,
            field,
            format!("expected text, got {}", other),
        )),
    }
}

/// Reads the elevation; null, empty and zero become None
fn elevation_field(fields: &Map<String, Value>, context: &str) -> ExtractionResult<Option<i64>> {
    let value = required(fields, "elevation", context)?;
    let elevation = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => parse_integer(s.trim()),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        _ => None,
    };

    match elevation {
        Some(0) => Ok(None),
        Some(feet) => Ok(Some(feet)),
        None => Err(invalid(
            context,
            "elevation",
            format!("expected an integer, got {}", value),
        )),
    }
}

/// Reads a non-negative integer given either as a number or as text
fn integer_field(
    fields: &Map<String, Value>,
    field: &'static str,
    context: &str,
) -> ExtractionResult<u32> {
    let value = required(fields, field, context)?;
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => parse_integer(s.trim()).and_then(|i| u64::try_from(i).ok()),
        _ => None,
    };

    parsed
        .and_then(|i| u32::try_from(i).ok())
        .ok_or_else(|| {
            invalid(
                context,
                field,
                format!("expected a non-negative integer, got {}", value),
            )
        })
}

fn parse_integer(text: &str) -> Option<i64> {
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

fn parse_coordinate(
    text: Option<&str>,
    field: &'static str,
    context: &str,
    limit: f64,
) -> ExtractionResult<f64> {
    let text = text.ok_or_else(|| invalid(context, field, "coordinate is null".to_string()))?;
    let degrees: f64 = text
        .trim()
        .parse()
        .map_err(|_| invalid(context, field, format!("'{}' is not a number", text)))?;

    if !degrees.is_finite() || degrees.abs() > limit {
        return Err(invalid(
            context,
            field,
            format!("{} is outside ±{}", degrees, limit),
        ));
    }

    Ok(degrees)
}
