//! Builders for airport destination pages used across crawler tests

use serde_json::{json, Value};

pub(crate) fn airport_json(code: &str, lat: f64, lon: f64) -> Value {
    json!({
        "IATA": code,
        "ICAO": format!("X{}", code),
        "city_name": format!("{} City", code),
        "continent": "EU",
        "country": "Testland",
        "country_code": "TL",
        "display_name": format!("{} International ({})", code, code),
        "elevation": "120",
        "latitude": lat.to_string(),
        "longitude": lon.to_string(),
        "name": format!("{} International", code),
        "timezone": "Europe/Test",
        "popularity": 7
    })
}

/// An `airlineroutes` entry; passenger flags use the source's "1"/"0" strings
pub(crate) fn airline(iata: &str, name: &str, active: bool, scheduled: bool, charter: bool) -> Value {
    let flag = |set: bool| if set { "1" } else { "0" };
    json!({
        "airline": {
            "IATA": iata,
            "name": name,
            "active": active,
            "is_scheduled_passenger": flag(scheduled),
            "is_nonscheduled_passenger": flag(charter),
            "is_cargo": "0"
        }
    })
}

pub(crate) fn passenger_airline(iata: &str, name: &str) -> Value {
    airline(iata, name, true, true, false)
}

pub(crate) fn route_json(dest: &str, lat: f64, lon: f64, minutes: u32, airlines: Vec<Value>) -> Value {
    json!({
        "iata_from": "ORIGIN",
        "iata_to": dest,
        "common_duration": minutes.to_string(),
        "airport": {
            "IATA": dest,
            "latitude": lat.to_string(),
            "longitude": lon.to_string()
        },
        "airlineroutes": airlines
    })
}

/// Renders a destinations page the way the source embeds its metadata
pub(crate) fn page_html(airport: &Value, routes: &[Value]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Flights from {code}</title>
<script src="/js/app.js"></script>
<script>window.dataLayer = window.dataLayer || [];</script>
<script>
window.airport = {airport};
window.routes = {routes};
window.locale = "en";
</script>
</head>
<body><div id="app"></div></body>
</html>"#,
        code = airport["IATA"].as_str().unwrap_or_default(),
        airport = airport,
        routes = Value::Array(routes.to_vec()),
    )
}
