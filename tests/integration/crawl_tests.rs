//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the remote source and drive the
//! full bootstrap → crawl → output pipeline end-to-end. Most of them go
//! through a fetcher that talks to the mock server directly and ignores the
//! proxy it is handed.

use route_ripple::config::{load_config, Config, CrawlerConfig, OutputConfig, ProxyScheme, SourceConfig};
use route_ripple::crawler::{
    parse_proxy_list, run_crawl_with, FetchError, PageFetcher, ProxiedHttpFetcher, ProxyEndpoint,
    ProxyPool,
};
use route_ripple::output::{read_airports, read_carriers, JsonFileSink};
use route_ripple::{AirportCode, RippleError};
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetches straight from the mock server, ignoring the proxy
struct DirectFetcher {
    client: reqwest::Client,
}

impl DirectFetcher {
    fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .no_proxy()
                .build()
                .expect("client builds"),
        }
    }
}

impl PageFetcher for DirectFetcher {
    async fn fetch(&self, url: &str, proxy: &ProxyEndpoint) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                proxy: proxy.to_string(),
                error: e.to_string(),
            })?;

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            error: e.to_string(),
        })
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, out: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_fetches: 8,
            rotation_attempts: 1,
            retry_delay_ms: 5, // Very short for testing
            ..CrawlerConfig::default()
        },
        source: SourceConfig {
            base_url: base_url.to_string(),
            ..SourceConfig::default()
        },
        output: OutputConfig {
            airports_path: out.path().join("airline_routes.json").display().to_string(),
            carriers_path: out.path().join("airline_mapping.json").display().to_string(),
        },
        ..Config::default()
    }
}

fn test_pool() -> ProxyPool {
    parse_proxy_list("10.0.0.1:1080\n10.0.0.2:1080\n").expect("valid proxy list")
}

fn airport_list(codes: &[&str]) -> String {
    let airports: Vec<Value> = codes
        .iter()
        .map(|code| json!({"IATA": code, "name": format!("{} International", code)}))
        .collect();
    json!({"response": {"airports": airports}}).to_string()
}

fn airline(iata: &str, name: &str) -> Value {
    json!({"airline": {
        "IATA": iata,
        "name": name,
        "active": true,
        "is_scheduled_passenger": "1",
        "is_nonscheduled_passenger": "0"
    }})
}

fn route(dest: &str, lat: f64, lon: f64, minutes: u32, airlines: Vec<Value>) -> Value {
    json!({
        "iata_to": dest,
        "common_duration": minutes.to_string(),
        "airport": {"IATA": dest, "latitude": lat.to_string(), "longitude": lon.to_string()},
        "airlineroutes": airlines
    })
}

fn destinations_page(code: &str, lat: f64, lon: f64, routes: Vec<Value>) -> String {
    let airport = json!({
        "IATA": code,
        "ICAO": format!("X{}", code),
        "city_name": format!("{} City", code),
        "continent": "EU",
        "country": "Testland",
        "country_code": "TL",
        "display_name": format!("{} International ({})", code, code),
        "elevation": "35",
        "latitude": lat.to_string(),
        "longitude": lon.to_string(),
        "name": format!("{} International", code),
        "timezone": "Europe/Test"
    });

    format!(
        "<html><head><script>window.dataLayer = [];</script>\
         <script>window.airport = {};\nwindow.routes = {};\nwindow.locale = \"en\";</script>\
         </head><body></body></html>",
        airport,
        Value::Array(routes)
    )
}

async fn mount_page(server: &MockServer, route_path: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts the three-airport graph AAA → {BBB, CCC}, BBB → AAA
async fn mount_hub_graph(server: &MockServer) {
    mount_page(server, "/airports", airport_list(&["AAA"]), 1).await;
    mount_page(
        server,
        "/AAA/destinations",
        destinations_page(
            "AAA",
            0.0,
            0.0,
            vec![
                route("BBB", 0.0, 1.0, 40, vec![airline("XA", "Xair")]),
                route("CCC", 1.0, 0.0, 45, vec![airline("YB", "Ybird")]),
            ],
        ),
        1,
    )
    .await;
    mount_page(
        server,
        "/BBB/destinations",
        destinations_page("BBB", 0.0, 1.0, vec![route("AAA", 0.0, 0.0, 40, vec![airline("XA", "Xair")])]),
        1,
    )
    .await;
    mount_page(server, "/CCC/destinations", destinations_page("CCC", 1.0, 0.0, vec![]), 1).await;
}

#[tokio::test]
async fn test_full_crawl_writes_graph() {
    let server = MockServer::start().await;
    mount_hub_graph(&server).await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &out);
    let sink = JsonFileSink::from_config(&config.output);

    let summary = run_crawl_with(&config, DirectFetcher::new(), test_pool(), &sink)
        .await
        .expect("crawl succeeds");

    assert_eq!(summary.airports, 3);
    assert_eq!(summary.routes, 3);
    assert_eq!(summary.carriers, 2);
    assert_eq!(summary.known_total, 1);
    assert!(summary.abandoned.is_empty());

    let airports = read_airports(sink.airports_path()).unwrap();
    let keys: Vec<&str> = airports.keys().map(|c| c.as_str()).collect();
    assert_eq!(keys, vec!["AAA", "BBB", "CCC"]);

    let hub = &airports[&AirportCode::from("AAA")];
    assert_eq!(hub.routes.len(), 2);
    assert_eq!(hub.elevation, Some(35));
    assert_eq!(hub.icao.as_deref(), Some("XAAA"));

    let to_bbb = hub.routes.iter().find(|r| r.iata.as_str() == "BBB").unwrap();
    assert_eq!(to_bbb.km, 111);
    assert_eq!(to_bbb.min, 40);
    assert_eq!(to_bbb.carriers[0].name.as_deref(), Some("Xair"));

    let carriers = read_carriers(sink.carriers_path()).unwrap();
    assert_eq!(carriers.len(), 2);
    assert_eq!(carriers["XA"], "Xair");
    assert_eq!(carriers["YB"], "Ybird");
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let server = MockServer::start().await;
    mount_hub_graph(&server).await;

    let out = TempDir::new().unwrap();
    let routes_path = out.path().join("routes.json");
    let mapping_path = out.path().join("mapping.json");

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[crawler]
max-concurrent-fetches = 2
rotation-attempts = 1
retry-delay-ms = 5

[source]
base-url = "{}"

[output]
airports-path = "{}"
carriers-path = "{}"
"#,
        server.uri(),
        routes_path.display(),
        mapping_path.display()
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let sink = JsonFileSink::from_config(&config.output);

    run_crawl_with(&config, DirectFetcher::new(), test_pool(), &sink)
        .await
        .unwrap();

    assert_eq!(read_airports(&routes_path).unwrap().len(), 3);
    let mapping = std::fs::read_to_string(&mapping_path).unwrap();
    assert_eq!(mapping, "{\"XA\":\"Xair\",\"YB\":\"Ybird\"}\n");
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let server = MockServer::start().await;
    mount_page(&server, "/airports", airport_list(&["AAA"]), 1).await;

    // Five bad responses first: blocked pages and server errors
    Mock::given(method("GET"))
        .and(path("/AAA/destinations"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>Please wait...</html>"))
        .up_to_n_times(5)
        .expect(5)
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/AAA/destinations",
        destinations_page("AAA", 0.0, 0.0, vec![]),
        1,
    )
    .await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &out);
    let sink = JsonFileSink::from_config(&config.output);

    let summary = run_crawl_with(&config, DirectFetcher::new(), test_pool(), &sink)
        .await
        .unwrap();

    assert_eq!(summary.airports, 1);
    assert!(summary.abandoned.is_empty());

    let airports = read_airports(sink.airports_path()).unwrap();
    let aaa = &airports[&AirportCode::from("AAA")];
    assert_eq!(aaa.name.as_deref(), Some("AAA International"));
    assert!(aaa.routes.is_empty());
}

#[tokio::test]
async fn test_bounded_detail_attempts_abandon_broken_airport() {
    let server = MockServer::start().await;
    mount_page(&server, "/airports", airport_list(&["AAA", "BRK"]), 1).await;
    mount_page(&server, "/AAA/destinations", destinations_page("AAA", 0.0, 0.0, vec![]), 1).await;
    mount_page(&server, "/BRK/destinations", "<html>gone</html>".to_string(), 3).await;

    let out = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &out);
    config.crawler.max_detail_attempts = Some(3);
    let sink = JsonFileSink::from_config(&config.output);

    let summary = run_crawl_with(&config, DirectFetcher::new(), test_pool(), &sink)
        .await
        .unwrap();

    assert_eq!(summary.airports, 1);
    assert_eq!(summary.known_total, 2);
    assert_eq!(summary.abandoned, vec!["BRK".to_string()]);

    let airports = read_airports(sink.airports_path()).unwrap();
    assert!(!airports.contains_key(&AirportCode::from("BRK")));
}

#[tokio::test]
async fn test_bootstrap_exhaustion_is_fatal() {
    let server = MockServer::start().await;
    // Never reached: every request goes through a dead proxy
    mount_page(&server, "/airports", airport_list(&["AAA"]), 0).await;

    let out = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &out);
    config.crawler.request_timeout_secs = 5;
    config.proxies.scheme = ProxyScheme::Http;
    let sink = JsonFileSink::from_config(&config.output);

    let pool = parse_proxy_list("127.0.0.1:1\n").unwrap();
    let fetcher = ProxiedHttpFetcher::new(
        &pool,
        &config.identity,
        config.proxies.scheme,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )
    .unwrap();

    let result = run_crawl_with(&config, fetcher, pool, &sink).await;

    match result {
        Err(RippleError::Bootstrap {
            source: FetchError::AllRetriesExhausted { attempts, .. },
            ..
        }) => assert_eq!(attempts, 3),
        other => panic!("expected bootstrap failure, got {:?}", other.map(|s| s.airports)),
    }
    assert!(!sink.airports_path().exists());
    assert!(!sink.carriers_path().exists());
}

#[tokio::test]
async fn test_invalid_airport_list_is_fatal() {
    let server = MockServer::start().await;
    mount_page(&server, "/airports", "<html>Access denied</html>".to_string(), 1).await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &out);
    let sink = JsonFileSink::from_config(&config.output);

    let result = run_crawl_with(&config, DirectFetcher::new(), test_pool(), &sink).await;

    assert!(matches!(result, Err(RippleError::BootstrapPayload { .. })));
    assert!(!sink.airports_path().exists());
}

#[tokio::test]
async fn test_empty_airport_list_writes_empty_files() {
    let server = MockServer::start().await;
    mount_page(&server, "/airports", airport_list(&[]), 1).await;

    let out = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &out);
    let sink = JsonFileSink::from_config(&config.output);

    let summary = run_crawl_with(&config, DirectFetcher::new(), test_pool(), &sink)
        .await
        .unwrap();

    assert_eq!(summary.airports, 0);
    assert_eq!(std::fs::read_to_string(sink.airports_path()).unwrap(), "{}\n");
    assert_eq!(std::fs::read_to_string(sink.carriers_path()).unwrap(), "{}\n");
}
