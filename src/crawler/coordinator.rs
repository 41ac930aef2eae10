//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator task owns every piece of mutable crawl state: the
//! frontier, the airports map and the carrier map. Workers are tokio tasks in
//! a `JoinSet`; each runs one fetch-extract cycle for one code and hands its
//! result back by value. The coordinator merges results one at a time as they
//! complete and refills the worker set from the frontier until nothing is
//! queued and nothing is in flight.

use crate::config::CrawlerConfig;
use crate::crawler::extractor::AirportPage;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::frontier::{Dispatch, Frontier};
use crate::crawler::proxy::ProxyPool;
use crate::crawler::retry::{fetch_airport_until_parsed, DetailRetryPolicy};
use crate::graph::{Airport, AirportCode, CarrierMap};
use crate::source::SourceEndpoints;
use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

/// How a worker's fetch of one code ended
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The page parsed
    Fetched(AirportPage),

    /// The bounded detail policy ran out of attempts
    GaveUp,

    /// The worker panicked; carries the panic message
    Panicked(String),
}

/// A worker's result, sent back to the coordinator through the join set
#[derive(Debug)]
pub struct WorkerReport {
    pub code: AirportCode,
    pub outcome: WorkerOutcome,
}

/// Everything a finished crawl produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlResults {
    /// Airport code → airport record
    pub airports: BTreeMap<AirportCode, Airport>,

    /// Carrier code → carrier name
    pub carriers: CarrierMap,

    /// Codes dropped without data
    pub abandoned: BTreeSet<AirportCode>,

    /// Size of the seed set from the airport list
    pub known_total: usize,
}

impl CrawlResults {
    /// Total number of route edges across all airports
    pub fn route_count(&self) -> usize {
        self.airports.values().map(|a| a.routes.len()).sum()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<F> {
    fetcher: Arc<F>,
    pool: Arc<ProxyPool>,
    endpoints: Arc<SourceEndpoints>,
    policy: DetailRetryPolicy,
    frontier: Frontier,
    airports: BTreeMap<AirportCode, Airport>,
    carriers: CarrierMap,
    known_total: usize,
}

impl<F: PageFetcher + 'static> Coordinator<F> {
    /// Creates a coordinator with an empty frontier
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Transport shared by every worker
    /// * `pool` - Proxies drawn from on every attempt
    /// * `endpoints` - Where airport pages live
    /// * `config` - Concurrency limit and detail retry settings
    pub fn new(
        fetcher: Arc<F>,
        pool: Arc<ProxyPool>,
        endpoints: Arc<SourceEndpoints>,
        config: &CrawlerConfig,
    ) -> Self {
        Self {
            fetcher,
            pool,
            endpoints,
            policy: DetailRetryPolicy::from_config(config),
            frontier: Frontier::new(config.max_concurrent_fetches as usize),
            airports: BTreeMap::new(),
            carriers: CarrierMap::new(),
            known_total: 0,
        }
    }

    /// Queues the seed codes
    ///
    /// # Returns
    ///
    /// The number of codes newly queued
    pub fn seed<I>(&mut self, codes: I) -> usize
    where
        I: IntoIterator<Item = AirportCode>,
    {
        let queued = codes
            .into_iter()
            .filter(|code| self.frontier.enqueue(code.clone()))
            .count();
        self.known_total += queued;
        queued
    }

    /// Runs the crawl until the frontier is exhausted
    ///
    /// Never fails: per-airport failures are retried inside the workers, and
    /// a worker that panics only loses its own code.
    pub async fn run(mut self) -> CrawlResults {
        tracing::info!(
            seeds = self.frontier.queued_len(),
            detail_retry = %self.policy_summary(),
            "Starting crawl"
        );

        let mut workers: JoinSet<WorkerReport> = JoinSet::new();

        loop {
            while let Some(dispatch) = self.frontier.next_dispatch() {
                self.spawn_worker(&mut workers, dispatch);
            }

            // Every permit is back once the set drains, so an empty set here
            // also means an empty queue.
            match workers.join_next().await {
                Some(Ok(report)) => self.merge(report),
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Worker task failed to join");
                }
                None => break,
            }
        }

        if !self.frontier.is_settled() {
            tracing::error!(
                queued = self.frontier.queued_len(),
                in_flight = self.frontier.in_flight_len(),
                "Crawl stopped with unsettled codes"
            );
        }

        let abandoned: BTreeSet<AirportCode> = self.frontier.abandoned_codes().cloned().collect();

        tracing::info!(
            done = self.frontier.done_len(),
            abandoned = self.frontier.abandoned_len(),
            "Completed! Processed {}/{} airports and {} airlines",
            self.airports.len(),
            self.known_total,
            self.carriers.len()
        );

        CrawlResults {
            airports: self.airports,
            carriers: self.carriers,
            abandoned,
            known_total: self.known_total,
        }
    }

    fn policy_summary(&self) -> String {
        match self.policy.max_attempts {
            Some(max) => format!("bounded({})", max),
            None => "unbounded".to_string(),
        }
    }

    fn spawn_worker(&self, workers: &mut JoinSet<WorkerReport>, dispatch: Dispatch) {
        let Dispatch { code, permit } = dispatch;
        let fetcher = Arc::clone(&self.fetcher);
        let pool = Arc::clone(&self.pool);
        let policy = self.policy.clone();
        let url = self.endpoints.destinations_url(&code);

        tracing::debug!(%code, %url, "Fetching airport");

        workers.spawn(async move {
            let fetch =
                fetch_airport_until_parsed(fetcher.as_ref(), &pool, &code, url.as_str(), &policy);

            let outcome = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(Some(page)) => WorkerOutcome::Fetched(page),
                Ok(None) => WorkerOutcome::GaveUp,
                Err(panic) => WorkerOutcome::Panicked(panic_message(panic.as_ref())),
            };

            // Free the slot before reporting so the coordinator can refill.
            drop(permit);
            WorkerReport { code, outcome }
        });
    }

    /// Folds one worker result into the accumulators
    fn merge(&mut self, report: WorkerReport) {
        let WorkerReport { code, outcome } = report;

        match outcome {
            WorkerOutcome::Fetched(page) => {
                if !self.frontier.complete(&code) {
                    return;
                }

                let AirportPage {
                    airport,
                    carriers,
                    destinations,
                } = page;

                for (iata, name) in carriers {
                    if let Some(previous) = self.carriers.get(&iata) {
                        if *previous != name {
                            tracing::debug!(
                                carrier = %iata,
                                previous = %previous,
                                name = %name,
                                "Carrier name changed"
                            );
                        }
                    }
                    self.carriers.insert(iata, name);
                }

                let discovered = destinations
                    .into_iter()
                    .filter(|dest| self.frontier.enqueue(dest.clone()))
                    .count();

                let routes = airport.routes.len();
                self.airports.insert(code.clone(), airport);

                tracing::info!(
                    routes,
                    discovered,
                    "Completed {} ({}/{})",
                    code,
                    self.frontier.visited_len(),
                    self.frontier.seen_len()
                );
            }
            WorkerOutcome::GaveUp => {
                self.frontier.abandon(&code);
                tracing::error!(%code, "Abandoning airport after exhausting retries");
            }
            WorkerOutcome::Panicked(message) => {
                self.frontier.abandon(&code);
                tracing::error!(%code, panic = %message, "Worker failed unexpectedly, abandoning airport");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchError;
    use crate::crawler::fixtures::{airline, airport_json, page_html, passenger_airline, route_json};
    use crate::crawler::proxy::ProxyEndpoint;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const BASE: &str = "https://source.test";

    /// Serves canned pages by URL and records traffic
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, String>,
        panics_on: Option<String>,
        calls: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        fn with_page(mut self, code: &str, body: String) -> Self {
            self.pages.insert(url_for(code), body);
            self
        }

        fn panicking_on(mut self, code: &str) -> Self {
            self.panics_on = Some(url_for(code));
            self
        }

        fn calls_for(&self, code: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .get(&url_for(code))
                .copied()
                .unwrap_or(0)
        }
    }

    impl PageFetcher for FakeSource {
        async fn fetch(&self, url: &str, _proxy: &ProxyEndpoint) -> Result<String, FetchError> {
            *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panics_on.as_deref() == Some(url) {
                panic!("extraction blew up for {}", url);
            }

            self.pages.get(url).cloned().ok_or_else(|| FetchError::Network {
                url: url.to_string(),
                proxy: "fake".to_string(),
                error: "Connection failed".to_string(),
            })
        }
    }

    fn url_for(code: &str) -> String {
        format!("{}/{}/destinations", BASE, code)
    }

    fn leaf_page(code: &str) -> String {
        page_html(&airport_json(code, 1.0, 1.0), &[])
    }

    fn coordinator(source: FakeSource, max_in_flight: u32) -> Coordinator<FakeSource> {
        let pool = ProxyPool::new(vec![ProxyEndpoint::parse("10.0.0.1:1080").unwrap()]).unwrap();
        let endpoints = SourceEndpoints::new(BASE, "airports", "{code}/destinations").unwrap();
        let config = CrawlerConfig {
            max_concurrent_fetches: max_in_flight,
            rotation_attempts: 1,
            retry_delay_ms: 1,
            max_detail_attempts: Some(2),
            ..CrawlerConfig::default()
        };
        Coordinator::new(Arc::new(source), Arc::new(pool), Arc::new(endpoints), &config)
    }

    fn codes(list: &[&str]) -> Vec<AirportCode> {
        list.iter().map(|c| AirportCode::from(*c)).collect()
    }

    fn hub_source() -> FakeSource {
        let hub = page_html(
            &airport_json("AAA", 0.0, 0.0),
            &[
                route_json("BBB", 0.0, 1.0, 40, vec![passenger_airline("XA", "Xair")]),
                route_json("CCC", 1.0, 0.0, 45, vec![passenger_airline("YB", "Ybird")]),
            ],
        );
        let back_to_hub = page_html(
            &airport_json("BBB", 0.0, 1.0),
            &[route_json("AAA", 0.0, 0.0, 40, vec![passenger_airline("XA", "Xair")])],
        );

        FakeSource::default()
            .with_page("AAA", hub)
            .with_page("BBB", back_to_hub)
            .with_page("CCC", leaf_page("CCC"))
    }

    #[tokio::test]
    async fn test_crawl_discovers_destinations() {
        let mut coordinator = coordinator(hub_source(), 8);
        assert_eq!(coordinator.seed(codes(&["AAA"])), 1);

        let results = coordinator.run().await;

        let keys: Vec<&str> = results.airports.keys().map(|c| c.as_str()).collect();
        assert_eq!(keys, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(results.airports[&AirportCode::from("AAA")].routes.len(), 2);
        assert_eq!(results.route_count(), 3);
        assert_eq!(results.carriers.len(), 2);
        assert_eq!(results.carriers["XA"], "Xair");
        assert_eq!(results.carriers["YB"], "Ybird");
        assert!(results.abandoned.is_empty());
        assert_eq!(results.known_total, 1);
    }

    #[tokio::test]
    async fn test_each_code_fetched_once() {
        let source = Arc::new(hub_source());
        let pool = ProxyPool::new(vec![ProxyEndpoint::parse("10.0.0.1:1080").unwrap()]).unwrap();
        let endpoints = SourceEndpoints::new(BASE, "airports", "{code}/destinations").unwrap();
        let mut coordinator = Coordinator::new(
            Arc::clone(&source),
            Arc::new(pool),
            Arc::new(endpoints),
            &CrawlerConfig::default(),
        );
        coordinator.seed(codes(&["AAA", "BBB", "AAA"]));

        let results = coordinator.run().await;

        assert_eq!(results.airports.len(), 3);
        assert_eq!(results.known_total, 2);
        for code in ["AAA", "BBB", "CCC"] {
            assert_eq!(source.calls_for(code), 1, "{} fetched more than once", code);
        }
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let names: Vec<String> = (0..30).map(|i| format!("A{:02}", i)).collect();
        let mut source = FakeSource::default();
        for name in &names {
            source = source.with_page(name, leaf_page(name));
        }
        let source = Arc::new(source);

        let pool = ProxyPool::new(vec![ProxyEndpoint::parse("10.0.0.1:1080").unwrap()]).unwrap();
        let endpoints = SourceEndpoints::new(BASE, "airports", "{code}/destinations").unwrap();
        let config = CrawlerConfig {
            max_concurrent_fetches: 4,
            ..CrawlerConfig::default()
        };
        let mut coordinator =
            Coordinator::new(Arc::clone(&source), Arc::new(pool), Arc::new(endpoints), &config);
        coordinator.seed(names.iter().map(|n| AirportCode::from(n.as_str())));

        let results = coordinator.run().await;

        assert_eq!(results.airports.len(), 30);
        let peak = source.max_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak in-flight was {}", peak);
        assert!(peak >= 2, "fetches never overlapped");
    }

    #[tokio::test]
    async fn test_panicking_worker_abandons_code() {
        let source = hub_source().panicking_on("CCC");
        let mut coordinator = coordinator(source, 8);
        coordinator.seed(codes(&["AAA"]));

        let results = coordinator.run().await;

        let keys: Vec<&str> = results.airports.keys().map(|c| c.as_str()).collect();
        assert_eq!(keys, vec!["AAA", "BBB"]);
        assert_eq!(
            results.abandoned.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            vec!["CCC"]
        );
        // The route to the abandoned code is still recorded on its origin.
        assert_eq!(results.airports[&AirportCode::from("AAA")].routes.len(), 2);
    }

    #[tokio::test]
    async fn test_bounded_policy_abandons_unreachable_code() {
        let hub = page_html(
            &airport_json("AAA", 0.0, 0.0),
            &[route_json("ZZZ", 0.0, 1.0, 30, vec![passenger_airline("XA", "Xair")])],
        );
        let source = FakeSource::default().with_page("AAA", hub);
        let mut coordinator = coordinator(source, 8);
        coordinator.seed(codes(&["AAA"]));

        let results = coordinator.run().await;

        assert_eq!(results.airports.len(), 1);
        assert!(results.abandoned.contains(&AirportCode::from("ZZZ")));
    }

    #[tokio::test]
    async fn test_non_passenger_carriers_stay_out_of_mapping() {
        let hub = page_html(
            &airport_json("AAA", 0.0, 0.0),
            &[route_json(
                "BBB",
                0.0,
                1.0,
                40,
                vec![
                    passenger_airline("XA", "Xair"),
                    airline("CG", "Cargo Only", true, false, false),
                    airline("OL", "Old Line", false, true, false),
                ],
            )],
        );
        let source = FakeSource::default()
            .with_page("AAA", hub)
            .with_page("BBB", leaf_page("BBB"));
        let mut coordinator = coordinator(source, 8);
        coordinator.seed(codes(&["AAA"]));

        let results = coordinator.run().await;

        assert_eq!(results.carriers.keys().collect::<Vec<_>>(), vec!["XA"]);
        let route = &results.airports[&AirportCode::from("AAA")].routes[0];
        assert_eq!(route.carriers.len(), 1);
    }

    #[tokio::test]
    async fn test_carrier_name_from_later_page_wins() {
        let first = page_html(
            &airport_json("AAA", 0.0, 0.0),
            &[route_json("BBB", 0.0, 1.0, 40, vec![passenger_airline("XA", "Xair")])],
        );
        let second = page_html(
            &airport_json("BBB", 0.0, 1.0),
            &[route_json("AAA", 0.0, 0.0, 40, vec![passenger_airline("XA", "Xair Renamed")])],
        );
        let source = FakeSource::default()
            .with_page("AAA", first)
            .with_page("BBB", second);

        // One permit: BBB is only discovered, and so merged, after AAA.
        let mut coordinator = coordinator(source, 1);
        coordinator.seed(codes(&["AAA"]));

        let results = coordinator.run().await;

        assert_eq!(results.airports.len(), 2);
        assert_eq!(results.carriers.len(), 1);
        assert_eq!(results.carriers["XA"], "Xair Renamed");
        let aaa_route = &results.airports[&AirportCode::from("AAA")].routes[0];
        assert_eq!(aaa_route.carriers[0].name.as_deref(), Some("Xair"));
    }

    #[tokio::test]
    async fn test_empty_seed_set_finishes_immediately() {
        let coordinator = coordinator(FakeSource::default(), 8);
        let results = coordinator.run().await;
        assert_eq!(results, CrawlResults::default());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");

        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
