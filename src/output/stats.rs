//! Run summary generation
//!
//! Builds the `CrawlSummary` for a finished crawl and prints it.

use crate::crawler::CrawlResults;
use crate::output::traits::CrawlSummary;
use chrono::{DateTime, Utc};

/// Builds a summary from the crawl results and its time span
pub fn summarize(
    results: &CrawlResults,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> CrawlSummary {
    CrawlSummary {
        started_at,
        finished_at,
        config_hash: None,
        airports: results.airports.len(),
        routes: results.route_count(),
        carriers: results.carriers.len(),
        known_total: results.known_total,
        abandoned: results
            .abandoned
            .iter()
            .map(|code| code.to_string())
            .collect(),
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    if let Some(hash) = &summary.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!();

    println!("Graph:");
    println!(
        "  Airports: {} of {} listed ({:.1}%)",
        summary.airports,
        summary.known_total,
        summary.coverage()
    );
    println!("  Routes: {}", summary.routes);
    println!("  Airlines: {}", summary.carriers);
    println!();

    if !summary.abandoned.is_empty() {
        println!("Abandoned Airports ({}):", summary.abandoned.len());
        for code in &summary.abandoned {
            println!("  - {}", code);
        }
        println!();
    }
}
