//! Output module for writing crawl results and summaries
//!
//! This module handles:
//! - Writing the airports and carriers JSON files
//! - Building and printing the run summary

mod json_output;
pub mod stats;
mod traits;

pub use json_output::{read_airports, read_carriers, write_json_file, JsonFileSink};
pub use stats::{print_summary, summarize};
pub use traits::{CrawlSummary, OutputError, OutputResult, ResultSink};
