//! Output sink traits and types
//!
//! This module defines the trait interface for result sinks and the
//! summary record describing a finished crawl.

use crate::graph::{Airport, AirportCode, CarrierMap};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    // Run metadata
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: Option<String>,

    // Graph size
    pub airports: usize,
    pub routes: usize,
    pub carriers: usize,

    /// Seed codes from the airport list
    pub known_total: usize,

    /// Codes dropped without data, sorted
    pub abandoned: Vec<String>,
}

impl CrawlSummary {
    /// Wall-clock duration of the crawl in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Airports fetched as a percentage of the known total
    ///
    /// Can exceed 100 when the crawl discovers codes missing from the list.
    pub fn coverage(&self) -> f64 {
        if self.known_total == 0 {
            return 0.0;
        }
        (self.airports as f64 / self.known_total as f64) * 100.0
    }
}

/// Trait for result sinks
///
/// A sink receives the final airports and carriers maps exactly once, after
/// the crawl has settled.
pub trait ResultSink {
    /// Writes the airport graph and the carrier mapping
    ///
    /// # Arguments
    ///
    /// * `airports` - Airport code → airport record
    /// * `carriers` - Carrier code → carrier name
    fn write(
        &self,
        airports: &BTreeMap<AirportCode, Airport>,
        carriers: &CarrierMap,
    ) -> OutputResult<()>;
}
