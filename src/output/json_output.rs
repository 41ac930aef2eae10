//! JSON file output
//!
//! Writes the two result files: airport code → airport record, and carrier
//! code → carrier name. Both maps are ordered, so the files come out with
//! sorted keys on a single line followed by a newline.

use crate::config::OutputConfig;
use crate::graph::{Airport, AirportCode, CarrierMap};
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Result sink writing both maps as JSON files
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    airports_path: PathBuf,
    carriers_path: PathBuf,
}

impl JsonFileSink {
    pub fn new(airports_path: impl Into<PathBuf>, carriers_path: impl Into<PathBuf>) -> Self {
        Self {
            airports_path: airports_path.into(),
            carriers_path: carriers_path.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.airports_path, &config.carriers_path)
    }

    pub fn airports_path(&self) -> &Path {
        &self.airports_path
    }

    pub fn carriers_path(&self) -> &Path {
        &self.carriers_path
    }
}

impl ResultSink for JsonFileSink {
    fn write(
        &self,
        airports: &BTreeMap<AirportCode, Airport>,
        carriers: &CarrierMap,
    ) -> OutputResult<()> {
        write_json_file(&self.airports_path, airports)?;
        tracing::info!(
            path = %self.airports_path.display(),
            airports = airports.len(),
            "Wrote airports file"
        );

        write_json_file(&self.carriers_path, carriers)?;
        tracing::info!(
            path = %self.carriers_path.display(),
            carriers = carriers.len(),
            "Wrote carriers file"
        );

        Ok(())
    }
}

/// Serializes `value` compactly to `path`, creating parent directories
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let mut json = serde_json::to_string(value)?;
    json.push('\n');

    let write_error = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, json).map_err(write_error)
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> OutputResult<T> {
    let content = fs::read_to_string(path).map_err(|source| OutputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Reads an airports file back into a map
pub fn read_airports(path: &Path) -> OutputResult<BTreeMap<AirportCode, Airport>> {
    read_json_file(path)
}

/// Reads a carriers file back into a map
pub fn read_carriers(path: &Path) -> OutputResult<CarrierMap> {
    read_json_file(path)
}
