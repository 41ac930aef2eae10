use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// An IATA-style airport code
///
/// Codes are compared exactly as the source spells them (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirportCode(String);

impl AirportCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AirportCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AirportCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for AirportCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}
