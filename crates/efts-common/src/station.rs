//! Station identifier coordinate handling.
//!
//! Station keys are opaque: either numeric or textual, never interpreted.
//! Their order on the coordinate is significant and defines the position
//! used for all by-station lookups.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque station key, numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StationId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationId::Numeric(n) => write!(f, "{}", n),
            StationId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for StationId {
    fn from(n: i64) -> Self {
        StationId::Numeric(n)
    }
}

impl From<&str> for StationId {
    fn from(s: &str) -> Self {
        StationId::Text(s.to_string())
    }
}

impl From<String> for StationId {
    fn from(s: String) -> Self {
        StationId::Text(s)
    }
}

/// The station coordinate: an ordered list of identifiers of one declared
/// dtype.
///
/// Lookups are identifier-to-position, exact match only. A numeric lookup
/// against a textual coordinate (or vice versa) is a miss, not a coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationIds {
    Numeric(Vec<i64>),
    Text(Vec<String>),
}

impl StationIds {
    pub fn len(&self) -> usize {
        match self {
            StationIds::Numeric(v) => v.len(),
            StationIds::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The declared identifier dtype, as persisted with the coordinate.
    pub fn dtype_name(&self) -> &'static str {
        match self {
            StationIds::Numeric(_) => "int64",
            StationIds::Text(_) => "string",
        }
    }

    /// Length of the longest textual identifier; 0 for numeric coordinates.
    pub fn max_str_len(&self) -> usize {
        match self {
            StationIds::Numeric(_) => 0,
            StationIds::Text(v) => v.iter().map(|s| s.len()).max().unwrap_or(0),
        }
    }

    /// Position of an identifier on the coordinate.
    pub fn position(&self, id: &StationId) -> Option<usize> {
        match (self, id) {
            (StationIds::Numeric(v), StationId::Numeric(n)) => v.iter().position(|x| x == n),
            (StationIds::Text(v), StationId::Text(s)) => v.iter().position(|x| x == s),
            _ => None,
        }
    }

    /// Identifier at a position.
    pub fn get(&self, pos: usize) -> Option<StationId> {
        match self {
            StationIds::Numeric(v) => v.get(pos).copied().map(StationId::Numeric),
            StationIds::Text(v) => v.get(pos).cloned().map(StationId::Text),
        }
    }

    /// Validate that the coordinate is non-empty and free of duplicates.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("station identifier list is empty".to_string());
        }
        match self {
            StationIds::Numeric(v) => {
                for (i, x) in v.iter().enumerate() {
                    if v[i + 1..].contains(x) {
                        return Err(format!("duplicate station identifier '{}'", x));
                    }
                }
            }
            StationIds::Text(v) => {
                for (i, x) in v.iter().enumerate() {
                    if v[i + 1..].contains(x) {
                        return Err(format!("duplicate station identifier '{}'", x));
                    }
                }
            }
        }
        Ok(())
    }
}
