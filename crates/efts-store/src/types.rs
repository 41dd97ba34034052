//! Core value types for forecast blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EftsStoreError, Result};

/// Declared sizes of the five store dimensions.
///
/// Field names match the on-disk dimension names; the record is persisted
/// verbatim as a group attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSizes {
    pub lead_time: usize,
    pub station: usize,
    pub ens_member: usize,
    pub time: usize,
    pub str_len: usize,
}

/// A 2-D block of values for one `(variable, station, issue time)` triple,
/// shaped lead time x ensemble member, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleBlock {
    values: Vec<f64>,
    lead_len: usize,
    ens_len: usize,
}

impl EnsembleBlock {
    /// Build a block from row-major values.
    ///
    /// The value count must equal `lead_len * ens_len`; the reported
    /// `actual` shape for a mismatch is the flat length.
    pub fn new(values: Vec<f64>, lead_len: usize, ens_len: usize) -> Result<Self> {
        if values.len() != lead_len * ens_len {
            return Err(EftsStoreError::ShapeMismatch {
                expected: (lead_len, ens_len),
                actual: (values.len(), 1),
            });
        }
        Ok(Self {
            values,
            lead_len,
            ens_len,
        })
    }

    /// Build a block from lead-time rows of ensemble values.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let lead_len = rows.len();
        let ens_len = rows.first().map(|r| r.len()).unwrap_or(0);
        for row in rows {
            if row.len() != ens_len {
                return Err(EftsStoreError::ShapeMismatch {
                    expected: (lead_len, ens_len),
                    actual: (lead_len, row.len()),
                });
            }
        }
        let values = rows.iter().flatten().copied().collect();
        Self::new(values, lead_len, ens_len)
    }

    /// A block with every cell set to `fill`.
    pub fn filled(fill: f64, lead_len: usize, ens_len: usize) -> Self {
        Self {
            values: vec![fill; lead_len * ens_len],
            lead_len,
            ens_len,
        }
    }

    pub fn lead_len(&self) -> usize {
        self.lead_len
    }

    pub fn ens_len(&self) -> usize {
        self.ens_len
    }

    /// Shape as `(lead_len, ens_len)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lead_len, self.ens_len)
    }

    /// Value at `(lead, member)`. Panics if either index is out of bounds,
    /// like slice indexing.
    pub fn value(&self, lead: usize, member: usize) -> f64 {
        assert!(lead < self.lead_len && member < self.ens_len);
        self.values[lead * self.ens_len + member]
    }

    /// Row-major backing values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// A forecast block labelled with its forecast-valid timestamps.
///
/// Row `i` of the block is valid at `valid_times[i]`, reconstructed from
/// the stored lead-time offsets and the issue time supplied at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledBlock {
    /// The lead x ensemble values.
    pub block: EnsembleBlock,
    /// Absolute forecast-valid time for each lead-time row.
    pub valid_times: Vec<DateTime<Utc>>,
}

impl LabelledBlock {
    /// Value at `(lead, member)`.
    pub fn value(&self, lead: usize, member: usize) -> f64 {
        self.block.value(lead, member)
    }

    /// Forecast-valid time of lead-time row `lead`.
    pub fn valid_time(&self, lead: usize) -> DateTime<Utc> {
        self.valid_times[lead]
    }
}
