//! Error types for the EFTS store.

use thiserror::Error;

/// Errors that can occur while creating, writing or reading an EFTS store.
#[derive(Error, Debug)]
pub enum EftsStoreError {
    /// Bad or duplicate variable definition.
    #[error("schema error: {0}")]
    Schema(String),

    /// Non-positive axis length or step.
    #[error(transparent)]
    InvalidAxisSpec(#[from] efts_common::AxisError),

    /// Path conflict or failed validation at create time.
    #[error("store creation failed: {0}")]
    StoreCreation(String),

    /// Operation invoked out of allowed state order.
    #[error("operation out of sequence: {0}")]
    Sequencing(String),

    /// Station identifier not on the persisted station coordinate.
    #[error("unknown station identifier '{0}'")]
    UnknownStation(String),

    /// Issue time not exactly on the time axis.
    #[error("issue time {0} is not on the time axis")]
    UnknownIssueTime(chrono::DateTime<chrono::Utc>),

    /// Variable not in the store catalog.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// Block shape differs from the declared lead x ensemble lengths.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Operation on a closed store.
    #[error("store is closed")]
    StoreClosed,

    /// Structural inconsistency detected on open.
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    Zarr(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl EftsStoreError {
    /// Create a Schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a StoreCreation error.
    pub fn creation(msg: impl Into<String>) -> Self {
        Self::StoreCreation(msg.into())
    }

    /// Create a Sequencing error.
    pub fn sequencing(msg: impl Into<String>) -> Self {
        Self::Sequencing(msg.into())
    }

    /// Create a CorruptStore error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptStore(msg.into())
    }

    /// Create a Zarr error.
    pub fn zarr(msg: impl Into<String>) -> Self {
        Self::Zarr(msg.into())
    }

    /// Create a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<std::io::Error> for EftsStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for EftsStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::CorruptStore(err.to_string())
    }
}

/// Result type for EFTS store operations.
pub type Result<T> = std::result::Result<T, EftsStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        assert!(matches!(
            EftsStoreError::from(io),
            EftsStoreError::Storage(_)
        ));

        let json = serde_json::from_str::<i64>("not a number").unwrap_err();
        assert!(matches!(
            EftsStoreError::from(json),
            EftsStoreError::CorruptStore(_)
        ));
    }
}
