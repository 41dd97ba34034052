//! Configuration for the EFTS store.

use serde::{Deserialize, Serialize};

/// Configuration for an EFTS store instance.
///
/// Behaviour switches are explicit enumerations resolved once at
/// construction; they are never threaded through individual calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EftsStoreConfig {
    /// Compression codec for variable data arrays.
    pub compression: Compression,

    /// Compression level (1-9).
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub shuffle: bool,
}

impl Default for EftsStoreConfig {
    fn default() -> Self {
        Self {
            compression: Compression::BloscZstd,
            compression_level: 1,
            shuffle: true,
        }
    }
}

impl EftsStoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("EFTS_COMPRESSION") {
            config.compression = Compression::from_str(&val);
        }

        if let Ok(val) = std::env::var("EFTS_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                config.compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("EFTS_SHUFFLE") {
            config.shuffle = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.compression_level == 0 || self.compression_level > 9 {
            return Err("compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}

/// Compression codec for variable data arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    /// No compression.
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd (recommended).
    BloscZstd,
}

impl Default for Compression {
    fn default() -> Self {
        Self::BloscZstd
    }
}

impl Compression {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "blosc_lz4" => Self::BloscLz4,
            "blosc_zstd" => Self::BloscZstd,
            _ => Self::BloscZstd,
        }
    }

    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
