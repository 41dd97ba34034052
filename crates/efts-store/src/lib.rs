//! File-backed Ensemble Forecast Time Series (EFTS) store.
//!
//! This crate persists multi-dimensional forecast data indexed by lead
//! time, station, ensemble member and issue time in a self-describing
//! Zarr V3 hierarchy. It guarantees:
//!
//! - **Exact round-trip**: schema, axes and values survive a
//!   write/close/open cycle byte-for-byte.
//! - **Exact lookups**: station identifiers and issue times resolve by
//!   exact match only; a miss is an error, never a nearest neighbour.
//! - **Block-granular I/O**: one `(variable, station, issue time)` forecast
//!   block maps to one chunk on disk.
//!
//! # Architecture
//!
//! ```text
//! caller
//!   │  TimeAxisSpec + VariableCatalog + StationIds
//!   ▼
//! EftsStore::create ──► Zarr hierarchy (group attrs, coordinates, arrays)
//!   │
//!   ├─► put_lead_time_values(offsets)          (once, before forecasts)
//!   ├─► put_ensemble_forecasts(block, v, s, t) (lead × ens chunk write)
//!   └─► write() / close()
//!
//! EftsStore::open ───► get_ensemble_forecasts(v, s, t)
//!                       └─► block + valid times (t + offset * unit)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use efts_store::{EftsStore, EftsStoreConfig, VariableCatalog, VariableDefinition};
//! use efts_common::{lead_time_offsets, StationIds, TimeAxisSpec, TimeUnit};
//!
//! let mut catalog = VariableCatalog::new();
//! catalog.define(VariableDefinition::new("rain_fcast_ens", "rainfall ensemble", "mm", -999.0))?;
//!
//! let mut store = EftsStore::create(
//!     "/data/upper_murray.efts",
//!     TimeAxisSpec::new(start, TimeUnit::Hours, 1, 240),
//!     catalog,
//!     StationIds::Numeric(vec![410730, 410761]),
//!     24, // lead length
//!     35, // ensemble length
//!     TimeUnit::Hours,
//!     attrs,
//!     EftsStoreConfig::default(),
//! )?;
//! store.put_lead_time_values(&lead_time_offsets(1, 24, 1)?)?;
//! ```

pub mod config;
pub mod error;
pub mod schema;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{Compression, EftsStoreConfig};
pub use error::{EftsStoreError, Result};
pub use schema::{DimensionClass, Precision, VariableCatalog, VariableDefinition};
pub use store::EftsStore;
pub use types::{DimensionSizes, EnsembleBlock, LabelledBlock};
