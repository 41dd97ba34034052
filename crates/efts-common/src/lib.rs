//! Common types and conventions shared across the EFTS crates.

pub mod conventions;
pub mod station;
pub mod time;

pub use conventions::DatasetAttributes;
pub use station::{StationId, StationIds};
pub use time::{lead_time_offsets, AxisError, TimeAxisSpec, TimeUnit};
