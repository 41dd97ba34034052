//! Naming conventions for EFTS datasets.
//!
//! Dimension and coordinate variable names follow the ensemble forecast
//! time series netCDF convention, so stores written here stay recognisable
//! to tooling built around that convention.

use serde::{Deserialize, Serialize};

/// Spatial location dimension.
pub const STATION_DIM_NAME: &str = "station";
/// Forecast lead time dimension.
pub const LEAD_TIME_DIM_NAME: &str = "lead_time";
/// Issue-time / observation dimension.
pub const TIME_DIM_NAME: &str = "time";
/// Ensemble member dimension.
pub const ENS_MEMBER_DIM_NAME: &str = "ens_member";
/// Maximum string length dimension for textual coordinates.
pub const STR_LEN_DIM_NAME: &str = "str_len";

/// Station identifier coordinate variable.
pub const STATION_ID_VARNAME: &str = "station_id";
/// Station name coordinate variable.
pub const STATION_NAME_VARNAME: &str = "station_name";
/// Latitude coordinate variable.
pub const LAT_VARNAME: &str = "lat";
/// Longitude coordinate variable.
pub const LON_VARNAME: &str = "lon";
/// Projected easting coordinate variable.
pub const X_VARNAME: &str = "x";
/// Projected northing coordinate variable.
pub const Y_VARNAME: &str = "y";
/// Catchment area coordinate variable.
pub const AREA_VARNAME: &str = "area";
/// Station elevation coordinate variable.
pub const ELEVATION_VARNAME: &str = "elevation";

/// Names reserved for dimensions and conventional coordinate variables.
///
/// A user-defined data variable may not take any of these names.
pub const CONVENTIONAL_VARNAMES: &[&str] = &[
    STATION_DIM_NAME,
    LEAD_TIME_DIM_NAME,
    TIME_DIM_NAME,
    ENS_MEMBER_DIM_NAME,
    STR_LEN_DIM_NAME,
    STATION_ID_VARNAME,
    STATION_NAME_VARNAME,
    LAT_VARNAME,
    LON_VARNAME,
    X_VARNAME,
    Y_VARNAME,
    AREA_VARNAME,
    ELEVATION_VARNAME,
];

/// Storage order of the four dynamic axes of a forecast variable.
pub fn default_dim_order() -> [&'static str; 4] {
    [
        LEAD_TIME_DIM_NAME,
        STATION_DIM_NAME,
        ENS_MEMBER_DIM_NAME,
        TIME_DIM_NAME,
    ]
}

/// All five dimension names, dynamic axes first.
pub fn all_dim_names() -> [&'static str; 5] {
    [
        LEAD_TIME_DIM_NAME,
        STATION_DIM_NAME,
        ENS_MEMBER_DIM_NAME,
        TIME_DIM_NAME,
        STR_LEN_DIM_NAME,
    ]
}

/// True if `name` may not be used for a user-defined data variable.
pub fn is_reserved_name(name: &str) -> bool {
    CONVENTIONAL_VARNAMES.contains(&name)
}

/// Mandatory dataset-level attributes carried by every store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetAttributes {
    pub title: String,
    pub institution: String,
    pub source: String,
    pub catchment: String,
    pub comment: String,
}

impl DatasetAttributes {
    pub fn new(
        title: impl Into<String>,
        institution: impl Into<String>,
        source: impl Into<String>,
        catchment: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            institution: institution.into(),
            source: source.into(),
            catchment: catchment.into(),
            comment: comment.into(),
        }
    }
}
