//! On-disk layout of an EFTS store.
//!
//! One Zarr V3 hierarchy per store: a root group whose attributes carry the
//! full store description, three coordinate arrays (`station_id`,
//! `lead_time`, `time`) and one data array per declared variable. Ensemble
//! variables are chunked `[lead, 1, ens, 1]` so that one forecast block is
//! exactly one chunk.

use std::sync::Arc;

use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use efts_common::conventions::{
    self, LEAD_TIME_DIM_NAME, STATION_DIM_NAME, STATION_ID_VARNAME, TIME_DIM_NAME,
};
use efts_common::{StationIds, TimeUnit};

use crate::config::{Compression, EftsStoreConfig};
use crate::error::{EftsStoreError, Result};
use crate::schema::{DimensionClass, Precision, VariableDefinition};
use crate::types::DimensionSizes;

/// Marker identifying the store layout; checked on open.
pub const FORMAT_MARKER: &str = "efts-zarr-1";

/// Group attribute: format marker.
pub const ATTR_FORMAT: &str = "efts_format";
/// Group attribute: the five dimension sizes.
pub const ATTR_DIMENSIONS: &str = "dimensions";
/// Group attribute: the variable catalog.
pub const ATTR_VARIABLES: &str = "variables";
/// Group attribute: the issue-time axis specification.
pub const ATTR_TIME_AXIS: &str = "time_axis";
/// Group attribute: step unit of the lead-time coordinate.
pub const ATTR_LEAD_TIME_UNIT: &str = "lead_time_step_unit";
/// Group attribute: declared dtype of the station identifiers.
pub const ATTR_STATION_ID_TYPE: &str = "station_id_type";
/// Group attribute: mandatory dataset-level attributes.
pub const ATTR_DATASET: &str = "dataset_attributes";

/// Units attribute key on coordinate and data arrays.
pub const ATTR_UNITS: &str = "units";
/// Units string of the epoch-second time coordinate.
pub const TIME_UNITS: &str = "seconds since 1970-01-01T00:00:00Z";

pub type Storage = Arc<FilesystemStore>;

/// Node path of a named array under the root group.
pub fn array_path(name: &str) -> String {
    format!("/{}", name)
}

/// Fetch and deserialize a required group attribute.
pub fn group_attr<T: serde::de::DeserializeOwned>(
    attrs: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<T> {
    let value = attrs
        .get(key)
        .ok_or_else(|| EftsStoreError::corrupt(format!("missing group attribute '{}'", key)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| EftsStoreError::corrupt(format!("bad group attribute '{}': {}", key, e)))
}

/// Shape and chunk shape for a variable of the given dimensionality class.
pub fn variable_shape(class: DimensionClass, dims: &DimensionSizes) -> (Vec<u64>, Vec<u64>) {
    match class {
        DimensionClass::EnsembleForecast => (
            vec![
                dims.lead_time as u64,
                dims.station as u64,
                dims.ens_member as u64,
                dims.time as u64,
            ],
            // One forecast block per chunk.
            vec![dims.lead_time as u64, 1, dims.ens_member as u64, 1],
        ),
        DimensionClass::StationScalar => (vec![dims.station as u64], vec![dims.station as u64]),
    }
}

/// Create the compression codec chain for a variable array.
pub fn compression_codecs(
    config: &EftsStoreConfig,
    precision: Precision,
) -> Result<Vec<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>>> {
    let compressor = match config.compression {
        Compression::None => return Ok(vec![]),
        Compression::BloscLz4 => BloscCompressor::LZ4,
        Compression::BloscZstd => BloscCompressor::Zstd,
    };

    let level = BloscCompressionLevel::try_from(config.compression_level)
        .map_err(|_| EftsStoreError::creation("invalid compression level"))?;

    let shuffle = if config.shuffle {
        BloscShuffleMode::Shuffle
    } else {
        BloscShuffleMode::NoShuffle
    };

    // typesize is required when shuffle is enabled
    let typesize = if config.shuffle {
        Some(precision.byte_size())
    } else {
        None
    };

    let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
        .map_err(|e| EftsStoreError::creation(e.to_string()))?;

    Ok(vec![Arc::new(codec)])
}

/// Create and persist the array for one declared variable, filled with its
/// missing value.
pub fn create_variable_array(
    storage: Storage,
    def: &VariableDefinition,
    dims: &DimensionSizes,
    config: &EftsStoreConfig,
) -> Result<Array<FilesystemStore>> {
    let (shape, chunks) = variable_shape(def.dimensions, dims);
    let chunk_grid: zarrs::array::ChunkGrid = chunks
        .try_into()
        .map_err(|e| EftsStoreError::zarr(format!("{:?}", e)))?;

    let (data_type, fill_value) = match def.precision {
        Precision::Double => (DataType::Float64, FillValue::from(def.missing_value)),
        Precision::Float => (
            DataType::Float32,
            FillValue::from(def.missing_value as f32),
        ),
    };

    let mut attrs = serde_json::Map::new();
    attrs.insert("long_name".to_string(), serde_json::json!(def.long_name));
    attrs.insert(ATTR_UNITS.to_string(), serde_json::json!(def.units));
    attrs.insert(
        "missing_value".to_string(),
        serde_json::json!(def.missing_value),
    );
    attrs.insert(
        "type_description".to_string(),
        serde_json::json!(def.type_description),
    );
    attrs.insert(
        "location_type".to_string(),
        serde_json::json!(def.location_type),
    );
    attrs.insert(
        "precision".to_string(),
        serde_json::json!(def.precision.as_str()),
    );

    let codecs = compression_codecs(config, def.precision)?;

    let mut binding = ArrayBuilder::new(shape, data_type, chunk_grid, fill_value);
    let mut builder = binding.attributes(attrs);
    builder = match def.dimensions {
        DimensionClass::EnsembleForecast => {
            builder.dimension_names(conventions::default_dim_order().into())
        }
        DimensionClass::StationScalar => builder.dimension_names([STATION_DIM_NAME].into()),
    };
    if !codecs.is_empty() {
        builder = builder.bytes_to_bytes_codecs(codecs);
    }

    let array = builder
        .build(storage, &array_path(&def.name))
        .map_err(|e| EftsStoreError::zarr(e.to_string()))?;
    array
        .store_metadata()
        .map_err(|e| EftsStoreError::storage(e.to_string()))?;

    Ok(array)
}

/// Create the station identifier coordinate and write its values.
pub fn create_station_id_array(storage: Storage, ids: &StationIds) -> Result<()> {
    let n = ids.len() as u64;
    let chunk_grid: zarrs::array::ChunkGrid = vec![n]
        .try_into()
        .map_err(|e| EftsStoreError::zarr(format!("{:?}", e)))?;
    let subset = ArraySubset::new_with_shape(vec![n]);

    match ids {
        StationIds::Numeric(values) => {
            let mut binding =
                ArrayBuilder::new(vec![n], DataType::Int64, chunk_grid, FillValue::from(0i64));
            let array = binding
                .dimension_names([STATION_DIM_NAME].into())
                .build(storage, &array_path(STATION_ID_VARNAME))
                .map_err(|e| EftsStoreError::zarr(e.to_string()))?;
            array
                .store_metadata()
                .map_err(|e| EftsStoreError::storage(e.to_string()))?;
            array
                .store_array_subset_elements(&subset, values)
                .map_err(|e| EftsStoreError::storage(e.to_string()))?;
        }
        StationIds::Text(values) => {
            let mut binding =
                ArrayBuilder::new(vec![n], DataType::String, chunk_grid, FillValue::from(""));
            let array = binding
                .dimension_names([STATION_DIM_NAME].into())
                .build(storage, &array_path(STATION_ID_VARNAME))
                .map_err(|e| EftsStoreError::zarr(e.to_string()))?;
            array
                .store_metadata()
                .map_err(|e| EftsStoreError::storage(e.to_string()))?;
            array
                .store_array_subset_elements(&subset, values)
                .map_err(|e| EftsStoreError::storage(e.to_string()))?;
        }
    }

    Ok(())
}

/// Create the lead-time coordinate. Values are written later, by
/// `put_lead_time_values`.
pub fn create_lead_time_array(storage: Storage, lead_length: usize, unit: TimeUnit) -> Result<()> {
    let n = lead_length as u64;
    let chunk_grid: zarrs::array::ChunkGrid = vec![n]
        .try_into()
        .map_err(|e| EftsStoreError::zarr(format!("{:?}", e)))?;

    let mut attrs = serde_json::Map::new();
    attrs.insert(ATTR_UNITS.to_string(), serde_json::json!(unit.as_str()));

    let mut binding =
        ArrayBuilder::new(vec![n], DataType::Int64, chunk_grid, FillValue::from(0i64));
    let array = binding
        .attributes(attrs)
        .dimension_names([LEAD_TIME_DIM_NAME].into())
        .build(storage, &array_path(LEAD_TIME_DIM_NAME))
        .map_err(|e| EftsStoreError::zarr(e.to_string()))?;
    array
        .store_metadata()
        .map_err(|e| EftsStoreError::storage(e.to_string()))?;

    Ok(())
}

/// Create the issue-time coordinate and write it as epoch seconds.
pub fn create_time_array(storage: Storage, axis: &[chrono::DateTime<chrono::Utc>]) -> Result<()> {
    let n = axis.len() as u64;
    let chunk_grid: zarrs::array::ChunkGrid = vec![n]
        .try_into()
        .map_err(|e| EftsStoreError::zarr(format!("{:?}", e)))?;

    let mut attrs = serde_json::Map::new();
    attrs.insert(ATTR_UNITS.to_string(), serde_json::json!(TIME_UNITS));

    let mut binding =
        ArrayBuilder::new(vec![n], DataType::Int64, chunk_grid, FillValue::from(0i64));
    let array = binding
        .attributes(attrs)
        .dimension_names([TIME_DIM_NAME].into())
        .build(storage, &array_path(TIME_DIM_NAME))
        .map_err(|e| EftsStoreError::zarr(e.to_string()))?;
    array
        .store_metadata()
        .map_err(|e| EftsStoreError::storage(e.to_string()))?;

    let seconds: Vec<i64> = axis.iter().map(|t| t.timestamp()).collect();
    let subset = ArraySubset::new_with_shape(vec![n]);
    array
        .store_array_subset_elements(&subset, &seconds)
        .map_err(|e| EftsStoreError::storage(e.to_string()))?;

    Ok(())
}

/// Open a named array under the root group.
pub fn open_array(storage: &Storage, name: &str) -> Result<Array<FilesystemStore>> {
    Array::open(storage.clone(), &array_path(name))
        .map_err(|e| EftsStoreError::corrupt(format!("cannot open array '{}': {}", name, e)))
}

/// Check that a coordinate array is 1-D with the expected length.
pub fn check_coordinate_shape(
    array: &Array<FilesystemStore>,
    expected_len: usize,
    name: &str,
) -> Result<()> {
    if array.shape() != [expected_len as u64] {
        return Err(EftsStoreError::corrupt(format!(
            "coordinate '{}' has shape {:?}, expected [{}]",
            name,
            array.shape(),
            expected_len
        )));
    }
    Ok(())
}

/// Read a 1-D int64 coordinate in full.
pub fn read_i64_coordinate(array: &Array<FilesystemStore>, name: &str) -> Result<Vec<i64>> {
    array
        .retrieve_array_subset_elements::<i64>(&array.subset_all())
        .map_err(|e| EftsStoreError::corrupt(format!("cannot read coordinate '{}': {}", name, e)))
}

/// Read a 1-D string coordinate in full.
pub fn read_string_coordinate(array: &Array<FilesystemStore>, name: &str) -> Result<Vec<String>> {
    array
        .retrieve_array_subset_elements::<String>(&array.subset_all())
        .map_err(|e| EftsStoreError::corrupt(format!("cannot read coordinate '{}': {}", name, e)))
}
