//! The EFTS store facade.
//!
//! Combines the variable catalog, dimension sizes and the two time axes
//! into a create/open/read/write lifecycle over a single Zarr hierarchy.
//! Single-writer discipline is the caller's responsibility; read handles
//! after a flush are independent pure lookups.

mod layout;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs::group::{Group, GroupBuilder};
use zarrs_filesystem::FilesystemStore;

use efts_common::conventions::{self, DatasetAttributes};
use efts_common::{StationId, StationIds, TimeAxisSpec, TimeUnit};

use crate::config::EftsStoreConfig;
use crate::error::{EftsStoreError, Result};
use crate::schema::{DimensionClass, Precision, VariableCatalog};
use crate::types::{DimensionSizes, EnsembleBlock, LabelledBlock};

/// Lifecycle state of a store handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreState {
    /// Freshly created; schema fixed, no forecast values written yet.
    Created,
    /// At least one value written since the last flush.
    Writing,
    /// All mutations flushed to durable storage.
    Flushed,
    /// Sealed; only a fresh `open` may touch the file again.
    Closed,
}

/// A file-backed ensemble forecast time series store.
///
/// Owns the backing Zarr hierarchy, the dimension sizes, the variable
/// catalog and both time axes. All I/O is synchronous on the calling
/// thread.
pub struct EftsStore {
    storage: layout::Storage,
    path: PathBuf,
    config: EftsStoreConfig,
    dims: DimensionSizes,
    catalog: VariableCatalog,
    station_ids: StationIds,
    time_axis: Vec<DateTime<Utc>>,
    time_axis_spec: TimeAxisSpec,
    lead_time_unit: TimeUnit,
    lead_time_offsets: Vec<i64>,
    dataset_attrs: DatasetAttributes,
    variables: HashMap<String, Array<FilesystemStore>>,
    state: StoreState,
    lead_time_written: bool,
}

impl EftsStore {
    /// Create a new store at `path`.
    ///
    /// Validates every input before touching the filesystem, then allocates
    /// the root group, the coordinate arrays and one data array per
    /// declared variable, each initialized to its missing value.
    ///
    /// Fails with `StoreCreation` if `path` already exists and is not an
    /// empty directory, or if any validation fails.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        path: impl AsRef<Path>,
        time_axis: TimeAxisSpec,
        catalog: VariableCatalog,
        station_ids: StationIds,
        lead_length: usize,
        ensemble_length: usize,
        lead_time_unit: TimeUnit,
        dataset_attrs: DatasetAttributes,
        config: EftsStoreConfig,
    ) -> Result<Self> {
        // All validation happens before the filesystem is touched, so a
        // failed create leaves nothing behind.
        config.validate().map_err(EftsStoreError::StoreCreation)?;
        station_ids
            .validate()
            .map_err(EftsStoreError::StoreCreation)?;
        if lead_length == 0 {
            return Err(EftsStoreError::creation("lead_length must be positive"));
        }
        if ensemble_length == 0 {
            return Err(EftsStoreError::creation("ensemble_length must be positive"));
        }
        let axis = normalize_axis(time_axis.build()?)?;

        let path = path.as_ref();
        if path.exists() {
            let occupied = path.is_file()
                || path
                    .read_dir()
                    .map(|mut entries| entries.next().is_some())
                    .unwrap_or(true);
            if occupied {
                return Err(EftsStoreError::creation(format!(
                    "path '{}' already exists and is not empty",
                    path.display()
                )));
            }
        }
        std::fs::create_dir_all(path).map_err(|e| EftsStoreError::creation(e.to_string()))?;

        let storage: layout::Storage = Arc::new(
            FilesystemStore::new(path).map_err(|e| EftsStoreError::creation(e.to_string()))?,
        );

        let dims = DimensionSizes {
            lead_time: lead_length,
            station: station_ids.len(),
            ens_member: ensemble_length,
            time: axis.len(),
            str_len: station_ids.max_str_len(),
        };

        // Root group attributes carry the full store description.
        let mut group = GroupBuilder::new()
            .build(storage.clone(), "/")
            .map_err(|e| EftsStoreError::zarr(e.to_string()))?;
        let attrs = group.attributes_mut();
        attrs.insert(
            layout::ATTR_FORMAT.to_string(),
            serde_json::json!(layout::FORMAT_MARKER),
        );
        attrs.insert(
            layout::ATTR_DIMENSIONS.to_string(),
            to_attr_value(&dims, layout::ATTR_DIMENSIONS)?,
        );
        attrs.insert(
            layout::ATTR_VARIABLES.to_string(),
            to_attr_value(&catalog, layout::ATTR_VARIABLES)?,
        );
        attrs.insert(
            layout::ATTR_TIME_AXIS.to_string(),
            to_attr_value(&time_axis, layout::ATTR_TIME_AXIS)?,
        );
        attrs.insert(
            layout::ATTR_LEAD_TIME_UNIT.to_string(),
            serde_json::json!(lead_time_unit.as_str()),
        );
        attrs.insert(
            layout::ATTR_STATION_ID_TYPE.to_string(),
            serde_json::json!(station_ids.dtype_name()),
        );
        attrs.insert(
            layout::ATTR_DATASET.to_string(),
            to_attr_value(&dataset_attrs, layout::ATTR_DATASET)?,
        );
        group
            .store_metadata()
            .map_err(|e| EftsStoreError::storage(e.to_string()))?;

        layout::create_station_id_array(storage.clone(), &station_ids)?;
        layout::create_lead_time_array(storage.clone(), lead_length, lead_time_unit)?;
        layout::create_time_array(storage.clone(), &axis)?;

        let mut variables = HashMap::new();
        for def in catalog.iter() {
            let array = layout::create_variable_array(storage.clone(), def, &dims, &config)?;
            variables.insert(def.name.clone(), array);
        }

        tracing::info!(
            path = %path.display(),
            stations = dims.station,
            variables = catalog.len(),
            time_steps = dims.time,
            "created EFTS store"
        );

        Ok(Self {
            storage,
            path: path.to_path_buf(),
            config,
            dims,
            catalog,
            station_ids,
            time_axis: axis,
            time_axis_spec: time_axis,
            lead_time_unit,
            lead_time_offsets: vec![0; lead_length],
            dataset_attrs,
            variables,
            state: StoreState::Created,
            lead_time_written: false,
        })
    }

    /// Open an existing store.
    ///
    /// Re-reads dimensions, variable schemas and both coordinates from the
    /// file. Only structural consistency is re-validated; business rules
    /// were enforced at creation. Fails with `CorruptStore` if the
    /// hierarchy does not describe a coherent store.
    pub fn open(path: impl AsRef<Path>, config: EftsStoreConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(EftsStoreError::storage(format!(
                "store path '{}' not found",
                path.display()
            )));
        }
        let storage: layout::Storage = Arc::new(
            FilesystemStore::new(path).map_err(|e| EftsStoreError::storage(e.to_string()))?,
        );

        let group = Group::open(storage.clone(), "/")
            .map_err(|e| EftsStoreError::corrupt(format!("cannot open root group: {}", e)))?;
        let attrs = group.attributes();

        let format: String = layout::group_attr(attrs, layout::ATTR_FORMAT)?;
        if format != layout::FORMAT_MARKER {
            return Err(EftsStoreError::corrupt(format!(
                "unrecognised format marker '{}'",
                format
            )));
        }
        let dims: DimensionSizes = layout::group_attr(attrs, layout::ATTR_DIMENSIONS)?;
        let catalog: VariableCatalog = layout::group_attr(attrs, layout::ATTR_VARIABLES)?;
        let time_axis_spec: TimeAxisSpec = layout::group_attr(attrs, layout::ATTR_TIME_AXIS)?;
        let unit_name: String = layout::group_attr(attrs, layout::ATTR_LEAD_TIME_UNIT)?;
        let lead_time_unit = TimeUnit::parse(&unit_name).ok_or_else(|| {
            EftsStoreError::corrupt(format!("unknown lead-time step unit '{}'", unit_name))
        })?;
        let id_type: String = layout::group_attr(attrs, layout::ATTR_STATION_ID_TYPE)?;
        let dataset_attrs: DatasetAttributes = layout::group_attr(attrs, layout::ATTR_DATASET)?;

        // Coordinates.
        let station_array = layout::open_array(&storage, conventions::STATION_ID_VARNAME)?;
        layout::check_coordinate_shape(&station_array, dims.station, conventions::STATION_ID_VARNAME)?;
        let station_ids = match id_type.as_str() {
            "int64" => StationIds::Numeric(layout::read_i64_coordinate(
                &station_array,
                conventions::STATION_ID_VARNAME,
            )?),
            "string" => StationIds::Text(layout::read_string_coordinate(
                &station_array,
                conventions::STATION_ID_VARNAME,
            )?),
            other => {
                return Err(EftsStoreError::corrupt(format!(
                    "unknown station identifier dtype '{}'",
                    other
                )))
            }
        };

        let lead_array = layout::open_array(&storage, conventions::LEAD_TIME_DIM_NAME)?;
        layout::check_coordinate_shape(&lead_array, dims.lead_time, conventions::LEAD_TIME_DIM_NAME)?;
        let lead_time_offsets =
            layout::read_i64_coordinate(&lead_array, conventions::LEAD_TIME_DIM_NAME)?;

        let time_array = layout::open_array(&storage, conventions::TIME_DIM_NAME)?;
        layout::check_coordinate_shape(&time_array, dims.time, conventions::TIME_DIM_NAME)?;
        let time_axis = layout::read_i64_coordinate(&time_array, conventions::TIME_DIM_NAME)?
            .into_iter()
            .map(|s| {
                DateTime::from_timestamp(s, 0).ok_or_else(|| {
                    EftsStoreError::corrupt(format!("time coordinate value {} out of range", s))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // One array per catalogued variable, with a shape consistent with
        // the declared dimensions.
        let mut variables = HashMap::new();
        for def in catalog.iter() {
            let array = layout::open_array(&storage, &def.name)?;
            let (expected_shape, _) = layout::variable_shape(def.dimensions, &dims);
            if array.shape() != expected_shape.as_slice() {
                return Err(EftsStoreError::corrupt(format!(
                    "variable '{}' has shape {:?}, expected {:?}",
                    def.name,
                    array.shape(),
                    expected_shape
                )));
            }
            variables.insert(def.name.clone(), array);
        }

        tracing::info!(
            path = %path.display(),
            stations = dims.station,
            variables = catalog.len(),
            "opened EFTS store"
        );

        Ok(Self {
            storage,
            path: path.to_path_buf(),
            config,
            dims,
            catalog,
            station_ids,
            time_axis,
            time_axis_spec,
            lead_time_unit,
            lead_time_offsets,
            dataset_attrs,
            variables,
            state: StoreState::Flushed,
            lead_time_written: true,
        })
    }

    /// Write the lead-time coordinate values.
    ///
    /// Legal at most once, before any forecast block is written; calling
    /// twice, after a write, or on an opened store fails with `Sequencing`.
    pub fn put_lead_time_values(&mut self, offsets: &[i64]) -> Result<()> {
        self.ensure_open()?;
        if self.lead_time_written {
            return Err(EftsStoreError::sequencing(
                "lead-time values were already written",
            ));
        }
        if self.state != StoreState::Created {
            return Err(EftsStoreError::sequencing(
                "lead-time values must be written before any forecast block",
            ));
        }
        if offsets.len() != self.dims.lead_time {
            return Err(EftsStoreError::ShapeMismatch {
                expected: (self.dims.lead_time, 1),
                actual: (offsets.len(), 1),
            });
        }

        let array = layout::open_array(&self.storage, conventions::LEAD_TIME_DIM_NAME)?;
        let subset = ArraySubset::new_with_shape(vec![offsets.len() as u64]);
        array
            .store_array_subset_elements(&subset, offsets)
            .map_err(|e| EftsStoreError::storage(e.to_string()))?;

        self.lead_time_offsets = offsets.to_vec();
        self.lead_time_written = true;
        Ok(())
    }

    /// Write one forecast block for `(variable, station, issue_time)`.
    ///
    /// Overwrites any previous values at that slice; last write wins.
    pub fn put_ensemble_forecasts(
        &mut self,
        values: &EnsembleBlock,
        variable_name: &str,
        identifier: &StationId,
        issue_time: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        let def = self.catalog.lookup(variable_name)?;
        if def.dimensions != DimensionClass::EnsembleForecast {
            return Err(EftsStoreError::schema(format!(
                "variable '{}' does not hold ensemble forecasts",
                variable_name
            )));
        }
        let precision = def.precision;
        let station_pos = self.station_position(identifier)?;
        let time_pos = self.time_position(issue_time)?;
        let expected = (self.dims.lead_time, self.dims.ens_member);
        if values.shape() != expected {
            return Err(EftsStoreError::ShapeMismatch {
                expected,
                actual: values.shape(),
            });
        }

        let array = self.variable_array(variable_name)?;
        let subset = self.block_subset(station_pos, time_pos)?;
        match precision {
            Precision::Double => array
                .store_array_subset_elements(&subset, values.values())
                .map_err(|e| EftsStoreError::storage(e.to_string()))?,
            Precision::Float => {
                let narrowed: Vec<f32> = values.values().iter().map(|&v| v as f32).collect();
                array
                    .store_array_subset_elements(&subset, &narrowed)
                    .map_err(|e| EftsStoreError::storage(e.to_string()))?
            }
        }

        self.state = StoreState::Writing;
        tracing::debug!(
            variable = variable_name,
            station = %identifier,
            issue_time = %issue_time,
            "wrote forecast block"
        );
        Ok(())
    }

    /// Read the forecast block for `(variable, station, start_time)`.
    ///
    /// The returned block carries the forecast-valid time of every
    /// lead-time row, reconstructed from the stored offsets and step unit.
    /// A slice that was never written reads back as the variable's missing
    /// value in every cell.
    pub fn get_ensemble_forecasts(
        &self,
        variable_name: &str,
        identifier: &StationId,
        start_time: DateTime<Utc>,
    ) -> Result<LabelledBlock> {
        self.ensure_open()?;
        let def = self.catalog.lookup(variable_name)?;
        if def.dimensions != DimensionClass::EnsembleForecast {
            return Err(EftsStoreError::schema(format!(
                "variable '{}' does not hold ensemble forecasts",
                variable_name
            )));
        }
        let station_pos = self.station_position(identifier)?;
        let time_pos = self.time_position(start_time)?;

        let array = self.variable_array(variable_name)?;
        let subset = self.block_subset(station_pos, time_pos)?;
        let values: Vec<f64> = match def.precision {
            Precision::Double => array
                .retrieve_array_subset_elements::<f64>(&subset)
                .map_err(|e| EftsStoreError::storage(e.to_string()))?,
            Precision::Float => array
                .retrieve_array_subset_elements::<f32>(&subset)
                .map_err(|e| EftsStoreError::storage(e.to_string()))?
                .into_iter()
                .map(f64::from)
                .collect(),
        };

        let block = EnsembleBlock::new(values, self.dims.lead_time, self.dims.ens_member)?;
        let valid_times = self
            .lead_time_offsets
            .iter()
            .map(|&offset| start_time + self.lead_time_unit.duration(offset))
            .collect();

        Ok(LabelledBlock { block, valid_times })
    }

    /// Write one value per station for a station-scalar variable.
    pub fn put_station_values(&mut self, variable_name: &str, values: &[f64]) -> Result<()> {
        self.ensure_open()?;
        let def = self.catalog.lookup(variable_name)?;
        if def.dimensions != DimensionClass::StationScalar {
            return Err(EftsStoreError::schema(format!(
                "variable '{}' is not a station scalar",
                variable_name
            )));
        }
        let precision = def.precision;
        if values.len() != self.dims.station {
            return Err(EftsStoreError::ShapeMismatch {
                expected: (self.dims.station, 1),
                actual: (values.len(), 1),
            });
        }

        let array = self.variable_array(variable_name)?;
        let subset = ArraySubset::new_with_shape(vec![self.dims.station as u64]);
        match precision {
            Precision::Double => array
                .store_array_subset_elements(&subset, values)
                .map_err(|e| EftsStoreError::storage(e.to_string()))?,
            Precision::Float => {
                let narrowed: Vec<f32> = values.iter().map(|&v| v as f32).collect();
                array
                    .store_array_subset_elements(&subset, &narrowed)
                    .map_err(|e| EftsStoreError::storage(e.to_string()))?
            }
        }

        self.state = StoreState::Writing;
        Ok(())
    }

    /// Read all values of a station-scalar variable, in station order.
    pub fn get_station_values(&self, variable_name: &str) -> Result<Vec<f64>> {
        self.ensure_open()?;
        let def = self.catalog.lookup(variable_name)?;
        if def.dimensions != DimensionClass::StationScalar {
            return Err(EftsStoreError::schema(format!(
                "variable '{}' is not a station scalar",
                variable_name
            )));
        }
        let array = self.variable_array(variable_name)?;
        let subset = ArraySubset::new_with_shape(vec![self.dims.station as u64]);
        match def.precision {
            Precision::Double => array
                .retrieve_array_subset_elements::<f64>(&subset)
                .map_err(|e| EftsStoreError::storage(e.to_string())),
            Precision::Float => Ok(array
                .retrieve_array_subset_elements::<f32>(&subset)
                .map_err(|e| EftsStoreError::storage(e.to_string()))?
                .into_iter()
                .map(f64::from)
                .collect()),
        }
    }

    /// Read one station's value of a station-scalar variable.
    pub fn get_station_value(&self, variable_name: &str, identifier: &StationId) -> Result<f64> {
        self.ensure_open()?;
        let station_pos = self.station_position(identifier)?;
        let values = self.get_station_values(variable_name)?;
        Ok(values[station_pos])
    }

    /// Flush buffered mutations to durable storage.
    ///
    /// The filesystem backend persists on every store call, so this is the
    /// durability point for callers that batch writes.
    pub fn write(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = StoreState::Flushed;
        tracing::debug!(path = %self.path.display(), "flushed EFTS store");
        Ok(())
    }

    /// Flush and seal the store. Idempotent; every subsequent operation
    /// except a fresh `open` fails with `StoreClosed`.
    pub fn close(&mut self) -> Result<()> {
        if self.state == StoreState::Closed {
            return Ok(());
        }
        self.state = StoreState::Closed;
        tracing::debug!(path = %self.path.display(), "closed EFTS store");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state == StoreState::Closed
    }

    /// The five dimension names, dynamic axes first.
    pub fn dim_names(&self) -> [&'static str; 5] {
        conventions::all_dim_names()
    }

    pub fn dim_sizes(&self) -> DimensionSizes {
        self.dims
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.catalog.names()
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn station_ids(&self) -> &StationIds {
        &self.station_ids
    }

    pub fn time_axis(&self) -> &[DateTime<Utc>] {
        &self.time_axis
    }

    pub fn time_axis_spec(&self) -> TimeAxisSpec {
        self.time_axis_spec
    }

    pub fn lead_time_offsets(&self) -> &[i64] {
        &self.lead_time_offsets
    }

    pub fn lead_time_unit(&self) -> TimeUnit {
        self.lead_time_unit
    }

    pub fn dataset_attributes(&self) -> &DatasetAttributes {
        &self.dataset_attrs
    }

    pub fn config(&self) -> &EftsStoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == StoreState::Closed {
            return Err(EftsStoreError::StoreClosed);
        }
        Ok(())
    }

    /// Resolve a station identifier to its position, exact match only.
    fn station_position(&self, identifier: &StationId) -> Result<usize> {
        self.station_ids
            .position(identifier)
            .ok_or_else(|| EftsStoreError::UnknownStation(identifier.to_string()))
    }

    /// Resolve an issue time to its axis position, exact match only.
    ///
    /// The axis is held at second resolution, matching the persisted
    /// coordinate, and the supplied time must equal an axis value exactly.
    /// The lookup key is never truncated; no interpolation, no
    /// nearest-match fallback.
    fn time_position(&self, issue_time: DateTime<Utc>) -> Result<usize> {
        self.time_axis
            .iter()
            .position(|t| *t == issue_time)
            .ok_or(EftsStoreError::UnknownIssueTime(issue_time))
    }

    fn variable_array(&self, name: &str) -> Result<&Array<FilesystemStore>> {
        self.variables
            .get(name)
            .ok_or_else(|| EftsStoreError::UnknownVariable(name.to_string()))
    }

    /// The `(lead=:, station=pos, ens=:, time=pos)` slice of a forecast
    /// variable.
    fn block_subset(&self, station_pos: usize, time_pos: usize) -> Result<ArraySubset> {
        ArraySubset::new_with_start_shape(
            vec![0, station_pos as u64, 0, time_pos as u64],
            vec![self.dims.lead_time as u64, 1, self.dims.ens_member as u64, 1],
        )
        .map_err(|e| EftsStoreError::zarr(e.to_string()))
    }
}

/// The persisted time coordinate holds epoch seconds, so the in-memory
/// axis is kept at second resolution from the start; both sides of a
/// close/reopen cycle then resolve the same issue times.
fn normalize_axis(axis: Vec<DateTime<Utc>>) -> Result<Vec<DateTime<Utc>>> {
    axis.into_iter()
        .map(|t| {
            DateTime::from_timestamp(t.timestamp(), 0).ok_or_else(|| {
                EftsStoreError::creation(format!("time axis value {} out of range", t))
            })
        })
        .collect()
}

fn to_attr_value<T: serde::Serialize>(value: &T, key: &str) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| EftsStoreError::creation(format!("cannot serialize attribute '{}': {}", key, e)))
}
