//! Variable schemas for EFTS stores.
//!
//! A store holds an explicit mapping from variable name to a fixed schema
//! record, validated when the catalog is built and immutable once the store
//! is created. String-keyed attribute access never leaks past this module.

use serde::{Deserialize, Serialize};

use crate::error::{EftsStoreError, Result};

/// Numeric storage precision of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 64-bit floating point storage.
    Double,
    /// 32-bit floating point storage.
    Float,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Double => "double",
            Precision::Float => "float",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "double" => Some(Precision::Double),
            "float" => Some(Precision::Float),
            _ => None,
        }
    }

    /// Element size in bytes, as needed by the shuffle filter.
    pub fn byte_size(&self) -> usize {
        match self {
            Precision::Double => 8,
            Precision::Float => 4,
        }
    }
}

/// How many dynamic axes a variable spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionClass {
    /// The four dynamic axes: `[lead_time, station, ens_member, time]`.
    EnsembleForecast,
    /// One value per station.
    StationScalar,
}

/// Schema record for one data variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Variable name, unique within a store.
    pub name: String,
    /// Human-readable label.
    pub long_name: String,
    /// Physical units.
    pub units: String,
    /// Sentinel stored in cells that were never written.
    pub missing_value: f64,
    /// Numeric storage precision.
    pub precision: Precision,
    /// Storage dimensionality class.
    pub dimensions: DimensionClass,
    /// Free-text description of the variable type.
    pub type_description: String,
    /// Free-text description of the location type (e.g. "Point").
    pub location_type: String,
}

impl VariableDefinition {
    /// A double-precision ensemble forecast variable with the given
    /// identity; refine with the `with_*` builders.
    pub fn new(
        name: impl Into<String>,
        long_name: impl Into<String>,
        units: impl Into<String>,
        missing_value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            long_name: long_name.into(),
            units: units.into(),
            missing_value,
            precision: Precision::Double,
            dimensions: DimensionClass::EnsembleForecast,
            type_description: String::new(),
            location_type: "Point".to_string(),
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_dimensions(mut self, dimensions: DimensionClass) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_type_description(mut self, description: impl Into<String>) -> Self {
        self.type_description = description.into();
        self
    }

    pub fn with_location_type(mut self, location_type: impl Into<String>) -> Self {
        self.location_type = location_type.into();
        self
    }
}

/// Mapping from variable name to schema, fixed at store creation.
///
/// Definition order is preserved; it determines array creation order and
/// the persisted catalog layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableCatalog {
    variables: Vec<VariableDefinition>,
}

impl VariableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a table of definitions.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = VariableDefinition>,
    ) -> Result<Self> {
        let mut catalog = Self::new();
        for def in definitions {
            catalog.define(def)?;
        }
        Ok(catalog)
    }

    /// Register a variable definition.
    pub fn define(&mut self, definition: VariableDefinition) -> Result<()> {
        if definition.name.is_empty() {
            return Err(EftsStoreError::schema("variable name is empty"));
        }
        if efts_common::conventions::is_reserved_name(&definition.name) {
            return Err(EftsStoreError::schema(format!(
                "variable name '{}' is reserved by the dataset conventions",
                definition.name
            )));
        }
        if self.variables.iter().any(|v| v.name == definition.name) {
            return Err(EftsStoreError::schema(format!(
                "variable '{}' is already defined",
                definition.name
            )));
        }
        self.variables.push(definition);
        Ok(())
    }

    /// Look up a variable by name, exact match.
    pub fn lookup(&self, name: &str) -> Result<&VariableDefinition> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| EftsStoreError::UnknownVariable(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableDefinition> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
