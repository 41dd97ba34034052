//! Shared fixtures for EFTS store integration tests.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use efts_common::conventions::DatasetAttributes;
use efts_common::{StationIds, TimeAxisSpec, TimeUnit};
use efts_store::{EftsStore, EftsStoreConfig, EnsembleBlock, VariableCatalog, VariableDefinition};

pub const MISSING: f64 = -999.0;
pub const N_LEAD: usize = 4;
pub const N_ENS: usize = 3;

pub fn axis_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 8, 1, 12, 0, 0).unwrap()
}

/// A 10-step issue-time axis starting at `axis_start`, one `unit` per step.
pub fn test_axis(unit: TimeUnit) -> TimeAxisSpec {
    TimeAxisSpec::new(axis_start(), unit, 1, 10)
}

pub fn test_catalog() -> VariableCatalog {
    VariableCatalog::from_definitions([
        VariableDefinition::new(
            "variable_1_fcast_ens",
            "ensemble forecast of variable 1",
            "mm",
            MISSING,
        ),
        VariableDefinition::new(
            "variable_2_fcast_ens",
            "ensemble forecast of variable 2",
            "mm",
            MISSING,
        ),
    ])
    .expect("fixture catalog is valid")
}

pub fn numeric_stations() -> StationIds {
    StationIds::Numeric(vec![123, 456])
}

pub fn dataset_attrs() -> DatasetAttributes {
    DatasetAttributes::new(
        "EFTS integration test dataset",
        "test suite",
        "synthetic",
        "",
        "generated by integration tests",
    )
}

pub fn create_store(path: &Path, unit: TimeUnit) -> EftsStore {
    EftsStore::create(
        path,
        test_axis(unit),
        test_catalog(),
        numeric_stations(),
        N_LEAD,
        N_ENS,
        unit,
        dataset_attrs(),
        EftsStoreConfig::default(),
    )
    .expect("Failed to create store")
}

/// Values 1..=12 shaped 4 lead times x 3 members, row-major.
pub fn block_a() -> EnsembleBlock {
    EnsembleBlock::new((1..=12).map(f64::from).collect(), N_LEAD, N_ENS)
        .expect("fixture block is well shaped")
}

/// Values 13..=24 shaped 4 lead times x 3 members, row-major.
pub fn block_b() -> EnsembleBlock {
    EnsembleBlock::new((13..=24).map(f64::from).collect(), N_LEAD, N_ENS)
        .expect("fixture block is well shaped")
}
