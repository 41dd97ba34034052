//! Integration tests: create a store, write forecasts, close it, reopen it
//! and verify that everything reads back exactly.

mod common;

use efts_common::{lead_time_offsets, StationId, StationIds, TimeUnit};
use efts_store::{
    DimensionClass, EftsStore, EftsStoreConfig, Precision, VariableCatalog, VariableDefinition,
};

use common::*;

/// Full create/write/close/reopen cycle at a given lead-time step unit.
fn run_round_trip(unit: TimeUnit, issue_steps: i64) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("test.efts");
    let issue_time = axis_start() + unit.duration(issue_steps);

    let mut store = create_store(&path, unit);
    store
        .put_lead_time_values(&lead_time_offsets(1, N_LEAD, 1).expect("valid axis"))
        .expect("Failed to write lead-time values");

    for (variable, block) in [
        ("variable_1_fcast_ens", block_a()),
        ("variable_2_fcast_ens", block_b()),
    ] {
        for station in [123i64, 456] {
            store
                .put_ensemble_forecasts(&block, variable, &StationId::from(station), issue_time)
                .expect("Failed to write forecast block");
        }
    }
    store.write().expect("Failed to flush");

    // Values are visible through the same handle before close.
    let before = store
        .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(456), issue_time)
        .expect("Failed to read before close");
    assert_eq!(before.value(1, 1), 5.0);

    store.close().expect("Failed to close");
    drop(store);

    let store =
        EftsStore::open(&path, EftsStoreConfig::default()).expect("Failed to reopen store");

    // Structural metadata survives the reopen bit for bit.
    assert_eq!(
        store.dim_names(),
        ["lead_time", "station", "ens_member", "time", "str_len"]
    );
    let dims = store.dim_sizes();
    assert_eq!(dims.lead_time, N_LEAD);
    assert_eq!(dims.ens_member, N_ENS);
    assert_eq!(dims.station, 2);
    assert_eq!(dims.time, 10);
    assert_eq!(dims.str_len, 0);
    assert_eq!(store.station_ids(), &numeric_stations());
    assert_eq!(store.catalog(), &test_catalog());
    assert_eq!(store.dataset_attributes(), &dataset_attrs());
    assert_eq!(store.lead_time_offsets(), [1, 2, 3, 4]);
    assert_eq!(store.lead_time_unit(), unit);
    assert_eq!(store.time_axis()[0], axis_start());
    assert_eq!(store.time_axis().len(), 10);

    let r1 = store
        .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(456), issue_time)
        .expect("Failed to read variable 1");
    assert_eq!(r1.block.shape(), (N_LEAD, N_ENS));
    assert_eq!(r1.value(0, 0), 1.0);
    assert_eq!(r1.value(1, 1), 5.0);
    assert_eq!(r1.value(3, 2), 12.0);

    let r2 = store
        .get_ensemble_forecasts("variable_2_fcast_ens", &StationId::from(123), issue_time)
        .expect("Failed to read variable 2");
    assert_eq!(r2.value(1, 1), 17.0);

    // Each lead-time row is labelled issue_time + offset * unit.
    for (i, offset) in [1i64, 2, 3, 4].into_iter().enumerate() {
        assert_eq!(r1.valid_time(i), issue_time + unit.duration(offset));
    }
}

#[test]
fn test_round_trip_hourly() {
    run_round_trip(TimeUnit::Hours, 6);
}

#[test]
fn test_round_trip_daily() {
    run_round_trip(TimeUnit::Days, 2);
}

#[test]
fn test_strided_lead_time_axis() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("strided.efts");
    let issue_time = axis_start();

    let mut store = create_store(&path, TimeUnit::Hours);
    store
        .put_lead_time_values(&lead_time_offsets(1, N_LEAD, 3).expect("valid axis"))
        .expect("Failed to write lead-time values");
    store
        .put_ensemble_forecasts(
            &block_a(),
            "variable_1_fcast_ens",
            &StationId::from(123),
            issue_time,
        )
        .expect("Failed to write forecast block");
    store.close().expect("Failed to close");

    let store = EftsStore::open(&path, EftsStoreConfig::default()).expect("Failed to reopen");
    assert_eq!(store.lead_time_offsets(), [1, 4, 7, 10]);

    let fetched = store
        .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(123), issue_time)
        .expect("Failed to read");
    for (i, hours) in [1i64, 4, 7, 10].into_iter().enumerate() {
        assert_eq!(fetched.valid_time(i), issue_time + chrono::Duration::hours(hours));
    }
}

#[test]
fn test_unwritten_cells_read_as_missing_value() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sparse.efts");
    let issue_time = axis_start();

    let mut store = create_store(&path, TimeUnit::Hours);
    store
        .put_lead_time_values(&lead_time_offsets(1, N_LEAD, 1).expect("valid axis"))
        .expect("Failed to write lead-time values");
    // Only station 123 gets data; station 456 is never written.
    store
        .put_ensemble_forecasts(
            &block_a(),
            "variable_1_fcast_ens",
            &StationId::from(123),
            issue_time,
        )
        .expect("Failed to write forecast block");
    store.close().expect("Failed to close");

    let store = EftsStore::open(&path, EftsStoreConfig::default()).expect("Failed to reopen");
    let unwritten = store
        .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(456), issue_time)
        .expect("Unwritten slice should still read");
    assert!(unwritten.block.values().iter().all(|&v| v == MISSING));

    let written = store
        .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(123), issue_time)
        .expect("Failed to read written slice");
    assert_eq!(written.value(0, 0), 1.0);
}

#[test]
fn test_last_write_wins() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("overwrite.efts");
    let issue_time = axis_start();

    let mut store = create_store(&path, TimeUnit::Hours);
    store
        .put_lead_time_values(&lead_time_offsets(1, N_LEAD, 1).expect("valid axis"))
        .expect("Failed to write lead-time values");
    for block in [block_a(), block_b()] {
        store
            .put_ensemble_forecasts(
                &block,
                "variable_1_fcast_ens",
                &StationId::from(123),
                issue_time,
            )
            .expect("Failed to write forecast block");
    }

    let fetched = store
        .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(123), issue_time)
        .expect("Failed to read");
    assert_eq!(fetched.block, block_b());
}

#[test]
fn test_reads_are_keyed_by_identifier_not_position() {
    // Two stores with the station coordinate in opposite order; lookups by
    // identifier must return the same values from both.
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let issue_time = axis_start();

    let mut fetched = Vec::new();
    for (name, ids) in [
        ("forward.efts", vec![123i64, 456]),
        ("reversed.efts", vec![456i64, 123]),
    ] {
        let path = temp_dir.path().join(name);
        let mut store = EftsStore::create(
            &path,
            test_axis(TimeUnit::Hours),
            test_catalog(),
            StationIds::Numeric(ids),
            N_LEAD,
            N_ENS,
            TimeUnit::Hours,
            dataset_attrs(),
            EftsStoreConfig::default(),
        )
        .expect("Failed to create store");
        store
            .put_lead_time_values(&lead_time_offsets(1, N_LEAD, 1).expect("valid axis"))
            .expect("Failed to write lead-time values");
        store
            .put_ensemble_forecasts(
                &block_a(),
                "variable_1_fcast_ens",
                &StationId::from(123),
                issue_time,
            )
            .expect("Failed to write forecast block");
        store
            .put_ensemble_forecasts(
                &block_b(),
                "variable_1_fcast_ens",
                &StationId::from(456),
                issue_time,
            )
            .expect("Failed to write forecast block");
        store.close().expect("Failed to close");

        let store = EftsStore::open(&path, EftsStoreConfig::default()).expect("Failed to reopen");
        fetched.push((
            store
                .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(123), issue_time)
                .expect("Failed to read")
                .block,
            store
                .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from(456), issue_time)
                .expect("Failed to read")
                .block,
        ));
    }

    assert_eq!(fetched[0], fetched[1]);
    assert_eq!(fetched[0].0, block_a());
    assert_eq!(fetched[0].1, block_b());
}

#[test]
fn test_float_precision_round_trip() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("float.efts");
    let issue_time = axis_start();

    let catalog = VariableCatalog::from_definitions([VariableDefinition::new(
        "rain_fcast_ens",
        "rainfall ensemble forecast",
        "mm",
        MISSING,
    )
    .with_precision(Precision::Float)])
    .expect("valid catalog");

    let mut store = EftsStore::create(
        &path,
        test_axis(TimeUnit::Hours),
        catalog,
        numeric_stations(),
        N_LEAD,
        N_ENS,
        TimeUnit::Hours,
        dataset_attrs(),
        EftsStoreConfig::default(),
    )
    .expect("Failed to create store");
    store
        .put_lead_time_values(&lead_time_offsets(1, N_LEAD, 1).expect("valid axis"))
        .expect("Failed to write lead-time values");
    store
        .put_ensemble_forecasts(&block_a(), "rain_fcast_ens", &StationId::from(123), issue_time)
        .expect("Failed to write forecast block");
    store.close().expect("Failed to close");

    let store = EftsStore::open(&path, EftsStoreConfig::default()).expect("Failed to reopen");
    let def = store.catalog().lookup("rain_fcast_ens").expect("variable exists");
    assert_eq!(def.precision, Precision::Float);

    // Small integers are exact in f32, so equality holds through the cast.
    let fetched = store
        .get_ensemble_forecasts("rain_fcast_ens", &StationId::from(123), issue_time)
        .expect("Failed to read");
    assert_eq!(fetched.block, block_a());
}

#[test]
fn test_textual_station_identifiers() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("text_ids.efts");
    let issue_time = axis_start();
    let ids = StationIds::Text(vec!["gauge_a".to_string(), "g2".to_string()]);

    let mut store = EftsStore::create(
        &path,
        test_axis(TimeUnit::Hours),
        test_catalog(),
        ids.clone(),
        N_LEAD,
        N_ENS,
        TimeUnit::Hours,
        dataset_attrs(),
        EftsStoreConfig::default(),
    )
    .expect("Failed to create store");
    store
        .put_lead_time_values(&lead_time_offsets(1, N_LEAD, 1).expect("valid axis"))
        .expect("Failed to write lead-time values");
    store
        .put_ensemble_forecasts(
            &block_a(),
            "variable_1_fcast_ens",
            &StationId::from("gauge_a"),
            issue_time,
        )
        .expect("Failed to write forecast block");
    store.close().expect("Failed to close");

    let store = EftsStore::open(&path, EftsStoreConfig::default()).expect("Failed to reopen");
    assert_eq!(store.station_ids(), &ids);
    assert_eq!(store.dim_sizes().str_len, 7);

    let fetched = store
        .get_ensemble_forecasts("variable_1_fcast_ens", &StationId::from("gauge_a"), issue_time)
        .expect("Failed to read");
    assert_eq!(fetched.block, block_a());
}

#[test]
fn test_station_scalar_round_trip() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("scalars.efts");

    let catalog = VariableCatalog::from_definitions([
        VariableDefinition::new(
            "variable_1_fcast_ens",
            "ensemble forecast of variable 1",
            "mm",
            MISSING,
        ),
        VariableDefinition::new("drainage_area", "catchment drainage area", "km^2", -1.0)
            .with_dimensions(DimensionClass::StationScalar),
    ])
    .expect("valid catalog");

    let mut store = EftsStore::create(
        &path,
        test_axis(TimeUnit::Hours),
        catalog,
        numeric_stations(),
        N_LEAD,
        N_ENS,
        TimeUnit::Hours,
        dataset_attrs(),
        EftsStoreConfig::default(),
    )
    .expect("Failed to create store");
    store
        .put_station_values("drainage_area", &[120.5, 340.0])
        .expect("Failed to write station values");
    store.close().expect("Failed to close");

    let store = EftsStore::open(&path, EftsStoreConfig::default()).expect("Failed to reopen");
    assert_eq!(
        store.get_station_values("drainage_area").expect("Failed to read"),
        vec![120.5, 340.0]
    );
    assert_eq!(
        store
            .get_station_value("drainage_area", &StationId::from(456))
            .expect("Failed to read one station"),
        340.0
    );
}
