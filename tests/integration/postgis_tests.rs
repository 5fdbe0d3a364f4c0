//! Live probes against a PostGIS database
//!
//! Each test opens its own connection and closes it before asserting, so
//! teardown happens whether or not the probe passed. A panic before
//! `close` still releases the connection when the handle drops.

use crate::common;
use geoprobe::db::company;
use geoprobe::db::{COMPANY_COLUMNS, ConnectionState};
use geoprobe::probe::{self, EXPECTED_COLUMNS};
use geoprobe::{CheckError, DbError, GeoprobeError};

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_db_postgis() {
    let (mut conn, settings) = common::setup().await;

    let result = probe::check_extension(&conn, &settings.extension).await;

    conn.close().await;
    if let Err(e) = result {
        panic!("{}", e);
    }
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_missing_extension_is_reported() {
    let (mut conn, _) = common::setup().await;

    let result = probe::check_extension(&conn, "no_such_extension_geoprobe").await;

    conn.close().await;
    match result {
        Err(GeoprobeError::Check(CheckError::ExtensionMissing(name))) => {
            assert_eq!(name, "no_such_extension_geoprobe")
        }
        other => panic!("Expected ExtensionMissing, got {:?}", other),
    }
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_db_rel_comp() {
    let (mut conn, settings) = common::setup().await;

    let result = probe::check_columns(&conn, &settings.table, &EXPECTED_COLUMNS).await;

    conn.close().await;
    if let Err(e) = result {
        panic!("{}", e);
    }
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_absent_column_is_reported() {
    let (mut conn, settings) = common::setup().await;

    let mut expected = EXPECTED_COLUMNS.to_vec();
    expected.push("no_such_column");
    let result = probe::check_columns(&conn, &settings.table, &expected).await;

    conn.close().await;
    match result {
        Err(GeoprobeError::Check(CheckError::ColumnsMissing { missing, .. })) => {
            assert_eq!(missing, vec!["no_such_column"])
        }
        other => panic!("Expected ColumnsMissing, got {:?}", other),
    }
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_insert_rel_comp() {
    let _guard = common::fixture_lock().await;
    let (mut conn, settings) = common::setup().await;

    let result = probe::round_trip_with_geometry(&conn, &settings.table, &settings.fixture).await;

    conn.close().await;
    let row = match result {
        Ok(row) => row,
        Err(e) => panic!("{}", e),
    };
    assert_eq!(row.id, settings.fixture.id);
    assert_eq!(row.name, settings.fixture.name);
    let point = row.geom.expect("geometry present").to_point().unwrap();
    assert_eq!(point.srid, Some(settings.fixture.srid));
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_trigger_insert_rel_comp() {
    let _guard = common::fixture_lock().await;
    let (mut conn, settings) = common::setup().await;

    let result = probe::round_trip_trigger(&conn, &settings.table, &settings.fixture).await;

    conn.close().await;
    let row = match result {
        Ok(row) => row,
        Err(e) => panic!("{}", e),
    };
    assert!(row.geom.is_some(), "trigger should have derived geom");
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_round_trip_twice_leaves_no_rows() {
    let _guard = common::fixture_lock().await;
    let (mut conn, settings) = common::setup().await;
    let table = settings.table.as_str();
    let fixture = &settings.fixture;

    let first = probe::round_trip_with_geometry(&conn, table, fixture).await;
    let second = probe::round_trip_trigger(&conn, table, fixture).await;
    let remaining = company::count(&conn, table, fixture.id).await;

    conn.close().await;
    if let Err(e) = first.and(second) {
        panic!("{}", e);
    }
    assert_eq!(remaining.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_occupied_fixture_id_is_reported() {
    let _guard = common::fixture_lock().await;
    let (mut conn, settings) = common::setup().await;
    let table = settings.table.as_str();
    let fixture = &settings.fixture;

    let inserted = company::insert(&conn, table, fixture, company::GeometrySource::Trigger).await;
    let result = probe::round_trip_with_geometry(&conn, table, fixture).await;
    let untouched = company::count(&conn, table, fixture.id).await;
    let deleted = company::delete(&conn, table, fixture.id).await;

    conn.close().await;
    assert_eq!(inserted.unwrap(), 1);
    match result {
        Err(GeoprobeError::Check(CheckError::FixtureOccupied { id, count })) => {
            assert_eq!(id, fixture.id);
            assert_eq!(count, 1);
        }
        other => panic!("Expected FixtureOccupied, got {:?}", other),
    }
    // The pre-existing row is left alone
    assert_eq!(untouched.unwrap(), 1);
    assert_eq!(deleted.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_unknown_table_error_names_relation() {
    let (mut conn, settings) = common::setup().await;

    let result = probe::round_trip_trigger(&conn, "no_such_table_geoprobe", &settings.fixture).await;

    conn.close().await;
    match result {
        Err(GeoprobeError::Database(DbError::QueryFailed(msg))) => {
            assert!(msg.starts_with("42P01"), "missing SQLSTATE: {}", msg);
            assert!(msg.contains("no_such_table_geoprobe"), "missing relation: {}", msg);
        }
        other => panic!("Expected QueryFailed, got {:?}", other),
    }
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_select_star_has_five_columns() {
    let _guard = common::fixture_lock().await;
    let (mut conn, settings) = common::setup().await;
    let table = settings.table.as_str();
    let fixture = &settings.fixture;

    let inserted = company::insert(&conn, table, fixture, company::GeometrySource::Trigger).await;
    let fetched = company::fetch(&conn, table, fixture.id).await;
    let deleted = company::delete(&conn, table, fixture.id).await;

    conn.close().await;
    assert_eq!(inserted.unwrap(), 1);
    let row = fetched.unwrap().expect("row inserted above");
    assert_eq!(row.len(), COMPANY_COLUMNS);
    // Delete targets the inserted id, not a different literal
    assert_eq!(deleted.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a PostGIS database configured via tut_* variables"]
async fn test_closed_connection_rejects_queries() {
    let (mut conn, _) = common::setup().await;
    assert_eq!(conn.state(), ConnectionState::Connected);

    conn.close().await;
    conn.close().await;
    assert_eq!(conn.state(), ConnectionState::Closed);

    match probe::installed_extensions(&conn).await {
        Err(GeoprobeError::Database(DbError::NotConnected)) => {}
        other => panic!("Expected NotConnected, got {:?}", other),
    }
}
