//! Database probes
//!
//! Four independent checks against a live PostGIS database. Each takes a
//! connected [`ProbeConnection`] and returns `Ok` or the first mismatch it
//! observed. The round-trip probes refuse to start when a row with the
//! fixture id already exists, always attempt cleanup of their own row even
//! after a failed verification, and report leftover rows as a failure.

use crate::config::Fixture;
use crate::db::company::{self, COMPANY_COLUMNS, Company, GeometrySource};
use crate::db::connection::ProbeConnection;
use crate::db::geometry::Point;
use crate::error::{CheckError, CheckResult, Result};
use tracing::{debug, info, warn};

/// Columns the `company` table must have, in any order
pub const EXPECTED_COLUMNS: [&str; 5] = ["id", "name", "latitude", "longitude", "geom"];

/// Tolerance for comparing coordinates read back from `real`/`numeric` columns
pub const FLOAT_TOLERANCE: f64 = 1e-5;

/// Names of every extension installed in the current database
pub async fn installed_extensions(conn: &ProbeConnection) -> Result<Vec<String>> {
    let rows = conn
        .query("SELECT extname::text FROM pg_extension", &[])
        .await?;
    Ok(rows.iter().map(|r| r.get(0)).collect())
}

/// Check that extension `name` is installed
pub async fn check_extension(conn: &ProbeConnection, name: &str) -> Result<()> {
    let installed = installed_extensions(conn).await?;
    debug!(?installed, "installed extensions");
    if !installed.iter().any(|ext| ext == name) {
        return Err(CheckError::ExtensionMissing(name.to_string()).into());
    }
    info!(extension = name, "extension present");
    Ok(())
}

/// Column names of `table` as reported by `information_schema`
pub async fn table_columns(conn: &ProbeConnection, table: &str) -> Result<Vec<String>> {
    let rows = conn
        .query(
            "SELECT column_name::text FROM information_schema.columns WHERE table_name = $1",
            &[&table],
        )
        .await?;
    Ok(rows.iter().map(|r| r.get(0)).collect())
}

/// Expected names absent from `found`, preserving the order of `expected`
pub fn missing_columns(found: &[String], expected: &[&str]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| !found.iter().any(|f| f == *name))
        .map(|name| name.to_string())
        .collect()
}

/// Check that `table` has every column in `expected`
pub async fn check_columns(conn: &ProbeConnection, table: &str, expected: &[&str]) -> Result<()> {
    let found = table_columns(conn, table).await?;
    debug!(table, ?found, "table columns");
    let missing = missing_columns(&found, expected);
    if !missing.is_empty() {
        return Err(CheckError::ColumnsMissing {
            table: table.to_string(),
            missing,
        }
        .into());
    }
    info!(table, "all expected columns present");
    Ok(())
}

/// Insert the fixture with an explicit SRID point, read it back, delete it.
///
/// Verifies the column count, every scalar field, and that the stored
/// geometry is the inserted point.
pub async fn round_trip_with_geometry(
    conn: &ProbeConnection,
    table: &str,
    fixture: &Fixture,
) -> Result<Company> {
    round_trip(conn, table, fixture, GeometrySource::Explicit).await
}

/// Insert the fixture without geometry, read it back, delete it.
///
/// Verifies the column count, every scalar field, and that the table
/// trigger populated the geometry column.
pub async fn round_trip_trigger(
    conn: &ProbeConnection,
    table: &str,
    fixture: &Fixture,
) -> Result<Company> {
    round_trip(conn, table, fixture, GeometrySource::Trigger).await
}

async fn round_trip(
    conn: &ProbeConnection,
    table: &str,
    fixture: &Fixture,
    source: GeometrySource,
) -> Result<Company> {
    // The table is not ours: refuse to touch a row we did not insert
    let existing = company::count(conn, table, fixture.id).await?;
    if existing > 0 {
        warn!(table, id = fixture.id, rows = existing, "fixture id already in use");
        return Err(CheckError::FixtureOccupied {
            id: fixture.id,
            count: existing,
        }
        .into());
    }

    company::insert(conn, table, fixture, source).await?;
    debug!(table, id = fixture.id, ?source, "fixture inserted");

    let verified = read_back(conn, table, fixture, source).await;
    let cleaned = cleanup(conn, table, fixture.id).await;

    let company = verified?;
    cleaned?;
    info!(table, id = fixture.id, ?source, "round trip verified");
    Ok(company)
}

async fn read_back(
    conn: &ProbeConnection,
    table: &str,
    fixture: &Fixture,
    source: GeometrySource,
) -> Result<Company> {
    let row = company::fetch(conn, table, fixture.id)
        .await?
        .ok_or(CheckError::RowNotFound(fixture.id))?;

    if row.len() != COMPANY_COLUMNS {
        return Err(CheckError::ColumnCount {
            expected: COMPANY_COLUMNS,
            actual: row.len(),
        }
        .into());
    }

    let company = Company::from_row(&row)?;
    debug!(row = %company, "read back");

    verify_scalars(fixture, &company)?;
    match source {
        GeometrySource::Explicit => {
            let geom = company
                .geom
                .as_ref()
                .ok_or(CheckError::GeometryMissing(fixture.id))?;
            verify_point(fixture, &geom.to_point()?)?;
        }
        GeometrySource::Trigger => {
            if company.geom.is_none() {
                return Err(CheckError::GeometryMissing(fixture.id).into());
            }
        }
    }
    Ok(company)
}

/// Delete the fixture row and confirm nothing with its id remains
async fn cleanup(conn: &ProbeConnection, table: &str, id: i64) -> Result<()> {
    let deleted = company::delete(conn, table, id).await?;
    let remaining = company::count(conn, table, id).await?;
    debug!(table, id, deleted, remaining, "cleanup");
    if remaining != 0 {
        return Err(CheckError::ResidualRows {
            id,
            count: remaining,
        }
        .into());
    }
    Ok(())
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_TOLERANCE
}

/// Compare the scalar columns of a read-back row with the fixture
pub fn verify_scalars(fixture: &Fixture, company: &Company) -> CheckResult<()> {
    if company.id != fixture.id {
        return Err(mismatch("id", fixture.id, company.id));
    }
    // char(n) columns come back blank-padded
    if company.name.trim_end() != fixture.name {
        return Err(mismatch("name", &fixture.name, &company.name));
    }
    if !approx_eq(company.latitude, fixture.latitude) {
        return Err(mismatch("latitude", fixture.latitude, company.latitude));
    }
    if !approx_eq(company.longitude, fixture.longitude) {
        return Err(mismatch("longitude", fixture.longitude, company.longitude));
    }
    Ok(())
}

/// Compare a decoded point with the fixture's `(longitude, latitude, srid)`
pub fn verify_point(fixture: &Fixture, point: &Point) -> CheckResult<()> {
    let expected = Point {
        x: fixture.longitude,
        y: fixture.latitude,
        srid: Some(fixture.srid),
    };
    let matches = approx_eq(point.x, expected.x)
        && approx_eq(point.y, expected.y)
        && point.srid == expected.srid;
    if !matches {
        return Err(CheckError::GeometryMismatch {
            expected: expected.to_string(),
            actual: point.to_string(),
        });
    }
    Ok(())
}

fn mismatch(
    field: &'static str,
    expected: impl std::fmt::Display,
    actual: impl std::fmt::Display,
) -> CheckError {
    CheckError::FieldMismatch {
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
