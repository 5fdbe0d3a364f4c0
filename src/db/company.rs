//! The `company` table
//!
//! Row type plus the statements the round-trip probes issue. The table is
//! owned outside this crate: `(id, name, latitude, longitude, geom)` with
//! an insert trigger that fills `geom` when it is not supplied.

use crate::config::Fixture;
use crate::db::connection::ProbeConnection;
use crate::db::geometry::Geometry;
use crate::db::types::{CellValue, extract_row};
use crate::error::{DbError, DbResult};
use std::fmt;
use tokio_postgres::Row;

/// Number of columns in a `company` row
pub const COMPANY_COLUMNS: usize = 5;

/// How the geometry column gets its value on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// Built client-side with `ST_SetSRID(ST_MakePoint(lon, lat), srid)`
    Explicit,
    /// Left out of the insert so the table trigger derives it
    Trigger,
}

/// A row of the `company` table
#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub geom: Option<Geometry>,
}

impl Company {
    /// Decode a `SELECT *` row positionally.
    ///
    /// # Errors
    /// Returns `DbError::TypeConversion` if the row has fewer than
    /// [`COMPANY_COLUMNS`] columns or a column has an unexpected type.
    pub fn from_row(row: &Row) -> DbResult<Self> {
        Self::from_cells(extract_row(row))
    }

    pub fn from_cells(cells: Vec<CellValue>) -> DbResult<Self> {
        if cells.len() < COMPANY_COLUMNS {
            return Err(DbError::TypeConversion(format!(
                "company row has {} columns, expected {}",
                cells.len(),
                COMPANY_COLUMNS
            )));
        }
        let mut cells = cells.into_iter();
        let mut next = || cells.next().unwrap_or(CellValue::Null);

        let id = next();
        let id = id.as_i64().ok_or_else(|| unexpected("id", &id))?;

        let name = match next() {
            CellValue::Text(s) => s,
            other => return Err(unexpected("name", &other)),
        };

        let latitude = next();
        let latitude = latitude
            .as_f64()
            .ok_or_else(|| unexpected("latitude", &latitude))?;

        let longitude = next();
        let longitude = longitude
            .as_f64()
            .ok_or_else(|| unexpected("longitude", &longitude))?;

        let geom = match next() {
            CellValue::Geometry(g) => Some(g),
            CellValue::Null => None,
            other => return Err(unexpected("geom", &other)),
        };

        Ok(Self {
            id,
            name,
            latitude,
            longitude,
            geom,
        })
    }
}

fn unexpected(field: &str, value: &CellValue) -> DbError {
    DbError::TypeConversion(format!(
        "column '{}' holds {} value {}",
        field,
        value.kind(),
        value
    ))
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, '{}', {}, {}, ",
            self.id, self.name, self.latitude, self.longitude
        )?;
        match &self.geom {
            Some(g) => write!(f, "{})", g),
            None => write!(f, "NULL)"),
        }
    }
}

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Insert the fixture row, with or without an explicit geometry
pub async fn insert(
    conn: &ProbeConnection,
    table: &str,
    fixture: &Fixture,
    source: GeometrySource,
) -> DbResult<u64> {
    let table = quote_ident(table);
    match source {
        GeometrySource::Explicit => {
            let sql = format!(
                "INSERT INTO {} (id, name, latitude, longitude, geom) \
                 VALUES ($1::int8, $2::text, $3::float8, $4::float8, \
                         ST_SetSRID(ST_MakePoint($4::float8, $3::float8), $5::int4))",
                table
            );
            conn.execute(
                &sql,
                &[
                    &fixture.id,
                    &fixture.name,
                    &fixture.latitude,
                    &fixture.longitude,
                    &fixture.srid,
                ],
            )
            .await
        }
        GeometrySource::Trigger => {
            let sql = format!(
                "INSERT INTO {} (id, name, latitude, longitude) \
                 VALUES ($1::int8, $2::text, $3::float8, $4::float8)",
                table
            );
            conn.execute(
                &sql,
                &[
                    &fixture.id,
                    &fixture.name,
                    &fixture.latitude,
                    &fixture.longitude,
                ],
            )
            .await
        }
    }
}

/// Fetch the full row for `id`
pub async fn fetch(conn: &ProbeConnection, table: &str, id: i64) -> DbResult<Option<Row>> {
    let sql = format!("SELECT * FROM {} WHERE id = $1::int8", quote_ident(table));
    conn.query_opt(&sql, &[&id]).await
}

/// Delete every row with `id`, returning how many were removed
pub async fn delete(conn: &ProbeConnection, table: &str, id: i64) -> DbResult<u64> {
    let sql = format!("DELETE FROM {} WHERE id = $1::int8", quote_ident(table));
    conn.execute(&sql, &[&id]).await
}

/// Count rows with `id`
pub async fn count(conn: &ProbeConnection, table: &str, id: i64) -> DbResult<i64> {
    let sql = format!(
        "SELECT count(*) FROM {} WHERE id = $1::int8",
        quote_ident(table)
    );
    let row = conn.query_one(&sql, &[&id]).await?;
    Ok(row.try_get::<_, i64>(0)?)
}
