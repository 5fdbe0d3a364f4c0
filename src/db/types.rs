//! Cell decoding
//!
//! The probes run `SELECT *` against a table whose exact column types are
//! owned elsewhere, so values are decoded by the type the server reports
//! rather than by a fixed Rust type.

use crate::db::geometry::{Geometry, is_geometry_type};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::Type;

/// A single decoded column value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// NULL value
    Null,

    /// Any integer type
    Integer(i64),

    /// `real`, `double precision` or `numeric`
    Float(f64),

    /// Text-like types
    Text(String),

    /// PostGIS geometry
    Geometry(Geometry),

    /// A type we have no mapping for (holds the type name)
    Unsupported(String),
}

impl CellValue {
    /// Check if this is a NULL value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for mismatch messages
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Integer(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::Text(_) => "text",
            CellValue::Geometry(_) => "geometry",
            CellValue::Unsupported(_) => "unsupported",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "'{}'", s),
            CellValue::Geometry(g) => write!(f, "{}", g),
            CellValue::Unsupported(t) => write!(f, "<{}>", t),
        }
    }
}

/// Extract a cell value from a row based on the column's reported type.
///
/// Falls back to a text read for types without a direct mapping, and to
/// `CellValue::Unsupported` when even that fails.
pub fn extract_cell_value(row: &Row, idx: usize) -> CellValue {
    let Some(column) = row.columns().get(idx) else {
        return CellValue::Unsupported("missing column".to_string());
    };
    let ty = column.type_();

    if is_geometry_type(ty) {
        return match row.try_get::<_, Option<Geometry>>(idx) {
            Ok(Some(g)) => CellValue::Geometry(g),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        };
    }

    match *ty {
        Type::INT2 => match row.try_get::<_, Option<i16>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v as i64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::INT4 => match row.try_get::<_, Option<i32>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v as i64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::INT8 => match row.try_get::<_, Option<i64>>(idx) {
            Ok(Some(v)) => CellValue::Integer(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::FLOAT4 => match row.try_get::<_, Option<f32>>(idx) {
            Ok(Some(v)) => CellValue::Float(v as f64),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::FLOAT8 => match row.try_get::<_, Option<f64>>(idx) {
            Ok(Some(v)) => CellValue::Float(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        Type::NUMERIC => match row.try_get::<_, Option<Decimal>>(idx) {
            Ok(Some(v)) => match v.to_f64() {
                Some(f) => CellValue::Float(f),
                None => CellValue::Text(v.to_string()),
            },
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        },
        // Text types and fallback for unknown types
        _ => try_as_string(row, idx),
    }
}

/// Decode every column of a row in order
pub fn extract_row(row: &Row) -> Vec<CellValue> {
    (0..row.len()).map(|i| extract_cell_value(row, i)).collect()
}

/// Try to extract a value as a string (fallback for type mismatches).
fn try_as_string(row: &Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::Text(v),
        Ok(None) => CellValue::Null,
        Err(_) => {
            let type_name = row
                .columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name());
            CellValue::Unsupported(type_name.to_string())
        }
    }
}
