//! PostGIS geometry values
//!
//! PostGIS sends `geometry` columns in binary as EWKB: WKB with optional
//! flag bits in the type word for SRID, Z and M. We keep the raw bytes and
//! decode only the POINT case, which is all the probes need.

use crate::error::{DbError, DbResult};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, Type};

const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const WKB_POINT: u32 = 1;

/// A raw `geometry` column value
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    ewkb: Vec<u8>,
}

/// A decoded 2D point (extra Z/M ordinates are dropped)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub srid: Option<i32>,
}

impl Geometry {
    /// Wrap EWKB bytes as received from the server
    pub fn from_ewkb(ewkb: Vec<u8>) -> Self {
        Self { ewkb }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.ewkb
    }

    /// Decode as a POINT.
    ///
    /// # Errors
    /// Returns `DbError::TypeConversion` for truncated input, an unknown
    /// byte order, or a geometry type other than POINT.
    pub fn to_point(&self) -> DbResult<Point> {
        let mut reader = Reader::new(&self.ewkb)?;

        let type_word = reader.u32()?;
        let base_type = type_word & 0x0FFF_FFFF;
        // ISO WKB encodes Z/M as +1000/+2000/+3000 on the base type
        let (iso_z, iso_m) = match base_type / 1000 {
            1 => (true, false),
            2 => (false, true),
            3 => (true, true),
            _ => (false, false),
        };
        if base_type % 1000 != WKB_POINT {
            return Err(DbError::TypeConversion(format!(
                "expected POINT geometry, got WKB type {}",
                base_type
            )));
        }

        let srid = if type_word & EWKB_SRID_FLAG != 0 {
            Some(reader.u32()? as i32)
        } else {
            None
        };

        let x = reader.f64()?;
        let y = reader.f64()?;
        if type_word & EWKB_Z_FLAG != 0 || iso_z {
            reader.f64()?;
        }
        if type_word & EWKB_M_FLAG != 0 || iso_m {
            reader.f64()?;
        }

        Ok(Point { x, y, srid })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_point() {
            Ok(point) => write!(f, "{}", point),
            Err(_) => write!(f, "<geometry {} bytes>", self.ewkb.len()),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(srid) = self.srid {
            write!(f, "SRID={};", srid)?;
        }
        write!(f, "POINT({} {})", self.x, self.y)
    }
}

impl<'a> FromSql<'a> for Geometry {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Geometry::from_ewkb(raw.to_vec()))
    }

    // PostGIS types have no fixed OID, so match on the name
    fn accepts(ty: &Type) -> bool {
        ty.name() == "geometry"
    }
}

/// Whether a column type is the PostGIS geometry type
pub fn is_geometry_type(ty: &Type) -> bool {
    <Geometry as FromSql<'_>>::accepts(ty)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> DbResult<Self> {
        let little_endian = match buf.first() {
            Some(0) => false,
            Some(1) => true,
            Some(other) => {
                return Err(DbError::TypeConversion(format!(
                    "invalid WKB byte order marker {}",
                    other
                )));
            }
            None => return Err(DbError::TypeConversion("empty geometry".into())),
        };
        Ok(Self {
            buf,
            pos: 1,
            little_endian,
        })
    }

    fn take<const N: usize>(&mut self) -> DbResult<[u8; N]> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + N)
            .ok_or_else(|| DbError::TypeConversion("truncated geometry".into()))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u32(&mut self) -> DbResult<u32> {
        let bytes = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn f64(&mut self) -> DbResult<f64> {
        let bytes = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }
}
