//! Database access
//!
//! Connection handling, cell decoding, PostGIS geometry values and the
//! statements issued against the `company` table.

pub mod company;
pub mod connection;
pub mod geometry;
pub mod types;

// Re-export main types
pub use company::{COMPANY_COLUMNS, Company, GeometrySource};
pub use connection::{ConnectionState, ProbeConnection};
pub use geometry::{Geometry, Point};
pub use types::CellValue;
