//! geoprobe - environment-gated probes for PostGIS-backed PostgreSQL
//!
//! geoprobe checks that a database is ready for spatial work: the
//! connection variables are set, the PostGIS extension is installed, the
//! `company` table has the expected shape, and its insert trigger derives a
//! geometry from latitude/longitude.
//!
//! # Architecture
//!
//! - [`config`]: `tut_*` environment variables and probe settings
//! - [`db`]: Connection handle, cell decoding and PostGIS geometry values
//! - [`probe`]: The four checks run against a live database
//! - [`error`]: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use geoprobe::config::{ConnectionParams, load_settings};
//! use geoprobe::db::ProbeConnection;
//! use geoprobe::probe;
//!
//! # async fn example() -> geoprobe::Result<()> {
//! // Fails before any network I/O if a tut_* variable is missing
//! let params = ConnectionParams::from_env()?;
//! let settings = load_settings()?;
//!
//! let mut conn = ProbeConnection::connect(&params).await?;
//! probe::check_extension(&conn, &settings.extension).await?;
//! probe::check_columns(&conn, &settings.table, &probe::EXPECTED_COLUMNS).await?;
//!
//! let row = probe::round_trip_trigger(&conn, &settings.table, &settings.fixture).await?;
//! println!("trigger produced {}", row);
//!
//! conn.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod probe;

pub use error::{CheckError, ConfigError, DbError, GeoprobeError, Result};
