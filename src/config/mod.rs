//! Configuration management
//!
//! Connection parameters come from the process environment; probe settings
//! come from an optional TOML file.

pub mod env;
pub mod settings;

pub use env::{ConnectionParams, REQUIRED_VARS, SslMode, missing_vars};
pub use settings::{Fixture, ProbeSettings, load_settings};
