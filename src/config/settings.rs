//! Probe settings
//!
//! Names the table, extension and fixture row the probes work against.
//! Loaded from the TOML file named by `tut_probe_config` if set; every
//! field falls back to its default otherwise.

use crate::error::ConfigResult;
use serde::Deserialize;
use std::path::Path;

/// Environment variable pointing at an optional settings file
pub const SETTINGS_VAR: &str = "tut_probe_config";

/// Probe settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbeSettings {
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default)]
    pub fixture: Fixture,
}

/// The row inserted, read back and deleted by the round-trip probes
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fixture {
    #[serde(default = "default_fixture_id")]
    pub id: i64,

    #[serde(default = "default_fixture_name")]
    pub name: String,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default = "default_srid")]
    pub srid: i32,
}

fn default_extension() -> String {
    "postgis".to_string()
}

fn default_table() -> String {
    "company".to_string()
}

fn default_fixture_id() -> i64 {
    10001
}

fn default_fixture_name() -> String {
    "geosimple".to_string()
}

fn default_latitude() -> f64 {
    45.543
}

fn default_longitude() -> f64 {
    -74.456
}

fn default_srid() -> i32 {
    4326
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            table: default_table(),
            fixture: Fixture::default(),
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            id: default_fixture_id(),
            name: default_fixture_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            srid: default_srid(),
        }
    }
}

impl ProbeSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read settings from a TOML file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Load settings from the file named by `tut_probe_config`, or defaults
pub fn load_settings() -> ConfigResult<ProbeSettings> {
    match std::env::var(SETTINGS_VAR) {
        Ok(path) if !path.trim().is_empty() => {
            tracing::debug!(path = %path, "loading probe settings");
            ProbeSettings::from_file(Path::new(path.trim()))
        }
        _ => Ok(ProbeSettings::default()),
    }
}
