//! Environment-sourced connection parameters
//!
//! The four `tut_*` variables must all be present and non-empty before a
//! connection is attempted. Validation reports every missing variable at
//! once rather than stopping at the first.

use crate::error::{ConfigError, ConfigResult};
use std::fmt;

/// Variables that must resolve to a non-empty value
pub const REQUIRED_VARS: [&str; 4] = ["tut_user", "tut_password", "tut_port", "tut_dbname"];

/// Optional host override (defaults to `localhost`)
pub const HOST_VAR: &str = "tut_host";

/// Optional TLS mode (`disable`, `prefer`, `require`)
pub const SSLMODE_VAR: &str = "tut_sslmode";

const DEFAULT_HOST: &str = "localhost";

/// Database connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Username
    pub user: String,

    /// Password
    pub password: String,

    /// SSL mode
    pub ssl_mode: SslMode,
}

/// SSL connection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    #[default]
    Disable,
    Prefer,
    Require,
}

impl SslMode {
    fn parse(value: &str) -> ConfigResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(ConfigError::Invalid(format!(
                "{} must be disable, prefer or require (got '{}')",
                SSLMODE_VAR, other
            ))),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

/// Names of required variables that are unset or blank, in declaration order
pub fn missing_vars<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    REQUIRED_VARS
        .into_iter()
        .filter(|&name| lookup(name).is_none_or(|v| v.trim().is_empty()))
        .map(|name| name.to_string())
        .collect()
}

impl ConnectionParams {
    /// Build parameters from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build parameters from an arbitrary variable source.
    ///
    /// Fails with [`ConfigError::MissingVars`] naming every absent required
    /// variable, or [`ConfigError::Invalid`] for a malformed port or SSL mode.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing = missing_vars(&lookup);
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        // Presence was checked above
        let required = |name: &str| lookup(name).unwrap_or_default();

        let port_raw = required("tut_port");
        let port = port_raw
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ConfigError::Invalid(format!("Invalid port: {}", port_raw)))?;

        let host = lookup(HOST_VAR)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let ssl_mode = match lookup(SSLMODE_VAR).filter(|s| !s.trim().is_empty()) {
            Some(raw) => SslMode::parse(&raw)?,
            None => SslMode::default(),
        };

        Ok(Self {
            host,
            port,
            database: required("tut_dbname"),
            user: required("tut_user"),
            password: required("tut_password"),
            ssl_mode,
        })
    }

    /// Build a PostgreSQL connection string (without password)
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} sslmode={}",
            self.host,
            self.port,
            self.database,
            self.user,
            self.ssl_mode.as_str()
        )
    }

    /// Build a driver config including the password
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password)
            .application_name("geoprobe")
            .ssl_mode(match self.ssl_mode {
                SslMode::Disable => tokio_postgres::config::SslMode::Disable,
                SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
                SslMode::Require => tokio_postgres::config::SslMode::Require,
            });
        config
    }
}

// Keep the password out of logs and panic messages
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}
