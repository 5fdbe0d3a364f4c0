//! Common test utilities and helpers
//!
//! Shared setup for the live database tests.

use anyhow::Context;
use geoprobe::config::{ConnectionParams, ProbeSettings, load_settings};
use geoprobe::db::ProbeConnection;
use tokio::sync::{Mutex, MutexGuard};
use tracing_subscriber::EnvFilter;

/// Serializes tests that insert the shared fixture row
static FIXTURE_LOCK: Mutex<()> = Mutex::const_new(());

/// Install a test-friendly subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geoprobe=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Validate the environment and open a connection.
///
/// A missing `tut_*` variable fails here, before any network I/O.
pub async fn try_setup() -> anyhow::Result<(ProbeConnection, ProbeSettings)> {
    init_tracing();
    let params = ConnectionParams::from_env().context("environment not configured")?;
    let settings = load_settings().context("failed to load probe settings")?;
    let conn = ProbeConnection::connect(&params)
        .await
        .with_context(|| format!("cannot reach {}", params.connection_string()))?;
    Ok((conn, settings))
}

/// [`try_setup`], panicking with the full error chain on failure
pub async fn setup() -> (ProbeConnection, ProbeSettings) {
    match try_setup().await {
        Ok(pair) => pair,
        Err(e) => panic!("setup failed: {:#}", e),
    }
}

/// Hold while inserting the fixture row
pub async fn fixture_lock() -> MutexGuard<'static, ()> {
    FIXTURE_LOCK.lock().await
}
