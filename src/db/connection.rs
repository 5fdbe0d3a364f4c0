//! Probe connection handle
//!
//! One handle per test. It owns the tokio-postgres client and the task
//! driving the socket; dropping the handle closes the connection, so
//! release happens on every exit path including a panicking assertion.

use crate::config::{ConnectionParams, SslMode};
use crate::error::{DbError, DbResult, pg_error_message};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Connection, NoTls, Row};
use tracing::{debug, info, warn};

/// Lifecycle of a [`ProbeConnection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Closed,
}

/// A single database connection used by one probe run
pub struct ProbeConnection {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
    endpoint: String,
}

impl ProbeConnection {
    /// Connect to the database described by `params`.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionFailed` if the server is unreachable or
    /// rejects the credentials.
    pub async fn connect(params: &ConnectionParams) -> DbResult<Self> {
        let config = params.pg_config();
        let endpoint = params.connection_string();
        info!(%endpoint, "connecting");

        let (client, driver) = match params.ssl_mode {
            SslMode::Disable => {
                let (client, connection) = config
                    .connect(NoTls)
                    .await
                    .map_err(|e| DbError::ConnectionFailed(pg_error_message(&e)))?;
                (client, spawn_driver(connection))
            }
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config()?);
                let (client, connection) = config
                    .connect(tls)
                    .await
                    .map_err(|e| DbError::ConnectionFailed(pg_error_message(&e)))?;
                (client, spawn_driver(connection))
            }
        };

        info!(%endpoint, "connected");
        Ok(Self {
            client: Some(client),
            driver: Some(driver),
            endpoint,
        })
    }

    pub fn state(&self) -> ConnectionState {
        match &self.client {
            Some(client) if !client.is_closed() => ConnectionState::Connected,
            _ => ConnectionState::Closed,
        }
    }

    fn client(&self) -> DbResult<&Client> {
        self.client
            .as_ref()
            .filter(|c| !c.is_closed())
            .ok_or(DbError::NotConnected)
    }

    /// Run a statement and return all rows
    pub async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        debug!(sql, "query");
        Ok(self.client()?.query(sql, params).await?)
    }

    /// Run a statement expected to return at most one row
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<Option<Row>> {
        debug!(sql, "query_opt");
        Ok(self.client()?.query_opt(sql, params).await?)
    }

    /// Run a statement expected to return exactly one row
    pub async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Row> {
        debug!(sql, "query_one");
        Ok(self.client()?.query_one(sql, params).await?)
    }

    /// Run a statement and return the number of affected rows
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        debug!(sql, "execute");
        let affected = self.client()?.execute(sql, params).await?;
        debug!(affected, "execute done");
        Ok(affected)
    }

    /// Close the connection and wait for the driver task to finish.
    ///
    /// Calling this more than once is a no-op.
    pub async fn close(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        // Dropping the last client makes the driver send Terminate and exit
        drop(client);
        if let Some(driver) = self.driver.take()
            && let Err(e) = driver.await
        {
            warn!(endpoint = %self.endpoint, error = %e, "connection task did not exit cleanly");
        }
        info!(endpoint = %self.endpoint, "connection closed");
    }
}

impl Drop for ProbeConnection {
    fn drop(&mut self) {
        if self.client.is_some() {
            debug!(endpoint = %self.endpoint, "connection released on drop");
        }
    }
}

fn spawn_driver<S, T>(connection: Connection<S, T>) -> JoinHandle<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!(error = %e, "connection lost");
        }
    })
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> DbResult<rustls::ClientConfig> {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }
    debug!(native_roots = loaded, "tls roots loaded");

    // builder() panics if more than one crypto backend is compiled in
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| DbError::ConnectionFailed(format!("TLS setup failed: {}", e)))?
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Ok(config)
}
