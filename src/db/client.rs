use anyhow::{Context, Result};
use std::time::Duration;
use tiberius::Client;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use crate::config::ConnectionSettings;
use crate::db::connection::build_config;
use crate::error::{AppError, ErrorKind};

pub type SqlClient = Client<Compat<TcpStream>>;

/// Open a TDS session against the configured instance. Both the TCP connect
/// and the login handshake are bounded by the configured timeout.
pub async fn connect(settings: &ConnectionSettings) -> Result<SqlClient> {
    let config = build_config(settings)?;
    let addr = format!("{}:{}", settings.server, settings.port);
    let connect_timeout = Duration::from_millis(settings.timeout_ms);

    debug!(server = %settings.server, port = settings.port, database = %settings.database, "connecting");

    let tcp = timeout(connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| {
            AppError::new(
                ErrorKind::Connection,
                format!("connection to {addr} timed out after {}ms", settings.timeout_ms),
            )
        })?
        .with_context(|| format!("failed to open TCP connection to {addr}"))?;
    tcp.set_nodelay(true)
        .context("failed to set TCP_NODELAY on connection")?;

    let client = timeout(connect_timeout, Client::connect(config, tcp.compat_write()))
        .await
        .map_err(|_| {
            AppError::new(
                ErrorKind::Connection,
                format!("login to {addr} timed out after {}ms", settings.timeout_ms),
            )
        })?
        .map_err(|err| {
            AppError::new(ErrorKind::Connection, format!("login to {addr} failed: {err}"))
        })?;

    debug!(server = %settings.server, "connected");
    Ok(client)
}
