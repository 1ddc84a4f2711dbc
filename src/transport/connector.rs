//! Outbound WebSocket connect.
//!
//! Opens the TCP connection to the device and performs the WebSocket
//! upgrade. No subprotocol is requested and no handshake message follows
//! the upgrade; the link is usable as soon as [`connect`] returns.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// WebSocket stream to a device.
pub type DeviceStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// connect
// ============================================================================

/// Connects to the device at `url`.
///
/// # Arguments
///
/// * `url` - Fully formed `ws://` URL
/// * `connect_timeout` - Upper bound for TCP connect plus upgrade, if any
///
/// # Errors
///
/// - [`Error::ConnectionTimeout`] if `connect_timeout` elapsed first
/// - [`Error::Connection`] if the TCP connect or the upgrade failed
pub async fn connect(url: &Url, connect_timeout: Option<Duration>) -> Result<DeviceStream> {
    debug!(url = %url, ?connect_timeout, "Connecting to device");

    let attempt = connect_async(url.as_str());

    let result = match connect_timeout {
        Some(limit) => timeout(limit, attempt)
            .await
            .map_err(|_| Error::connection_timeout(limit.as_millis() as u64))?,
        None => attempt.await,
    };

    let (ws_stream, response) =
        result.map_err(|e| Error::connection(format!("{url}: {e}")))?;

    info!(url = %url, status = %response.status(), "WebSocket connection established");

    Ok(ws_stream)
}

// ============================================================================
// Tests
// ============================================================================
