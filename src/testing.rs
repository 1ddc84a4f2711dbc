//! In-process fake device for tests.
//!
//! Binds a WebSocket server on `127.0.0.1:0` and hands out the accepted
//! link, so tests script the device side frame by frame.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Once;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

use crate::client::{Client, ConnectOptions};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for anything a test waits on.
const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// How long the wire must stay quiet to count as silent.
const SILENCE: Duration = Duration::from_millis(100);

// ============================================================================
// Tracing
// ============================================================================

/// Installs a test subscriber once. Filter with `RUST_LOG`.
pub(crate) fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Polls `condition` until it holds.
///
/// # Panics
///
/// Panics if it does not hold within [`WAIT_LIMIT`].
pub(crate) async fn eventually(condition: impl Fn() -> bool) {
    let waited = timeout(WAIT_LIMIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    assert!(waited.is_ok(), "condition not met within {WAIT_LIMIT:?}");
}

// ============================================================================
// FakeDevice
// ============================================================================

/// A bound, not yet connected device endpoint.
pub(crate) struct FakeDevice {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
}

impl FakeDevice {
    /// Binds to a random localhost port.
    pub(crate) async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        Self { listener, port }
    }

    /// Returns options targeting this device.
    pub(crate) fn options(&self) -> ConnectOptions {
        ConnectOptions::new("127.0.0.1").with_port(self.port)
    }

    /// Returns the WebSocket URL of this device.
    pub(crate) fn url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    /// Accepts one client and completes the upgrade.
    pub(crate) async fn accept(&self) -> DeviceLink {
        let (stream, _) = timeout(WAIT_LIMIT, self.listener.accept())
            .await
            .expect("client did not connect")
            .expect("accept");

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("WebSocket upgrade");

        DeviceLink { ws }
    }
}

/// Connects `client` to a fresh fake device.
pub(crate) async fn connected(client: Client) -> (Client, FakeDevice, DeviceLink) {
    init_tracing();

    let device = FakeDevice::bind().await;
    let options = device.options();
    let (result, link) = tokio::join!(client.connect(&options), device.accept());
    result.expect("connect");

    (client, device, link)
}

// ============================================================================
// DeviceLink
// ============================================================================

/// Device side of an established link.
pub(crate) struct DeviceLink {
    ws: WebSocketStream<TcpStream>,
}

impl DeviceLink {
    /// Receives the next command frame.
    ///
    /// # Panics
    ///
    /// Panics on timeout, close or a non-text frame.
    pub(crate) async fn recv_frame(&mut self) -> String {
        loop {
            let message = timeout(WAIT_LIMIT, self.ws.next())
                .await
                .expect("no frame from client")
                .expect("link closed")
                .expect("read frame");

            match message {
                Message::Text(text) => return text.as_str().to_owned(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected message {other:?}"),
            }
        }
    }

    /// Sends a response or event frame.
    pub(crate) async fn send_frame(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .expect("send frame");
    }

    /// Asserts the client writes nothing for a while.
    pub(crate) async fn expect_no_frame(&mut self) {
        if let Ok(message) = timeout(SILENCE, self.ws.next()).await {
            panic!("expected silence, got {message:?}");
        }
    }

    /// Closes the link from the device side.
    pub(crate) async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
