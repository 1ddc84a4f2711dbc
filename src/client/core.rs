//! Core Client struct and link lifecycle.
//!
//! A [`Client`] owns at most one link at a time. Typed device operations
//! live in the sibling modules and all funnel through
//! [`Client::execute`], which checks the link state before anything is
//! queued.
//!
//! # States
//!
//! ```text
//! Disconnected ──connect──► Connecting ──upgrade ok──► Connected
//!      ▲                        │                          │
//!      └────────failure─────────┘                          │
//!      └──────────────close / disconnect───────────────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::reply::FromReply;
use crate::protocol::{Command, Event};
use crate::transport::{CloseHook, Connection, EventHandler, EventRouter, connector};

use super::builder::{ClientBuilder, ClosedHandler};
use super::options::ConnectOptions;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the client's link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionState {
    /// No link.
    #[default]
    Disconnected,
    /// WebSocket upgrade in progress.
    Connecting,
    /// Link established; commands are accepted.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

// ============================================================================
// Types
// ============================================================================

/// Current link and its generation.
#[derive(Debug, Default)]
struct Link {
    /// Lifecycle state.
    state: ConnectionState,
    /// Live connection, present only while `Connected`.
    connection: Option<Connection>,
    /// Incremented by every connect attempt; stale close hooks compare
    /// against it.
    epoch: u64,
}

/// Internal shared state for a client.
pub(crate) struct ClientInner {
    /// Upper bound for link establishment.
    connect_timeout: Option<Duration>,
    /// Event subscriber slot, shared with every link's event loop.
    router: Arc<EventRouter>,
    /// User close hook.
    on_closed: Option<ClosedHandler>,
    /// Link state.
    link: Mutex<Link>,
}

impl ClientInner {
    /// Called from the event loop once a link closed.
    fn on_link_closed(&self, epoch: u64) {
        {
            let mut link = self.link.lock();
            if link.epoch != epoch {
                debug!(epoch, current = link.epoch, "Ignoring close of stale link");
                return;
            }
            link.state = ConnectionState::Disconnected;
            link.connection = None;
        }

        info!(epoch, "Disconnected from device");

        if let Some(hook) = &self.on_closed {
            hook();
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// A client for one Pixelix device.
///
/// Cheap to clone; clones share the link, the command queue and the event
/// subscriber.
///
/// # Example
///
/// ```no_run
/// use pixelix_client::{Client, ConnectOptions};
///
/// # async fn example() -> pixelix_client::Result<()> {
/// let client = Client::new();
/// client.connect(&ConnectOptions::new("pixelix.local")).await?;
///
/// let brightness = client.get_brightness().await?;
/// println!("brightness {}", brightness.level);
///
/// client.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state())
            .field("subscribed", &self.is_subscribed())
            .finish_non_exhaustive()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Creates a disconnected client without timeout or callbacks.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Assembles a client from builder parts.
    pub(crate) fn from_parts(
        connect_timeout: Option<Duration>,
        event_handler: Option<EventHandler>,
        on_closed: Option<ClosedHandler>,
    ) -> Self {
        let router = Arc::new(EventRouter::new());
        if let Some(handler) = event_handler {
            router.subscribe(handler);
        }

        Self {
            inner: Arc::new(ClientInner {
                connect_timeout,
                router,
                on_closed,
                link: Mutex::new(Link::default()),
            }),
        }
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Establishes the link to the device.
    ///
    /// Completes once the WebSocket upgrade finished. The event subscriber
    /// is kept across reconnects.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTarget`] if `options` do not form a `ws://` URL
    /// - [`Error::Connection`] if already connected or connecting, or if
    ///   the link could not be established
    /// - [`Error::ConnectionTimeout`] if the configured timeout elapsed
    /// - [`Error::ConnectionClosed`] if the link closed before connect
    ///   returned
    pub async fn connect(&self, options: &ConnectOptions) -> Result<()> {
        let url = options.to_url()?;

        let epoch = {
            let mut link = self.inner.link.lock();
            if link.state != ConnectionState::Disconnected {
                return Err(Error::connection(format!("client is already {}", link.state)));
            }
            link.state = ConnectionState::Connecting;
            link.epoch += 1;
            link.epoch
        };

        // Resets `Connecting` if this future fails or is dropped.
        let mut attempt = ConnectAttempt {
            inner: &self.inner,
            epoch,
            done: false,
        };

        let ws_stream = connector::connect(&url, self.inner.connect_timeout).await?;

        let connection = Connection::new(
            ws_stream,
            Arc::clone(&self.inner.router),
            Self::close_hook(Arc::downgrade(&self.inner), epoch),
        );

        let mut link = self.inner.link.lock();
        if link.epoch != epoch || link.state != ConnectionState::Connecting {
            // The link already closed and its hook ran.
            attempt.done = true;
            connection.shutdown();
            return Err(Error::ConnectionClosed);
        }

        link.state = ConnectionState::Connected;
        link.connection = Some(connection);
        attempt.done = true;

        info!(url = %url, epoch, "Connected to device");
        Ok(())
    }

    /// Closes the link.
    ///
    /// Resolves after every outstanding command was rejected with
    /// [`Error::ConnectionClosed`] and the close hook ran.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if there is no link.
    pub async fn disconnect(&self) -> Result<()> {
        let connection = self
            .inner
            .link
            .lock()
            .connection
            .clone()
            .ok_or(Error::NotConnected)?;

        debug!("Disconnecting");

        connection.shutdown();
        connection.closed().await;

        Ok(())
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.link.lock().state
    }

    /// Returns `true` while commands are accepted.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    fn close_hook(inner: Weak<ClientInner>, epoch: u64) -> CloseHook {
        Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.on_link_closed(epoch);
            }
        })
    }
}

// ============================================================================
// Client - Events
// ============================================================================

impl Client {
    /// Sets the event subscriber, replacing any previous one.
    ///
    /// The handler runs on the connection's event loop in arrival order and
    /// must not block. It may call `subscribe` or `unsubscribe` itself.
    pub fn subscribe(&self, handler: impl Fn(Event) + Send + Sync + 'static) {
        self.inner.router.subscribe(Arc::new(handler));
    }

    /// Removes the event subscriber. Later events are dropped.
    pub fn unsubscribe(&self) {
        self.inner.router.unsubscribe();
    }

    /// Returns `true` if an event subscriber is set.
    #[inline]
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner.router.is_subscribed()
    }
}

// ============================================================================
// Client - Internal
// ============================================================================

impl Client {
    /// Enqueues a command and converts its reply.
    ///
    /// The command is queued when the returned future is first polled.
    pub(crate) async fn execute<T: FromReply>(&self, command: Command) -> Result<T> {
        let connection = self.connection()?;
        let reply = connection.send(command).await?;
        T::from_reply(reply)
    }

    /// Returns the live connection or [`Error::NotConnected`].
    fn connection(&self) -> Result<Connection> {
        let link = self.inner.link.lock();
        match (&link.state, &link.connection) {
            (ConnectionState::Connected, Some(connection)) => Ok(connection.clone()),
            _ => Err(Error::NotConnected),
        }
    }
}

// ============================================================================
// ConnectAttempt
// ============================================================================

/// Rolls `Connecting` back to `Disconnected` unless marked done.
struct ConnectAttempt<'a> {
    inner: &'a ClientInner,
    epoch: u64,
    done: bool,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut link = self.inner.link.lock();
        if link.epoch == self.epoch && link.state == ConnectionState::Connecting {
            link.state = ConnectionState::Disconnected;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
