//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use pixelix_client::{Client, ConnectOptions};
//!
//! # async fn example() -> pixelix_client::Result<()> {
//! let client = Client::builder()
//!     .connect_timeout(Duration::from_secs(5))
//!     .on_event(|event| println!("{event:?}"))
//!     .on_closed(|| println!("link closed"))
//!     .build();
//!
//! client.connect(&ConnectOptions::new("pixelix.local")).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::protocol::Event;
use crate::transport::EventHandler;

use super::core::Client;

// ============================================================================
// Types
// ============================================================================

/// Callback run every time a link of the client closes.
pub type ClosedHandler = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Default)]
pub struct ClientBuilder {
    /// Upper bound for link establishment.
    connect_timeout: Option<Duration>,
    /// Initial event subscriber.
    event_handler: Option<EventHandler>,
    /// Close hook.
    on_closed: Option<ClosedHandler>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("connect_timeout", &self.connect_timeout)
            .field("event_handler", &self.event_handler.is_some())
            .field("on_closed", &self.on_closed.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds how long [`Client::connect`] may take.
    ///
    /// Without this, connecting waits as long as the OS does.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the initial event subscriber.
    ///
    /// Equivalent to calling [`Client::subscribe`] after building.
    #[inline]
    #[must_use]
    pub fn on_event(mut self, handler: impl Fn(Event) + Send + Sync + 'static) -> Self {
        self.event_handler = Some(Arc::new(handler));
        self
    }

    /// Sets the hook run after a link closed and its outstanding commands
    /// were rejected.
    #[inline]
    #[must_use]
    pub fn on_closed(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_closed = Some(Arc::new(hook));
        self
    }

    /// Builds the client in `Disconnected` state.
    #[must_use]
    pub fn build(self) -> Client {
        Client::from_parts(self.connect_timeout, self.event_handler, self.on_closed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::ConnectionState;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ClientBuilder::new();
        assert!(builder.connect_timeout.is_none());
        assert!(builder.event_handler.is_none());
        assert!(builder.on_closed.is_none());
    }

    #[test]
    fn test_connect_timeout_sets_value() {
        let builder = ClientBuilder::new().connect_timeout(Duration::from_millis(250));
        assert_eq!(builder.connect_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_on_event_subscribes_built_client() {
        let client = ClientBuilder::new().on_event(|_| {}).build();
        assert!(client.is_subscribed());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let builder = ClientBuilder::new().on_closed(|| {});
        let text = format!("{builder:?}");
        assert!(text.contains("on_closed: true"));
        assert!(text.contains("event_handler: false"));
    }
}
