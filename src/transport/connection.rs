//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket link to the device, including command
//! dispatch and event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that exclusively owns the socket and
//! the [`Dispatcher`]:
//!
//! - Commands from the client API are enqueued; the one put in flight is
//!   written immediately
//! - Inbound frames are decoded and either settle the pending command
//!   (writing the next queued one in the same turn) or go to the
//!   [`EventRouter`]
//! - When the link closes, every outstanding command is rejected with
//!   [`Error::ConnectionClosed`] and the close hook runs

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Command, Frame, Reply, decode_frame};

use super::dispatcher::{Dispatcher, ReplySender};
use super::router::EventRouter;

// ============================================================================
// Types
// ============================================================================

/// Callback run once after the link closed and outstanding work settled.
pub type CloseHook = Box<dyn FnOnce() + Send>;

/// Receiving side of a submitted command.
pub type ReplyReceiver = oneshot::Receiver<Result<Reply>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Enqueue a command.
    Send {
        command: Command,
        reply_tx: ReplySender,
    },
    /// Close the link.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket link to a device.
///
/// All writes go through the event loop's dispatcher, so at most one command
/// is ever on the wire.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone. All operations are
/// non-blocking.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection {
    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub(crate) fn new<S>(ws_stream: S, router: Arc<EventRouter>, on_close: CloseHook) -> Self
    where
        S: Stream<Item = std::result::Result<Message, WsError>>
            + Sink<Message, Error = WsError>
            + Unpin
            + Send
            + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(ws_stream, command_rx, router, on_close));

        Self { command_tx }
    }

    /// Enqueues a command and returns the receiver that settles it.
    ///
    /// The command is queued immediately, so submission order is the order
    /// of calls to this method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has stopped.
    pub fn submit(&self, command: Command) -> Result<ReplyReceiver> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send { command, reply_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        Ok(reply_rx)
    }

    /// Enqueues a command and waits for its outcome.
    ///
    /// There is no timeout: a command the device never answers stays
    /// pending until the link closes.
    ///
    /// # Errors
    ///
    /// - [`Error::RemoteFailure`] if the device rejected the command
    /// - [`Error::ProtocolViolation`] if the response could not be decoded
    /// - [`Error::ConnectionClosed`] if the link closed first
    pub async fn send(&self, command: Command) -> Result<Reply> {
        let reply_rx = self.submit(command)?;

        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::ConnectionClosed),
        }
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Requests the link to close.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Waits until the event loop has stopped, settled everything and run
    /// the close hook.
    pub async fn closed(&self) {
        self.command_tx.closed().await;
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: S,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        router: Arc<EventRouter>,
        on_close: CloseHook,
    ) where
        S: Stream<Item = std::result::Result<Message, WsError>>
            + Sink<Message, Error = WsError>
            + Unpin
            + Send
            + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut dispatcher = Dispatcher::new();

        loop {
            let outgoing = tokio::select! {
                // Incoming frames from the device
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            debug!(text = %text.as_str(), "Websocket message");
                            Self::handle_incoming_message(&text, &mut dispatcher, &router)
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        Some(Ok(_)) => None,
                    }
                }

                // Commands from the client API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { command, reply_tx }) => {
                            dispatcher.enqueue(command, reply_tx)
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            };

            if let Some(frame) = outgoing
                && let Err(e) = ws_write.send(Message::Text(frame.into())).await
            {
                error!(error = %e, "Failed to send command");
                break;
            }
        }

        // Outstanding work first, in FIFO order. The hook runs before the
        // channel closes so `closed()` observers see its effects.
        dispatcher.on_transport_closed();
        on_close();

        Self::reject_unread_commands(&mut command_rx);
        drop(command_rx);

        debug!("Event loop terminated");
    }

    /// Routes one inbound text frame.
    ///
    /// Returns the next command frame to write, if settling the pending
    /// command put another one in flight.
    fn handle_incoming_message(
        text: &str,
        dispatcher: &mut Dispatcher,
        router: &EventRouter,
    ) -> Option<String> {
        match decode_frame(text) {
            Ok(Frame::Event(event)) => {
                router.dispatch(event);
                None
            }

            Ok(Frame::Outcome(outcome)) => dispatcher.on_outcome(outcome),

            Err(e) if e.is_event() => {
                warn!(error = %e, text = %text, "Dropping malformed event");
                None
            }

            Err(e) => dispatcher.on_protocol_violation(e.into()),
        }
    }

    /// Rejects commands still sitting in the channel.
    fn reject_unread_commands(command_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>) {
        command_rx.close();

        let mut count = 0usize;
        while let Ok(command) = command_rx.try_recv() {
            if let ConnectionCommand::Send { reply_tx, .. } = command {
                let _ = reply_tx.send(Err(Error::ConnectionClosed));
                count += 1;
            }
        }

        if count > 0 {
            trace!(count, "Rejected unread commands on close");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio_test::{assert_pending, assert_ready, task};
    use tokio_tungstenite::connect_async;

    use crate::error::Error;
    use crate::protocol::{Brightness, CommandName, Event, LogRecord};
    use crate::testing::{DeviceLink, FakeDevice, eventually, init_tracing};

    struct Harness {
        connection: Connection,
        device: DeviceLink,
        events: Arc<Mutex<Vec<Event>>>,
        closed: Arc<Mutex<bool>>,
    }

    async fn harness() -> Harness {
        init_tracing();

        let device = FakeDevice::bind().await;
        let url = device.url();
        let (client_ws, link) = tokio::join!(connect_async(url), device.accept());
        let (ws_stream, _) = client_ws.expect("client handshake");

        let events = Arc::new(Mutex::new(Vec::new()));
        let router = Arc::new(EventRouter::new());
        let sink = Arc::clone(&events);
        router.subscribe(Arc::new(move |event| sink.lock().push(event)));

        let closed = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&closed);
        let connection = Connection::new(ws_stream, router, Box::new(move || *flag.lock() = true));

        Harness {
            connection,
            device: link,
            events,
            closed,
        }
    }

    #[tokio::test]
    async fn test_get_brightness_scenario() {
        let mut h = harness().await;

        let reply_rx = h.connection.submit(Command::GetBrightness).expect("submit");
        assert_eq!(h.device.recv_frame().await, "BRIGHTNESS");
        h.device.send_frame("ACK;128;1").await;

        let reply = reply_rx.await.expect("settled").expect("success");
        assert_eq!(
            reply,
            Reply::Brightness(Brightness {
                level: 128,
                auto_control: true,
            })
        );
    }

    #[tokio::test]
    async fn test_second_command_waits_for_first_outcome() {
        let mut h = harness().await;

        let brightness = h.connection.submit(Command::GetBrightness).expect("submit");
        let slots = h.connection.submit(Command::GetSlots).expect("submit");

        assert_eq!(h.device.recv_frame().await, "BRIGHTNESS");
        h.device.expect_no_frame().await;

        h.device.send_frame("ACK;10;0").await;
        assert_eq!(h.device.recv_frame().await, "SLOTS");
        h.device.send_frame("ACK;0").await;

        assert!(brightness.await.expect("settled").is_ok());
        assert!(slots.await.expect("settled").is_ok());
    }

    #[tokio::test]
    async fn test_event_during_pending_command() {
        let mut h = harness().await;

        let reply_rx = h.connection.submit(Command::Reset).expect("submit");
        let mut reply = task::spawn(reply_rx);
        assert_eq!(h.device.recv_frame().await, "RESET");

        h.device
            .send_frame("EVT;LOG;1000;2;\"main.c\";88;\"boot\"")
            .await;
        eventually(|| !h.events.lock().is_empty()).await;

        assert_pending!(reply.poll());
        assert_eq!(
            h.events.lock().as_slice(),
            [Event::Log(LogRecord {
                timestamp_ms: 1000,
                severity_level: 2,
                source_file: "main.c".into(),
                line: 88,
                message: "boot".into(),
            })]
        );

        h.device.send_frame("ACK;").await;
        eventually(|| reply.is_woken()).await;
        let result = assert_ready!(reply.poll()).expect("settled");
        assert!(matches!(result, Ok(Reply::Empty)));
    }

    #[tokio::test]
    async fn test_event_while_idle_is_delivered() {
        let mut h = harness().await;

        h.device
            .send_frame("EVT;LOG;1000;2;\"main.c\";88;\"boot\"")
            .await;
        eventually(|| h.events.lock().len() == 1).await;
        assert!(!*h.closed.lock());
    }

    #[tokio::test]
    async fn test_remote_failure_then_next_command() {
        let mut h = harness().await;

        let reset = h.connection.submit(Command::Reset).expect("submit");
        let effect = h.connection.submit(Command::GetFadeEffect).expect("submit");

        assert_eq!(h.device.recv_frame().await, "RESET");
        h.device.send_frame("ERR;busy").await;
        assert_eq!(h.device.recv_frame().await, "EFFECT");

        let err = reset.await.expect("settled").unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteFailure {
                command: CommandName::Reset,
                ref reason,
            } if reason == "busy"
        ));

        h.device.send_frame("ACK;1").await;
        assert!(effect.await.expect("settled").is_ok());
    }

    #[tokio::test]
    async fn test_malformed_frames_do_not_break_the_link() {
        let mut h = harness().await;

        // Stray response and malformed event while idle
        h.device.send_frame("ACK;1;2").await;
        h.device.send_frame("EVT;LOG;garbage").await;
        h.device.send_frame("EVT;PING").await;
        eventually(|| h.events.lock().len() == 1).await;

        let reply_rx = h.connection.submit(Command::GetBrightness).expect("submit");
        assert_eq!(h.device.recv_frame().await, "BRIGHTNESS");
        h.device.send_frame("ACK;1").await;

        let err = reply_rx.await.expect("settled").unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation { .. }));
        assert!(!h.connection.is_closed());
    }

    #[tokio::test]
    async fn test_close_rejects_in_flight_and_queued() {
        let mut h = harness().await;

        let receivers: Vec<_> = (0..4)
            .map(|slot_id| {
                h.connection
                    .submit(Command::GetSlotDuration { slot_id })
                    .expect("submit")
            })
            .collect();

        assert_eq!(h.device.recv_frame().await, "SLOT_DURATION;0");
        h.device.close().await;

        for reply_rx in receivers {
            assert!(matches!(
                reply_rx.await.expect("settled"),
                Err(Error::ConnectionClosed)
            ));
        }

        tokio::time::timeout(Duration::from_secs(5), h.connection.closed())
            .await
            .expect("event loop stops");
        assert!(*h.closed.lock());
        assert!(matches!(
            h.connection.send(Command::GetSlots).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_runs_close_hook() {
        let h = harness().await;

        let reply_rx = h.connection.submit(Command::GetPlugins).expect("submit");
        h.connection.shutdown();
        h.connection.closed().await;

        assert!(*h.closed.lock());
        assert!(matches!(
            reply_rx.await.expect("settled"),
            Err(Error::ConnectionClosed)
        ));
    }
}
