//! Command queue and dispatcher.
//!
//! Owns the FIFO of queued commands and the single in-flight command slot.
//!
//! ```text
//!            enqueue (idle)
//!   ┌──────┐ ─────────────────► ┌──────┐
//!   │ Idle │                    │ Busy │ ── outcome ──► settle, dispatch next
//!   └──────┘ ◄───────────────── └──────┘
//!            outcome, queue empty / transport closed
//! ```
//!
//! The dispatcher performs no I/O. Every transition that puts a command on
//! the wire returns the encoded frame, which the connection event loop writes
//! before handling anything else.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::codec::UNKNOWN_REASON;
use crate::protocol::{Command, CommandName, Outcome, Reply, decode_reply};

// ============================================================================
// Types
// ============================================================================

/// Single-resolution channel that settles one command.
pub type ReplySender = oneshot::Sender<Result<Reply>>;

/// A command together with the channel that settles it.
///
/// Held in the queue while another command is in flight, then moved into
/// the in-flight slot when dispatched.
#[derive(Debug)]
pub struct QueuedCommand {
    /// The command.
    pub command: Command,
    /// Settles the caller's result.
    pub reply_tx: ReplySender,
}

impl QueuedCommand {
    /// Creates a queued command.
    #[inline]
    #[must_use]
    pub fn new(command: Command, reply_tx: ReplySender) -> Self {
        Self { command, reply_tx }
    }

    /// Settles the caller's result. A caller that stopped waiting is ignored.
    fn settle(self, result: Result<Reply>) {
        let name = self.command.name();
        if self.reply_tx.send(result).is_err() {
            trace!(command = %name, "Caller dropped before result");
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// FIFO command queue with at most one command in flight.
#[derive(Debug, Default)]
pub struct Dispatcher {
    /// Commands waiting for the in-flight one to finish.
    queue: VecDeque<QueuedCommand>,
    /// The in-flight command.
    pending: Option<QueuedCommand>,
}

impl Dispatcher {
    /// Creates an idle dispatcher.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a command is in flight.
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the number of commands waiting behind the in-flight one.
    #[inline]
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns the name of the in-flight command.
    #[inline]
    #[must_use]
    pub fn pending_name(&self) -> Option<CommandName> {
        self.pending.as_ref().map(|pending| pending.command.name())
    }

    /// Appends a command.
    ///
    /// Returns the frame to write if the dispatcher was idle and the command
    /// went straight into flight.
    pub fn enqueue(&mut self, command: Command, reply_tx: ReplySender) -> Option<String> {
        self.queue.push_back(QueuedCommand::new(command, reply_tx));

        if self.is_busy() {
            debug!(queued = self.queue.len(), "Command queued behind pending");
            None
        } else {
            self.dispatch_next()
        }
    }

    /// Settles the in-flight command with a decoded outcome.
    ///
    /// Returns the frame of the next queued command, if any.
    pub fn on_outcome(&mut self, outcome: Outcome) -> Option<String> {
        let Some(pending) = self.pending.take() else {
            warn!(?outcome, "Protocol violation: response without pending command");
            return None;
        };

        let name = pending.command.name();
        let result = match outcome {
            Outcome::Success(fields) => decode_reply(name, &fields).map_err(|e| {
                warn!(command = %name, error = %e, "Malformed response");
                Error::from(e)
            }),
            Outcome::Failure { tag, reason } => {
                let reason = reason.unwrap_or_else(|| UNKNOWN_REASON.to_string());
                warn!(command = %name, %tag, %reason, "Command failed");
                Err(Error::remote_failure(name, reason))
            }
        };

        pending.settle(result);
        self.dispatch_next()
    }

    /// Settles the in-flight command with a protocol violation.
    ///
    /// Used for command-class frames that could not be decoded at all.
    /// Returns the frame of the next queued command, if any.
    pub fn on_protocol_violation(&mut self, error: Error) -> Option<String> {
        let Some(pending) = self.pending.take() else {
            warn!(error = %error, "Protocol violation without pending command");
            return None;
        };

        warn!(command = %pending.command.name(), error = %error, "Protocol violation");
        pending.settle(Err(error));
        self.dispatch_next()
    }

    /// Rejects the in-flight command and every queued one, in FIFO order,
    /// with [`Error::ConnectionClosed`].
    ///
    /// Returns the number of settled commands. The dispatcher is idle and
    /// empty afterwards.
    pub fn on_transport_closed(&mut self) -> usize {
        let settled: Vec<_> = self.pending.take().into_iter().chain(self.queue.drain(..)).collect();
        let count = settled.len();

        for command in settled {
            command.settle(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Rejected outstanding commands on close");
        }

        count
    }

    /// Moves the queue head into flight and returns its frame.
    fn dispatch_next(&mut self) -> Option<String> {
        let next = self.queue.pop_front()?;
        let frame = next.command.encode();

        info!(frame = %frame, "Websocket command");
        self.pending = Some(next);

        Some(frame)
    }
}

// ============================================================================
// Tests
// ============================================================================
