//! Pixelix client - WebSocket protocol engine for Pixelix LED matrix devices.
//!
//! This library drives the device's `/ws` endpoint: a single persistent
//! WebSocket link carrying semicolon-framed text messages.
//!
//! # Architecture
//!
//! Two message classes share one link:
//!
//! - **Commands**: client-initiated, answered by `ACK;...` or a failure tag
//! - **Events**: pushed by the device as `EVT;KIND;...` at any time
//!
//! Key design principles:
//!
//! - At most one command on the wire; the rest wait in FIFO order
//! - Replies are decoded by the pending command's name, events by their kind
//! - One event loop task per link owns the socket and the command queue
//! - A closed link rejects every outstanding command, nothing hangs
//!
//! # Quick Start
//!
//! ```no_run
//! use pixelix_client::{Client, ConnectOptions, Event, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .on_event(|event| {
//!             if let Event::Log(record) = event {
//!                 println!("{record}");
//!             }
//!         })
//!         .build();
//!
//!     client.connect(&ConnectOptions::new("pixelix.local")).await?;
//!
//!     let table = client.get_slots().await?;
//!     for (slot_id, slot) in table.slots.iter().enumerate() {
//!         println!("{slot_id}: {}", slot.name);
//!     }
//!
//!     client.set_log_streaming(true).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Typed device operations: [`Client`], [`ConnectOptions`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Wire codec, commands, replies and events |
//! | [`transport`] | WebSocket link, dispatcher and event router |

// ============================================================================
// Modules
// ============================================================================

/// Typed client facade.
///
/// Use [`Client::builder()`] to configure callbacks and timeouts.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Wire protocol.
///
/// Command encoding plus context-dependent decoding of replies and events.
pub mod protocol;

/// WebSocket transport layer.
///
/// Event loop, command queue and event delivery.
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ConnectOptions, ConnectionState};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{
    Brightness, Command, CommandName, DisplayContent, Event, FadeEffect, Installation,
    IperfOptions, IperfProtocol, LogLevel, LogRecord, SlotInfo, SlotTable,
};
