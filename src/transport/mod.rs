//! WebSocket transport layer.
//!
//! This module handles communication between the client (Rust) and the
//! device via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Client (Rust)  │                              │  Device         │
//! │                 │         WebSocket            │                 │
//! │  Connection     │◄────────────────────────────►│  /ws endpoint   │
//! │  → Dispatcher   │     ws://host:port/ws        │                 │
//! │  → EventRouter  │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `connector::connect` - TCP connect and WebSocket upgrade
//! 2. `Connection::new` - Spawn the event loop
//! 3. `Connection::send` - Enqueue commands, at most one in flight
//! 4. `Connection::shutdown` - Close the link, rejecting outstanding work
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `connector` | Outbound connect with optional timeout |
//! | `dispatcher` | Command queue and response correlation |
//! | `router` | Single-subscriber event delivery |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Outbound WebSocket connect.
pub mod connector;

/// Command queue and response correlation.
pub mod dispatcher;

/// Event delivery.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{CloseHook, Connection, ReplyReceiver};
pub use connector::{DeviceStream, connect};
pub use dispatcher::{Dispatcher, QueuedCommand, ReplySender};
pub use router::{EventHandler, EventRouter};
