//! WebSocket protocol message types.
//!
//! This module defines the text frames exchanged between the client and a
//! Pixelix device.
//!
//! # Protocol Overview
//!
//! Every frame is a list of tokens separated by `;`:
//!
//! | Frame | Direction | Layout |
//! |-------|-----------|--------|
//! | Command | Client → Device | `NAME` or `NAME;p1;p2;...` |
//! | Success | Device → Client | `ACK;f1;f2;...` |
//! | Failure | Device → Client | `<tag>;reason?` (device sends `NACK`) |
//! | Event | Device → Client | `EVT;KIND;f1;f2;...` |
//!
//! Success frames carry no type information of their own. Their fields are
//! interpreted according to the name of the command that is currently
//! pending, see [`reply::decode_reply`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Inbound frame splitting and field parsing |
//! | `command` | Command definitions and encoding |
//! | `event` | Event types and event decoder table |
//! | `reply` | Typed replies and per-command decoder table |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound frame decoding.
pub mod codec;

/// Command definitions and wire encoding.
pub mod command;

/// Asynchronous event types.
pub mod event;

/// Typed command replies.
pub mod reply;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{ACK_TAG, DELIMITER, DecodeError, EVT_TAG, Frame, Outcome, decode_frame};
pub use command::{Command, CommandName, FadeEffect, IperfOptions, IperfProtocol, Param};
pub use event::{Event, LogLevel, LogRecord};
pub use reply::{
    Brightness, DisplayContent, Installation, IperfStatus, LogStreaming, PluginAlias,
    PluginList, Reply, SlotDuration, SlotInfo, SlotTable, decode_reply,
};
