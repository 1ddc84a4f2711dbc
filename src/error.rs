//! Error types for the Pixelix client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use pixelix_client::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let brightness = client.get_brightness().await?;
//!     client.set_brightness(brightness.level / 2, None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Caller | [`Error::InvalidArgument`], [`Error::InvalidTarget`], [`Error::NotConnected`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::ProtocolViolation`], [`Error::RemoteFailure`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::protocol::{CommandName, DecodeError};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// Invalid argument passed to an operation.
    ///
    /// Detected before anything is queued or written to the wire.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Malformed connection target.
    ///
    /// Returned when protocol, hostname, port or endpoint cannot form a
    /// usable WebSocket URL.
    #[error("Invalid target: {message}")]
    InvalidTarget {
        /// Description of the problem with the target.
        message: String,
    },

    /// Operation attempted while the client is not connected.
    #[error("Not connected")]
    NotConnected,

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the link cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt exceeded the configured timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The link closed while the command was in flight or queued.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound frame does not match the shape expected for the pending
    /// command.
    #[error("Protocol violation: {message}")]
    ProtocolViolation {
        /// Description of the violation.
        message: String,
    },

    /// The device answered the command with a failure status.
    #[error("{command}: {reason}")]
    RemoteFailure {
        /// Command that failed.
        command: CommandName,
        /// Reason text reported by the device.
        reason: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid target error.
    #[inline]
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol violation error.
    #[inline]
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Creates a remote failure error.
    #[inline]
    pub fn remote_failure(command: CommandName, reason: impl Into<String>) -> Self {
        Self::RemoteFailure {
            command,
            reason: reason.into(),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Self::protocol_violation(err.to_string())
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NotConnected
        )
    }

    /// Returns `true` if the device rejected the command.
    #[inline]
    #[must_use]
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteFailure { .. })
    }

    /// Returns the device's reason text for a [`Error::RemoteFailure`].
    #[inline]
    #[must_use]
    pub fn remote_reason(&self) -> Option<&str> {
        match self {
            Self::RemoteFailure { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Returns `true` if the error was raised before any wire activity.
    ///
    /// Such errors leave the command queue untouched.
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::InvalidTarget { .. } | Self::NotConnected
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
